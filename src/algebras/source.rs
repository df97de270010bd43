//! Read access to the content source.
//!
//! This module defines the [`LibrarySource`] capability: one page of the
//! library listing, or one page of a book's notebook. Retries, pacing and
//! parsing of the notebook HTML live above this trait.

use crate::model::{CatalogItem, ScrapeCursor};
use crate::types::ExternalId;
use async_trait::async_trait;

use super::error::FetchError;

/// One page of the library listing, already mapped to catalog items.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryPage {
    pub items: Vec<CatalogItem>,
    /// Token for the next page; `None` on the last page.
    pub pagination_token: Option<String>,
}

/// Content retrieval capability for the reading service.
///
/// # Laws
///
/// - **L1 (Single attempt)**: each call issues at most one request. A call
///   never retries on its own; the enumerator and scraper own retry policy.
/// - **L2 (Classified failures)**: a 429 surfaces as
///   [`FetchError::RateLimited`]; every other failure is transient and
///   never [`FetchError::Permanent`].
/// - **L3 (Opaque cursor)**: the cursor's markers are forwarded unchanged.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `Arc<dyn LibrarySource>`.
#[async_trait]
pub trait LibrarySource: Send + Sync {
    /// Fetches one listing page; `None` asks for the first one.
    async fn fetch_library_page(&self, token: Option<&str>) -> Result<LibraryPage, FetchError>;

    /// Fetches one notebook page for a book as raw HTML.
    async fn fetch_notebook_page(
        &self,
        id: &ExternalId,
        cursor: &ScrapeCursor,
    ) -> Result<String, FetchError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// Scripted in-memory source.
    ///
    /// Listing pages are keyed by the token that requests them (`""` for the
    /// first page). Notebook answers are queued per book and replayed in
    /// order; every request is recorded.
    #[derive(Clone, Default)]
    pub struct MockLibrarySource {
        listing: Arc<RwLock<HashMap<String, VecDeque<Result<LibraryPage, FetchError>>>>>,
        notebooks: Arc<RwLock<HashMap<String, VecDeque<Result<String, FetchError>>>>>,
        requests: Arc<RwLock<Vec<String>>>,
    }

    impl MockLibrarySource {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn push_listing(&self, token: &str, page: Result<LibraryPage, FetchError>) {
            self.listing
                .write()
                .await
                .entry(token.to_string())
                .or_default()
                .push_back(page);
        }

        pub async fn push_notebook(&self, id: &str, page: Result<String, FetchError>) {
            self.notebooks
                .write()
                .await
                .entry(id.to_string())
                .or_default()
                .push_back(page);
        }

        pub async fn requests(&self) -> Vec<String> {
            self.requests.read().await.clone()
        }
    }

    #[async_trait]
    impl LibrarySource for MockLibrarySource {
        async fn fetch_library_page(
            &self,
            token: Option<&str>,
        ) -> Result<LibraryPage, FetchError> {
            let key = token.unwrap_or("").to_string();
            self.requests.write().await.push(format!("listing:{}", key));
            self.listing
                .write()
                .await
                .get_mut(&key)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(FetchError::Status {
                        status: 404,
                        url: format!("listing:{}", key),
                    })
                })
        }

        async fn fetch_notebook_page(
            &self,
            id: &ExternalId,
            cursor: &ScrapeCursor,
        ) -> Result<String, FetchError> {
            self.requests.write().await.push(format!(
                "notebook:{}:{}",
                id,
                cursor.continuation_token.as_deref().unwrap_or("")
            ));
            self.notebooks
                .write()
                .await
                .get_mut(id.as_str())
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| {
                    Err(FetchError::Status {
                        status: 404,
                        url: format!("notebook:{}", id),
                    })
                })
        }
    }

    #[tokio::test]
    async fn law_l3_cursor_is_forwarded_unchanged() {
        let source = MockLibrarySource::new();
        source.push_notebook("B1", Ok("<html/>".to_string())).await;
        let cursor = ScrapeCursor {
            continuation_token: Some("tok-7".to_string()),
            content_limit_state: Some("state".to_string()),
        };

        let page = source
            .fetch_notebook_page(&ExternalId::parse("B1").unwrap(), &cursor)
            .await
            .unwrap();
        assert_eq!(page, "<html/>");
        assert_eq!(source.requests().await, vec!["notebook:B1:tok-7"]);
    }

    #[tokio::test]
    async fn unscripted_requests_fail_transiently() {
        let source = MockLibrarySource::new();
        let err = source.fetch_library_page(Some("nope")).await.unwrap_err();
        assert!(err.is_transient());
    }
}
