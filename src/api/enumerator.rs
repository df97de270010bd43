// src/api/enumerator.rs
//! Walks the whole library listing.

use super::simple_pagination::fetch_all_pages_simple;
use crate::algebras::{FetchError, LibrarySource};
use crate::constants::LIBRARY_MAX_RETRIES;
use crate::error_recovery::{retry_with_backoff, BackoffPolicy};
use crate::model::{Catalog, CatalogItem};
use std::sync::Arc;

/// Fetches every listing page and maps the entries to catalog items.
///
/// A failing page is re-requested immediately, up to `max_retries` times;
/// each page starts with a fresh budget. Running out of retries abandons
/// the whole enumeration with no partial result.
pub struct LibraryEnumerator {
    source: Arc<dyn LibrarySource>,
    max_retries: u32,
    backoff: BackoffPolicy,
}

impl LibraryEnumerator {
    pub fn new(source: Arc<dyn LibrarySource>) -> Self {
        Self {
            source,
            max_retries: LIBRARY_MAX_RETRIES,
            backoff: BackoffPolicy::immediate(),
        }
    }

    /// All books in listing order. Repeated ids collapse into one entry
    /// carrying the latest listing's fields.
    pub async fn enumerate(&self) -> Result<Vec<CatalogItem>, FetchError> {
        let result = fetch_all_pages_simple(
            |token| async move {
                let page = retry_with_backoff(
                    || self.source.fetch_library_page(token.as_deref()),
                    self.max_retries,
                    &self.backoff,
                )
                .await?;
                Ok((page.items, page.pagination_token))
            },
            None,
        )
        .await
        .inspect_err(|e| log::error!("Library enumeration failed: {}", e))?;

        let fetched = result.items.len();
        let items: Vec<CatalogItem> = Catalog::from(result.items).into();
        log::info!(
            "Enumerated {} books across {} listing pages ({} duplicates collapsed)",
            items.len(),
            result.pages_fetched,
            fetched - items.len()
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebras::source::tests::MockLibrarySource;
    use crate::algebras::LibraryPage;
    use crate::types::ExternalId;
    use pretty_assertions::assert_eq;

    fn item(id: &str, title: &str, author: &str) -> CatalogItem {
        CatalogItem::from_listing(ExternalId::parse(id).unwrap(), Some(title), Some(author), None)
    }

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            url: "listing".to_string(),
        }
    }

    #[tokio::test]
    async fn walks_all_pages_in_order() {
        let source = MockLibrarySource::new();
        source
            .push_listing(
                "",
                Ok(LibraryPage {
                    items: vec![item("B1", "Dune: Part One", "Herbert, Frank")],
                    pagination_token: Some("p2".to_string()),
                }),
            )
            .await;
        source
            .push_listing(
                "p2",
                Ok(LibraryPage {
                    items: vec![item("B2", "1984", "Orwell, George")],
                    pagination_token: None,
                }),
            )
            .await;

        let items = LibraryEnumerator::new(Arc::new(source.clone()))
            .enumerate()
            .await
            .unwrap();

        let titles: Vec<_> = items
            .iter()
            .map(|i| (i.title.as_str(), i.subtitle.as_str(), i.author.as_str()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("Dune", "Part One", "Frank Herbert"),
                ("1984", "", "George Orwell")
            ]
        );
        assert_eq!(source.requests().await, vec!["listing:", "listing:p2"]);
    }

    #[tokio::test]
    async fn retries_each_page_with_a_fresh_budget() {
        let source = MockLibrarySource::new();
        for _ in 0..3 {
            source.push_listing("", Err(status(500))).await;
        }
        source
            .push_listing(
                "",
                Ok(LibraryPage {
                    items: vec![item("B1", "One", "a")],
                    pagination_token: Some("p2".to_string()),
                }),
            )
            .await;
        for _ in 0..3 {
            source.push_listing("p2", Err(status(502))).await;
        }
        source
            .push_listing(
                "p2",
                Ok(LibraryPage {
                    items: vec![item("B2", "Two", "b")],
                    pagination_token: None,
                }),
            )
            .await;

        let items = LibraryEnumerator::new(Arc::new(source))
            .enumerate()
            .await
            .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_three_retries_without_partial_result() {
        let source = MockLibrarySource::new();
        source
            .push_listing(
                "",
                Ok(LibraryPage {
                    items: vec![item("B1", "One", "a")],
                    pagination_token: Some("p2".to_string()),
                }),
            )
            .await;
        for _ in 0..4 {
            source.push_listing("p2", Err(status(503))).await;
        }

        let err = LibraryEnumerator::new(Arc::new(source.clone()))
            .enumerate()
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Permanent { attempts: 4, .. }));
        assert_eq!(source.requests().await.len(), 5);
    }

    #[tokio::test]
    async fn duplicate_ids_across_pages_collapse() {
        let source = MockLibrarySource::new();
        source
            .push_listing(
                "",
                Ok(LibraryPage {
                    items: vec![item("B1", "Old", "a"), item("B2", "Two", "b")],
                    pagination_token: Some("p2".to_string()),
                }),
            )
            .await;
        source
            .push_listing(
                "p2",
                Ok(LibraryPage {
                    items: vec![item("B1", "New", "a")],
                    pagination_token: None,
                }),
            )
            .await;

        let items = LibraryEnumerator::new(Arc::new(source))
            .enumerate()
            .await
            .unwrap();
        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["New", "Two"]);
    }
}
