// src/api/simple_pagination.rs
//! Token-driven pagination without BoxFuture.

use crate::algebras::FetchError;

/// Everything collected across pages.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
}

/// Fetches pages until the source stops handing out a next token.
///
/// `fetch_fn` receives the token for the page to fetch (`None` for the
/// first) and returns that page's items plus the next token. Any error
/// aborts the whole walk; nothing partial is returned.
pub async fn fetch_all_pages_simple<T, F, Fut>(
    mut fetch_fn: F,
    max_pages: Option<u32>,
) -> Result<PaginationResult<T>, FetchError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<(Vec<T>, Option<String>), FetchError>>,
{
    let mut all_items = Vec::new();
    let mut token = None;
    let mut pages_fetched = 0u32;

    loop {
        if let Some(max) = max_pages {
            if pages_fetched >= max {
                log::debug!("Reached maximum page limit: {}", max);
                break;
            }
        }

        let (items, next) = fetch_fn(token).await?;
        all_items.extend(items);
        pages_fetched += 1;

        match next {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }

    Ok(PaginationResult {
        items: all_items,
        pages_fetched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn follows_tokens_until_exhausted() {
        let result = fetch_all_pages_simple(
            |token: Option<String>| async move {
                Ok(match token.as_deref() {
                    None => (vec![1, 2], Some("a".to_string())),
                    Some("a") => (vec![3], Some("b".to_string())),
                    _ => (vec![4], None),
                })
            },
            None,
        )
        .await
        .unwrap();
        assert_eq!(result.items, vec![1, 2, 3, 4]);
        assert_eq!(result.pages_fetched, 3);
    }

    #[tokio::test]
    async fn stops_at_page_limit() {
        let result = fetch_all_pages_simple(
            |_token| async { Ok((vec!["x"], Some("again".to_string()))) },
            Some(2),
        )
        .await
        .unwrap();
        assert_eq!(result.items.len(), 2);
    }

    #[tokio::test]
    async fn errors_discard_collected_items() {
        let result: Result<PaginationResult<u8>, _> = fetch_all_pages_simple(
            |token: Option<String>| async move {
                match token {
                    None => Ok((vec![1], Some("next".to_string()))),
                    Some(_) => Err(FetchError::exhausted(
                        4,
                        FetchError::Transport {
                            message: "down".to_string(),
                        },
                    )),
                }
            },
            None,
        )
        .await;
        assert!(matches!(result, Err(FetchError::Permanent { attempts: 4, .. })));
    }
}
