// src/api/detail_scraper.rs
//! Reads every notebook page of one book.
//!
//! The scrape is an explicit loop over a mutable cursor:
//!
//! ```text
//! Requesting ──429──────────────▶ RateLimited ──wait──▶ Requesting (same page)
//!     │
//!     ├──timeout / transport / 5xx──▶ NetworkError ──wait──▶ Requesting (same page)
//!     │                                   └──budget spent──▶ Failed
//!     └──200──▶ ParsedPage ──token──▶ Requesting (next page, budget reset)
//!                   └──no token──▶ Complete
//! ```
//!
//! Rate-limit waits never consume the page's retry budget. A caller that
//! wants a ceiling on consecutive 429s sets
//! [`ScrapePolicy::max_rate_limit_waits`]; past it, further 429s are charged
//! like any other failure.

use super::extractor::extract;
use crate::algebras::{FetchError, LibrarySource};
use crate::constants::{
    NOTEBOOK_MAX_PAGES, NOTEBOOK_MAX_RETRIES, NOTEBOOK_REQUEST_TIMEOUT,
};
use crate::error_recovery::BackoffPolicy;
use crate::model::{Annotation, CatalogItem, ScrapeCursor};
use std::sync::Arc;
use std::time::Duration;

/// Tunables of a notebook scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapePolicy {
    pub max_retries: u32,
    pub request_timeout: Duration,
    pub max_pages: u32,
    /// Consecutive 429s tolerated on one page. `None` waits indefinitely.
    pub max_rate_limit_waits: Option<u32>,
    pub backoff: BackoffPolicy,
}

impl Default for ScrapePolicy {
    fn default() -> Self {
        Self {
            max_retries: NOTEBOOK_MAX_RETRIES,
            request_timeout: NOTEBOOK_REQUEST_TIMEOUT,
            max_pages: NOTEBOOK_MAX_PAGES,
            max_rate_limit_waits: None,
            backoff: BackoffPolicy::standard(),
        }
    }
}

/// How a scrape ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ScrapeOutcome {
    /// The source ran out of pages.
    Complete,
    /// The retry budget of one page was spent.
    Failed(FetchError),
    /// The page ceiling was reached while the source still offered more.
    Truncated { pages: u32 },
}

/// Counters for one book.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrapeStats {
    pub pages_fetched: u32,
    pub rate_limit_waits: u32,
    pub retries: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeResult {
    /// Every annotation read, in page order. Always empty for a failed scrape.
    pub annotations: Vec<Annotation>,
    pub outcome: ScrapeOutcome,
    pub stats: ScrapeStats,
}

pub struct DetailScraper {
    source: Arc<dyn LibrarySource>,
    policy: ScrapePolicy,
}

impl DetailScraper {
    pub fn new(source: Arc<dyn LibrarySource>, policy: ScrapePolicy) -> Self {
        Self { source, policy }
    }

    pub async fn scrape(&self, item: &CatalogItem) -> ScrapeResult {
        let id = &item.external_id;
        let mut cursor = ScrapeCursor::start();
        let mut annotations = Vec::new();
        let mut stats = ScrapeStats::default();
        let mut retries = 0u32;
        let mut rate_limit_waits = 0u32;

        loop {
            if stats.pages_fetched >= self.policy.max_pages {
                log::warn!(
                    "Stopping '{}' after {} notebook pages",
                    item.title,
                    stats.pages_fetched
                );
                return ScrapeResult {
                    annotations,
                    outcome: ScrapeOutcome::Truncated {
                        pages: stats.pages_fetched,
                    },
                    stats,
                };
            }

            let attempt = tokio::time::timeout(
                self.policy.request_timeout,
                self.source.fetch_notebook_page(id, &cursor),
            )
            .await
            .unwrap_or_else(|_| {
                Err(FetchError::Timeout {
                    operation: format!("notebook page {} of {}", stats.pages_fetched + 1, id),
                })
            });

            match attempt {
                Ok(html) => {
                    let page = extract(&html);
                    stats.pages_fetched += 1;
                    log::debug!(
                        "'{}' page {}: {} annotations",
                        item.title,
                        stats.pages_fetched,
                        page.annotations.len()
                    );
                    annotations.extend(page.annotations);
                    cursor.advance(page.continuation_token, page.content_limit_state);
                    retries = 0;
                    rate_limit_waits = 0;

                    if !cursor.has_more() {
                        log::info!(
                            "Scraped {} annotations for '{}' ({} pages)",
                            annotations.len(),
                            item.title,
                            stats.pages_fetched
                        );
                        return ScrapeResult {
                            annotations,
                            outcome: ScrapeOutcome::Complete,
                            stats,
                        };
                    }
                }
                Err(FetchError::RateLimited { retry_after })
                    if self.may_wait_out(rate_limit_waits) =>
                {
                    rate_limit_waits += 1;
                    stats.rate_limit_waits += 1;
                    let delay = self
                        .policy
                        .backoff
                        .rate_limit_delay(retry_after, rate_limit_waits);
                    log::info!("Rate limited on '{}', waiting {:?}", item.title, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_transient() && retries < self.policy.max_retries => {
                    retries += 1;
                    stats.retries += 1;
                    let delay = self.policy.backoff.delay_for(retries);
                    log::warn!(
                        "Notebook request for '{}' failed ({}), retry {} of {} in {:?}",
                        item.title,
                        e,
                        retries,
                        self.policy.max_retries,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    let error = if e.is_transient() {
                        FetchError::exhausted(retries + 1, e)
                    } else {
                        e
                    };
                    log::error!(
                        "Giving up on '{}' after {} pages: {}",
                        item.title,
                        stats.pages_fetched,
                        error
                    );
                    return ScrapeResult {
                        annotations: Vec::new(),
                        outcome: ScrapeOutcome::Failed(error),
                        stats,
                    };
                }
            }
        }
    }

    fn may_wait_out(&self, waits_so_far: u32) -> bool {
        self.policy
            .max_rate_limit_waits
            .map_or(true, |cap| waits_so_far < cap)
    }
}
