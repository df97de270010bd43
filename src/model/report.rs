// src/model/report.rs
//! What a run tells the outside world: the final report and the progress
//! events emitted along the way.

use super::CatalogItem;
use crate::algebras::{FetchError, UploadError};
use std::fmt;

/// Why a book ended up in the failed half of a [`SyncReport`].
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The notebook could not be read; its partial annotations were discarded.
    ScrapeFailed { error: FetchError },
    /// The notebook hit the page ceiling before the source ran out of pages.
    Truncated { pages: u32 },
    /// Scraped fine, but the store did not take it.
    Upload { error: UploadError },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScrapeFailed { error } => write!(f, "scrape failed: {}", error),
            Self::Truncated { pages } => {
                write!(f, "stopped after {} pages without reaching the end", pages)
            }
            Self::Upload { error } => write!(f, "upload failed: {}", error),
        }
    }
}

/// A book that did not make it, with the reason.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub item: CatalogItem,
    pub reason: FailureReason,
}

/// The immutable outcome of one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    succeeded: Vec<CatalogItem>,
    failed: Vec<FailedItem>,
}

impl SyncReport {
    pub fn new(succeeded: Vec<CatalogItem>, failed: Vec<FailedItem>) -> Self {
        Self { succeeded, failed }
    }

    /// A report for a run that had nothing to do.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn succeeded(&self) -> &[CatalogItem] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[FailedItem] {
        &self.failed
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Renders the end-of-run summary shown to the user.
    ///
    /// ```text
    /// Done
    /// 1 book failed to upload
    /// FAILED: Dune
    /// ---
    /// 2 books uploaded
    /// Uploaded: 1984
    /// Uploaded: Emma
    /// ```
    ///
    /// Each section only appears when it has entries.
    pub fn summary(&self) -> String {
        let mut out = String::from("Done");

        if !self.failed.is_empty() {
            out.push_str(&format!("\n{} failed to upload", books(self.failed.len())));
            for failed in &self.failed {
                out.push_str(&format!("\nFAILED: {}", failed.item.title));
            }
            out.push_str("\n---");
        }

        if !self.succeeded.is_empty() {
            out.push_str(&format!("\n{} uploaded", books(self.succeeded.len())));
            for item in &self.succeeded {
                out.push_str(&format!("\nUploaded: {}", item.title));
            }
        }

        out
    }
}

fn books(count: usize) -> String {
    if count == 1 {
        "1 book".to_string()
    } else {
        format!("{} books", count)
    }
}

/// Progress notifications streamed to the shell while a run is in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Enumeration finished and the selection is known.
    ItemsFound { count: usize },
    /// One book's metadata and annotations reached the store.
    ItemUploaded { title: String },
    /// The run is over.
    Finished { succeeded: usize, failed: usize },
    /// The library listing could not be read at all.
    SourceUnreachable,
    /// Another run was already in progress; this request did nothing.
    AlreadyRunning,
    /// The filters left nothing to sync.
    NoItemsSelected,
}

impl fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ItemsFound { count } => write!(f, "Found {}", books(*count)),
            Self::ItemUploaded { title } => write!(f, "Uploaded: {}", title),
            Self::Finished { succeeded, failed } => {
                write!(f, "Finished: {} succeeded, {} failed", succeeded, failed)
            }
            Self::SourceUnreachable => write!(f, "Could not read the library. Are you signed in?"),
            Self::AlreadyRunning => write!(f, "A sync is already running"),
            Self::NoItemsSelected => write!(f, "No books selected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExternalId;

    fn book(id: &str, title: &str) -> CatalogItem {
        CatalogItem::from_listing(ExternalId::parse(id).unwrap(), Some(title), None, None)
    }

    #[test]
    fn summary_with_both_sections() {
        let report = SyncReport::new(
            vec![book("A", "1984"), book("B", "Emma")],
            vec![FailedItem {
                item: book("C", "Dune: Part One"),
                reason: FailureReason::Truncated { pages: 500 },
            }],
        );
        insta::assert_snapshot!(report.summary(), @r"
        Done
        1 book failed to upload
        FAILED: Dune
        ---
        2 books uploaded
        Uploaded: 1984
        Uploaded: Emma
        ");
        assert!(!report.is_clean());
    }

    #[test]
    fn summary_of_empty_run_is_just_done() {
        assert_eq!(SyncReport::empty().summary(), "Done");
        assert!(SyncReport::empty().is_clean());
    }

    #[test]
    fn summary_without_failures_has_no_separator() {
        let report = SyncReport::new(vec![book("A", "Emma")], vec![]);
        assert_eq!(report.summary(), "Done\n1 book uploaded\nUploaded: Emma");
    }

    #[test]
    fn failure_reasons_read_naturally() {
        let reason = FailureReason::Upload {
            error: UploadError::Unmatched {
                title: "Emma".to_string(),
            },
        };
        assert_eq!(
            reason.to_string(),
            "upload failed: No store record matched 'Emma'"
        );
    }
}
