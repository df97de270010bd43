//! Write access to the destination store.

use crate::api::{AnnotationRecord, InsertItemsResponse, ItemRecord};
use async_trait::async_trait;

use super::error::UploadError;

/// Upload capability for the highlight store.
///
/// # Laws
///
/// - **L1 (Insert-or-match)**: `insert_items` never duplicates a book the
///   store already holds; such books come back in `existing_records`.
/// - **L2 (Bulk answer)**: every record in the answer carries the store id.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Inserts or matches a batch of books.
    async fn insert_items(&self, items: &[ItemRecord]) -> Result<InsertItemsResponse, UploadError>;

    /// Posts the annotations of one book.
    async fn insert_annotations(&self, records: &[AnnotationRecord]) -> Result<(), UploadError>;
}
