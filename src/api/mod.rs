// src/api/mod.rs
//! Talking to the reading service and the highlight store.
//!
//! I/O lives in [`client`], pure interpretation of answers in [`parser`]
//! and [`extractor`], and the retrying walks over pages in
//! [`enumerator`] and [`detail_scraper`]. [`reconciler`] owns the
//! two-step upload.

pub mod cache;
pub mod client;
pub mod detail_scraper;
pub mod enumerator;
pub mod extractor;
pub mod parser;
pub mod reconciler;
mod responses;
mod simple_pagination;

// Re-export the public interface
pub use cache::{LibraryCache, SyncState};
pub use client::{ApiResponse, SourceHttpClient, StoreHttpClient};
pub use detail_scraper::{DetailScraper, ScrapeOutcome, ScrapePolicy, ScrapeResult, ScrapeStats};
pub use enumerator::LibraryEnumerator;
pub use extractor::{extract, ExtractedPage};
pub use reconciler::{UploadOutcome, UploadReconciler};
pub use responses::{
    AnnotationRecord, ConnectResponse, InsertItemsResponse, ItemRecord, LibraryResponse,
    RawLibraryItem, StoreRecord,
};
