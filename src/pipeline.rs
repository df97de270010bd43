// src/pipeline.rs
//! Pipeline capability traits for the three stages of a highlight sync.
//!
//! sync (scrape + upload) → compose the export → deliver it. Each trait
//! describes a single capability so the stages can be tested in isolation.

use crate::error::AppError;
use crate::model::{CatalogItem, SyncReport};
use crate::output::OutputReport;

/// Runs one synchronization and reports per-book results.
#[async_trait::async_trait]
pub trait LibrarySync {
    async fn sync(&self) -> Result<SyncReport, AppError>;
}

/// Renders synced books into an exportable document.
pub trait ExportComposer {
    fn compose(&self, items: &[CatalogItem]) -> String;
}

/// Delivers a rendered export to its destinations.
pub trait ExportDelivery {
    fn deliver(&self, export: String) -> Result<OutputReport, AppError>;
}
