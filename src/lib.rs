// src/lib.rs
//! unearthed-sync library: pulls reading highlights out of a Kindle-style
//! notebook and pushes them into an Unearthed-style highlight store.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `FetchError`, `UploadError`, `ValidationError`
//! - **Configuration**: `CommandLineInput`, `SyncConfig`
//! - **Domain model**: `CatalogItem`, `Annotation`, `Catalog`, `SyncReport`, etc.
//! - **Domain types**: `ExternalId`, `RemoteId`, `ApiKey`, `SessionCookie`, etc.
//! - **API client**: `SourceHttpClient`, `StoreHttpClient`, enumerator, scraper, reconciler
//! - **Orchestration**: `SyncOrchestrator`
//! - **Formatting**: `normalize`, `format_author`, `split_title`, `render_csv`

#[cfg(feature = "bench")]
pub mod api;
#[cfg(not(feature = "bench"))]
mod api;

mod algebras;
mod config;
mod constants;
mod error;
mod error_recovery;

#[cfg(feature = "bench")]
pub mod formatting;
#[cfg(not(feature = "bench"))]
mod formatting;

#[cfg(feature = "bench")]
pub mod model;
#[cfg(not(feature = "bench"))]
mod model;

mod orchestrator;
mod output;
mod pipeline;

#[cfg(feature = "bench")]
pub mod types;
#[cfg(not(feature = "bench"))]
mod types;

// --- Error Handling ---
pub use crate::error::AppError;
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{CommandLineInput, StoreConfig, SyncConfig};
pub use crate::constants::{
    DEFAULT_SOURCE_BASE_URL, DEFAULT_STORE_BASE_URL, NOTEBOOK_MAX_PAGES, NOTEBOOK_MAX_RETRIES,
    NOTEBOOK_REQUEST_TIMEOUT,
};

// --- Domain Model ---
pub use crate::model::{
    Annotation, Catalog, CatalogItem, FailedItem, FailureReason, MergeStats,
    RemoteIdentifierMap, ScrapeCursor, SyncEvent, SyncReport, TitleFilter,
};

// --- Domain Types ---
pub use crate::types::{
    ApiKey, CatalogMarker, ExternalId, Id, RemoteId, SessionCookie, StoreSecret, ValidatedUrl,
};

// --- API Client ---
pub use crate::api::{
    extract, parser::parse_retry_after, reconciler::reconcile, AnnotationRecord, ApiResponse,
    DetailScraper, ExtractedPage, InsertItemsResponse, ItemRecord, LibraryCache,
    LibraryEnumerator, ScrapeOutcome, ScrapePolicy, ScrapeResult, ScrapeStats, SourceHttpClient,
    StoreHttpClient, StoreRecord, SyncState, UploadOutcome, UploadReconciler,
};

// --- Orchestration ---
pub use crate::error_recovery::{retry_with_backoff, BackoffPolicy};
pub use crate::orchestrator::{RunState, SyncOrchestrator};

// --- Formatting ---
pub use crate::formatting::{format_author, normalize, render_csv, split_title};

// --- Output ---
pub use crate::output::{csv_target, deliver, DeliveryTarget, OutputPlan, OutputReport};

// --- Pipeline Traits ---
pub use crate::pipeline::{ExportComposer, ExportDelivery, LibrarySync};

// --- Algebras (Capability Traits) ---
pub use crate::algebras::{DestinationStore, FetchError, LibraryPage, LibrarySource, UploadError};
