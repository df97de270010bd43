//! Capability algebras for unearthed-sync.
//!
//! This module defines the traits that separate the sync pipeline from the
//! network. Each trait is:
//!
//! - **Object-safe**: can be used as `dyn Trait`
//! - **Documented with laws**: properties that all implementations must satisfy
//! - **Async via `async_trait`**
//!
//! # Architecture
//!
//! ```text
//! Application Layer (main.rs)
//!         ↓
//! Pipeline (orchestrator.rs, api/enumerator, api/detail_scraper, api/reconciler)
//!         ↓
//! Capabilities (algebras/)
//!         ↓
//! Interpreters (api/client.rs, in-memory mocks in tests)
//! ```
//!
//! # Capability Traits
//!
//! - [`LibrarySource`]: library listing and notebook pages
//! - [`DestinationStore`]: book and annotation inserts

pub mod error;
pub mod source;
pub mod store;

pub use error::{FetchError, UploadError};
pub use source::{LibraryPage, LibrarySource};
pub use store::DestinationStore;
