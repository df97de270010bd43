//! Domain model for a synchronized highlight library.

mod annotation;
mod catalog;
mod remote;
mod report;

pub use annotation::{Annotation, ScrapeCursor};
pub use catalog::{Catalog, CatalogItem, MergeStats, TitleFilter};
pub use remote::RemoteIdentifierMap;
pub use report::{FailedItem, FailureReason, SyncEvent, SyncReport};
