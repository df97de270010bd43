// src/output/mod.rs
//! Output handling with clear separation of planning and execution.
//!
//! Planning (which files, what content) is pure; [`deliver`] is the only
//! place that touches the filesystem or stdout.

mod paths;
mod types;
mod writer;

// Re-export the public interface
pub use paths::{csv_target, DEFAULT_CSV_FILENAME};
pub use types::{CompletedOperation, DeliveryTarget, FailedOperation, OutputPlan, OutputReport};
pub use writer::deliver;
