// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! Per-book problems never show up here: they are recorded in the
//! [`SyncReport`](crate::model::SyncReport). `AppError` is for the failures
//! that stop a run or keep it from starting.

use crate::algebras::{FetchError, UploadError};
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Could not read the library: {0}")]
    SourceUnreachable(#[from] FetchError),

    #[error("Could not reach the store: {0}")]
    StoreUnavailable(#[from] UploadError),

    #[error("A sync is already running")]
    AlreadyRunning,

    #[error("Malformed data: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Output delivery failed: {}", failures.join(", "))]
    DeliveryFailed { failures: Vec<String> },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

// Allow converting from anyhow::Error, preserving error chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_convert_with_context() {
        let err: AppError = FetchError::exhausted(
            4,
            FetchError::Status {
                status: 503,
                url: "https://read.example/kindle-library/search".to_string(),
            },
        )
        .into();
        assert_eq!(
            err.to_string(),
            "Could not read the library: Gave up after 4 attempts: HTTP 503 from https://read.example/kindle-library/search"
        );

        let err: AppError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, AppError::InternalError { .. }));
    }

    #[test]
    fn validation_errors_are_transparent() {
        let err: AppError = crate::types::ApiKey::new("   ").unwrap_err().into();
        assert_eq!(
            err.to_string(),
            "Invalid API key format: API key cannot be empty"
        );
    }
}
