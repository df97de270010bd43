//! Error types for the capability traits.
//!
//! These errors are intentionally domain-specific rather than generic. Each
//! one tells a story about what went wrong while talking to the content
//! source or the destination store, and each carries enough structure for
//! the retry loops to decide between waiting, retrying and giving up.

use std::fmt;
use std::time::Duration;

/// Error that can occur while reading from the content source.
///
/// Only [`FetchError::Permanent`] ever leaves the enumerator or the scraper;
/// every other variant is a transient condition those loops recover from.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The source answered 429. Not a failure: a scheduled-delay signal.
    RateLimited { retry_after: Option<Duration> },

    /// The source answered with a non-success status other than 429.
    Status { status: u16, url: String },

    /// Network or transport error.
    Transport { message: String },

    /// An attempt exceeded its deadline and was abandoned.
    Timeout { operation: String },

    /// The response could not be parsed.
    MalformedResponse { reason: String },

    /// The retry budget was spent; `last` is the final transient error.
    Permanent { attempts: u32, last: Box<FetchError> },
}

impl FetchError {
    /// Returns `true` if the error is worth retrying on the same request.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Permanent { .. })
    }

    /// Wraps the last transient error once the retry budget is exhausted.
    pub fn exhausted(attempts: u32, last: FetchError) -> Self {
        Self::Permanent {
            attempts,
            last: Box::new(last),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(wait) = retry_after {
                    write!(f, " (retry after {}s)", wait.as_secs())?;
                }
                Ok(())
            }
            Self::Status { status, url } => write!(f, "HTTP {} from {}", status, url),
            Self::Transport { message } => write!(f, "Transport error: {}", message),
            Self::Timeout { operation } => write!(f, "Timeout during: {}", operation),
            Self::MalformedResponse { reason } => write!(f, "Malformed response: {}", reason),
            Self::Permanent { attempts, last } => {
                write!(f, "Gave up after {} attempts: {}", attempts, last)
            }
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                operation: err
                    .url()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| "request".to_string()),
            }
        } else if err.is_decode() {
            Self::MalformedResponse {
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}

/// Error that can occur while writing to the destination store.
///
/// Upload failures are isolated per book: the reconciler records them and
/// moves on, so this type never aborts a run.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadError {
    /// The store rejected the request.
    Rejected { status: u16, endpoint: String },

    /// Network or transport error.
    Transport { message: String },

    /// The store's answer could not be parsed.
    MalformedResponse { reason: String },

    /// The bulk insert answered, but no record could be matched to the book.
    Unmatched { title: String },

    /// The bulk insert for the batch this book belonged to failed.
    BatchFailed { reason: String },

    /// The store never handed out a secret for this API key.
    NotConnected { reason: String },
}

impl fmt::Display for UploadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rejected { status, endpoint } => {
                write!(f, "Store rejected {} with HTTP {}", endpoint, status)
            }
            Self::Transport { message } => write!(f, "Transport error: {}", message),
            Self::MalformedResponse { reason } => write!(f, "Malformed store response: {}", reason),
            Self::Unmatched { title } => {
                write!(f, "No store record matched '{}'", title)
            }
            Self::BatchFailed { reason } => write!(f, "Book insert failed: {}", reason),
            Self::NotConnected { reason } => write!(f, "Not connected to store: {}", reason),
        }
    }
}

impl std::error::Error for UploadError {}

impl From<reqwest::Error> for UploadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse {
                reason: err.to_string(),
            }
        } else {
            Self::Transport {
                message: err.to_string(),
            }
        }
    }
}
