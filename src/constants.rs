// src/constants.rs
//! Domain constants that define the operational boundaries of the system.
//!
//! Each constant is named for the domain concept it constrains, not its
//! technical role. Reading these constants should tell you the story
//! of how a sync run behaves: how hard it retries, how long it waits,
//! how much it is willing to read for a single book.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Content source boundaries
// ---------------------------------------------------------------------------

/// Default origin of the reading service (library listing and notebook pages).
pub const DEFAULT_SOURCE_BASE_URL: &str = "https://read.amazon.com";

/// How many catalog entries the library listing returns per page.
pub const LIBRARY_PAGE_SIZE: u32 = 50;

/// How many times a failed library page is re-requested before enumeration
/// is abandoned. Each page starts with a fresh budget.
pub const LIBRARY_MAX_RETRIES: u32 = 3;

/// How many times a failed notebook page is re-requested before the book is
/// marked as failed.
pub const NOTEBOOK_MAX_RETRIES: u32 = 5;

/// Per-attempt deadline for a notebook page request.
pub const NOTEBOOK_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Hard ceiling on notebook pages read for one book.
///
/// The source never promises that continuation tokens terminate; a book that
/// exceeds this is reported as truncated instead of looping forever.
pub const NOTEBOOK_MAX_PAGES: u32 = 500;

// ---------------------------------------------------------------------------
// Backoff schedule
// ---------------------------------------------------------------------------

/// Base delays, indexed by attempt number. Attempts past the end reuse the
/// last entry.
pub const BACKOFF_TABLE_MS: [u64; 5] = [1_000, 2_000, 4_000, 8_000, 16_000];

/// Upper bound of the random jitter added to every table delay.
pub const BACKOFF_JITTER_MS: u64 = 1_000;

/// No single wait, jittered or server-requested, exceeds this.
pub const BACKOFF_MAX_DELAY_MS: u64 = 30_000;

// ---------------------------------------------------------------------------
// Destination store boundaries
// ---------------------------------------------------------------------------

/// Default origin of the destination store's public API.
pub const DEFAULT_STORE_BASE_URL: &str = "https://unearthed.app";

/// Separator between the API key and the connect secret in the bearer token.
pub const STORE_AUTH_SEPARATOR: &str = "~~~";

// ---------------------------------------------------------------------------
// Catalog text conventions
// ---------------------------------------------------------------------------

/// Splits a raw listing title into title and subtitle (first occurrence only).
pub const TITLE_SUBTITLE_DELIMITER: &str = ": ";

/// Splits an annotation header into its color and location parts.
pub const HEADER_COLOR_LOCATION_SEPARATOR: &str = " | ";

/// Title used when the listing entry has none.
pub const UNTITLED: &str = "Untitled";

/// Author used when the listing entry has no authors.
pub const UNKNOWN_AUTHOR: &str = "Unknown";

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
