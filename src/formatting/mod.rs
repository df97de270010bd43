// src/formatting/mod.rs
//! Text shaping: normalization of scraped text, listing title/author
//! cleanup, and the CSV export.

mod csv;
mod names;
mod normalize;

// --- Text Canonicalization ---
pub use self::normalize::normalize;

// --- Listing Fields ---
pub use self::names::{format_author, split_title};

// --- Export ---
pub use self::csv::render_csv;
