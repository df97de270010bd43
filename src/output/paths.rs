// src/output/paths.rs
//! Pure path calculations for exported files.

use std::path::{Path, PathBuf};

/// File name used when the export target is a directory.
pub const DEFAULT_CSV_FILENAME: &str = "books.csv";

/// Resolves where the CSV export goes.
///
/// An existing directory (or a path ending in a separator) gets
/// [`DEFAULT_CSV_FILENAME`] appended. A bare name without an extension gets
/// `.csv`.
pub fn csv_target(requested: &Path) -> PathBuf {
    let names_directory = requested.is_dir()
        || requested
            .to_str()
            .is_some_and(|s| s.ends_with(std::path::MAIN_SEPARATOR) || s.ends_with('/'));
    if names_directory {
        return requested.join(DEFAULT_CSV_FILENAME);
    }
    if requested.extension().is_none() {
        return requested.with_extension("csv");
    }
    requested.to_path_buf()
}
