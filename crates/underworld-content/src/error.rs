//! Error types for the `underworld-content` crate.
//!
//! These errors describe a single unreadable or malformed package. The
//! loader never lets them abort a whole bank load; the offending package
//! is skipped and logged.

use std::path::PathBuf;

/// Errors that can occur while reading or parsing a content package.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The package file could not be read from disk.
    #[error("failed to read content package {}: {source}", .path.display())]
    Io {
        /// Path of the package that failed.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The package text is not a valid crime package.
    #[error("failed to parse content package {package}: {source}")]
    Json {
        /// Name of the package that failed.
        package: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },
}
