//! Error types for listing extraction and oracle runs.
//!
//! Parser non-matches and ambiguous candidates are not errors; they simply
//! produce no listing. Everything here is an operator or input problem that
//! aborts the run.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading or writing a file failed.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// LZ4 frame decoding failed.
    #[error("Failed to decompress {}: {source}", .path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An oracle line is not valid JSON.
    #[error("Malformed oracle line {line} in {}: {source}", .path.display())]
    OracleLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// An oracle line is valid JSON but not an object.
    #[error("Oracle line {line} in {} is not a JSON object", .path.display())]
    OracleRecord { path: PathBuf, line: usize },

    /// A rule selector could not be parsed as CSS.
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// A rules file could not be deserialized.
    #[error("Invalid rules definition: {0}")]
    InvalidRules(#[source] serde_json::Error),

    /// JSON serialization failed.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The output location is missing or not a directory.
    #[error("Output path is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;
