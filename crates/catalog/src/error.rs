//! Error types for the catalog crate.
//!
//! Loading a catalog can fail while reading a file, while parsing one of its
//! lines, or while cross-checking references between files. Each case gets its
//! own variant so callers can report exactly where the data went wrong.

use thiserror::Error;

/// Errors that can occur while loading and indexing the film catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a data file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A data field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Referenced entity doesn't exist (e.g., cast entry for a non-existent film)
    #[error("Missing reference: {entity} with id {id}")]
    MissingReference { entity: String, id: u64 },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
