//! Error types for the search core.

use storage::StorageError;
use thiserror::Error;

/// Who is at fault for a failed call, as seen by the boundary layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed
    Client,
    /// A point lookup found no entity
    NotFound,
    /// Storage failed, the call was cancelled, or state was unexpected
    Internal,
}

/// Errors produced by criteria normalization, dispatch and point lookups
#[derive(Error, Debug)]
pub enum SearchError {
    /// A request field could not be turned into a criteria value
    #[error("invalid {field} '{value}': {reason}")]
    InvalidCriteria {
        field: &'static str,
        value: String,
        reason: String,
    },

    /// A point lookup found nothing. An empty search result is not this.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller's cancellation token fired before the search finished
    #[error("search cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    pub fn invalid(field: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        SearchError::InvalidCriteria {
            field,
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::InvalidCriteria { .. } => ErrorKind::Client,
            SearchError::NotFound { .. } => ErrorKind::NotFound,
            SearchError::Storage(_) | SearchError::Cancelled | SearchError::Internal(_) => {
                ErrorKind::Internal
            }
        }
    }
}

/// Maps the result of a point lookup: "no rows" becomes [`SearchError::NotFound`],
/// every other storage failure passes through unchanged.
pub fn not_found_on_no_rows(entity: &'static str, id: u64) -> impl FnOnce(StorageError) -> SearchError {
    move |err| match err {
        StorageError::NoRows => SearchError::NotFound { entity, id },
        other => SearchError::Storage(other),
    }
}

/// Maps the result of a set query: "no rows" is an empty set, not a failure
pub fn empty_on_no_rows<T>(
    result: std::result::Result<Vec<T>, StorageError>,
) -> std::result::Result<Vec<T>, StorageError> {
    match result {
        Err(StorageError::NoRows) => Ok(Vec::new()),
        other => other,
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, SearchError>;
