//! Multi-criteria film search over the storage port.
//!
//! This crate provides:
//! - Criteria normalization from untrusted request fields
//! - Clause trait and one clause per searchable attribute
//! - Dispatcher running a request's clauses concurrently
//! - Combiner intersecting the partial matches and ordering the result
//! - Rating aggregation with a zero-count guard
//!
//! ## Architecture
//! A search runs in stages:
//! 1. Normalize: raw strings become [`SearchCriteria`] or a client error
//! 2. Dispatch: every populated field runs one storage query, concurrently
//! 3. Combine: films present in every partial match, newest release first
//!
//! Clauses are AND-ed; values inside a genre or actor list are OR-ed.
//!
//! ## Example Usage
//! ```ignore
//! use search::{FilmSearch, RawSearchRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let search = FilmSearch::new(store);
//! let request = RawSearchRequest {
//!     genre: Some("Drama,Comedy".into()),
//!     rating_from: Some("7.0".into()),
//!     ..Default::default()
//! };
//! let films = search.search(&request, &CancellationToken::new()).await?;
//! ```

pub mod clauses;
pub mod combiner;
pub mod criteria;
pub mod dispatcher;
pub mod error;
pub mod facade;
pub mod rating;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main types
pub use combiner::{combine, intersect, order_films};
pub use criteria::{
    DateRange, LIST_DELIMITER, RatingRange, RawSearchRequest, SearchCriteria, SearchRequestBody,
    normalize, normalize_body, split_list,
};
pub use dispatcher::{Dispatched, Dispatcher};
pub use error::{ErrorKind, Result, SearchError, empty_on_no_rows, not_found_on_no_rows};
pub use facade::{FilmSearch, Page};
pub use rating::aggregate_rating;
pub use traits::{Clause, ClauseKind, PartialMatch};
