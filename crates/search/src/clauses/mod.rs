//! Clause implementations for the search dispatcher.
//!
//! Each clause wraps exactly one query of the storage port. A populated
//! [`SearchCriteria`](crate::SearchCriteria) field maps to exactly one clause.

pub mod actor;
pub mod content_rating;
pub mod genre;
pub mod rating_range;
pub mod release_date;
pub mod title;

// Re-export for convenience
pub use actor::ActorClause;
pub use content_rating::ContentRatingClause;
pub use genre::GenreClause;
pub use rating_range::RatingClause;
pub use release_date::ReleaseDateClause;
pub use title::TitleClause;
