//! The storage port: what the search core and the catalog service need from a
//! backend, and how backends report failure.
//!
//! Every set query returns the films matching one predicate and nothing else.
//! Combining predicates is the caller's job. Point lookups report a missing
//! entity as [`StorageError::NoRows`] so callers can tell "not there" apart
//! from "the query failed".

use async_trait::async_trait;
use catalog::{Actor, ActorId, ActorSummary, Film, FilmId, FilmSummary, RatingRollup, UserId};
use chrono::NaiveDate;
use thiserror::Error;

/// Errors reported by a storage backend
#[derive(Error, Debug)]
pub enum StorageError {
    /// The query matched nothing. Point lookups turn this into "not found",
    /// set queries into an empty result.
    #[error("no rows returned")]
    NoRows,

    /// The backend rejected or failed to run a query
    #[error("{operation} failed: {source}")]
    Query {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The backend cannot be reached
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The backend returned data the catalog model cannot represent
    #[error("storage internal error: {0}")]
    Internal(String),
}

impl StorageError {
    pub fn is_no_rows(&self) -> bool {
        matches!(self, StorageError::NoRows)
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Catalog queries used by the search core and the film/actor pages.
///
/// Implementations must be safe to share between concurrent requests.
#[async_trait]
pub trait FilmStore: Send + Sync {
    /// Short backend name for logs ("memory", "postgres")
    fn backend(&self) -> &'static str;

    /// Cheap liveness probe used by the health-check loop
    async fn ping(&self) -> StorageResult<()>;

    /// Full catalog listing
    async fn list_films(&self) -> StorageResult<Vec<FilmSummary>>;

    /// Films whose title contains `title`, ignoring case
    async fn find_by_title(&self, title: &str) -> StorageResult<Vec<FilmSummary>>;

    /// Films released within `[from, to]`; a `None` side is unbounded
    async fn find_by_release_date(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StorageResult<Vec<FilmSummary>>;

    /// Rated films whose mean rating lies within `[min, max]`; a `None` side
    /// is unbounded. Films nobody rated never match.
    async fn find_by_rating(
        &self,
        min: Option<f64>,
        max: Option<f64>,
    ) -> StorageResult<Vec<FilmSummary>>;

    /// Films carrying exactly this content rating code
    async fn find_by_content_rating(&self, mpaa: &str) -> StorageResult<Vec<FilmSummary>>;

    /// Films tagged with at least one of `genres`
    async fn find_by_genres(&self, genres: &[String]) -> StorageResult<Vec<FilmSummary>>;

    /// Films whose cast includes at least one of `actors` (by name)
    async fn find_by_actors(&self, actors: &[String]) -> StorageResult<Vec<FilmSummary>>;

    /// Point lookup; [`StorageError::NoRows`] when the film doesn't exist
    async fn film(&self, id: FilmId) -> StorageResult<Film>;

    async fn film_genres(&self, id: FilmId) -> StorageResult<Vec<String>>;

    async fn film_cast(&self, id: FilmId) -> StorageResult<Vec<ActorSummary>>;

    /// Sum and count of the ratings left on a film
    async fn rating_rollup(&self, id: FilmId) -> StorageResult<RatingRollup>;

    /// Point lookup; [`StorageError::NoRows`] when the actor doesn't exist
    async fn actor(&self, id: ActorId) -> StorageResult<Actor>;

    async fn actor_films(&self, id: ActorId) -> StorageResult<Vec<FilmSummary>>;
}

/// Per-user favorites. Adding or removing twice has the same effect as once.
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn favorite_films(&self, user: UserId) -> StorageResult<Vec<FilmSummary>>;

    /// [`StorageError::NoRows`] when the film doesn't exist
    async fn add_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()>;

    async fn remove_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()>;

    async fn favorite_actors(&self, user: UserId) -> StorageResult<Vec<Actor>>;

    /// [`StorageError::NoRows`] when the actor doesn't exist
    async fn add_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()>;

    async fn remove_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()>;
}
