//! Per-film rating summary from the storage rollup.

use catalog::{FilmId, RatingSummary};
use storage::{FilmStore, StorageError, StorageResult};
use tracing::debug;

/// Average and count of a film's ratings.
///
/// A film without ratings, or one storage knows nothing about, summarizes
/// to `{0, 0}` instead of failing. Averages are clamped to the rating scale.
pub async fn aggregate_rating(store: &dyn FilmStore, film_id: FilmId) -> StorageResult<RatingSummary> {
    match store.rating_rollup(film_id).await {
        Ok(rollup) => Ok(RatingSummary::from_rollup(rollup)),
        Err(StorageError::NoRows) => {
            debug!(film_id, "film has no ratings");
            Ok(RatingSummary::UNRATED)
        }
        Err(err) => Err(err),
    }
}
