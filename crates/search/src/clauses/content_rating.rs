//! Exact match on the MPAA content rating.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use storage::{FilmStore, StorageResult};

pub struct ContentRatingClause {
    mpaa: String,
}

impl ContentRatingClause {
    pub fn new(mpaa: impl Into<String>) -> Self {
        Self { mpaa: mpaa.into() }
    }
}

#[async_trait]
impl Clause for ContentRatingClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::ContentRating
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        store.find_by_content_rating(&self.mpaa).await
    }
}
