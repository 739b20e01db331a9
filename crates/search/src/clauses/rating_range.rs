//! Inclusive window on a film's average rating.
//!
//! Films nobody has rated have no average and never match, even against a
//! lower bound of 0.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use storage::{FilmStore, StorageResult};

pub struct RatingClause {
    min: Option<f64>,
    max: Option<f64>,
}

impl RatingClause {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }
}

#[async_trait]
impl Clause for RatingClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Rating
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Ok(Vec::new());
            }
        }
        store.find_by_rating(self.min, self.max).await
    }
}
