//! Inclusive release-date window with optional ends.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use chrono::NaiveDate;
use storage::{FilmStore, StorageResult};

pub struct ReleaseDateClause {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl ReleaseDateClause {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }
}

#[async_trait]
impl Clause for ReleaseDateClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::ReleaseDate
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                return Ok(Vec::new());
            }
        }
        store.find_by_release_date(self.from, self.to).await
    }
}
