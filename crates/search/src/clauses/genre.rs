//! Films tagged with any of the requested genres.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use std::collections::BTreeSet;
use storage::{FilmStore, StorageResult};

pub struct GenreClause {
    genres: Vec<String>,
}

impl GenreClause {
    pub fn new(genres: &BTreeSet<String>) -> Self {
        Self {
            genres: genres.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl Clause for GenreClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Genres
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        store.find_by_genres(&self.genres).await
    }
}
