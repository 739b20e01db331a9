//! Case-insensitive substring match on the film title.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use storage::{FilmStore, StorageResult};

pub struct TitleClause {
    title: String,
}

impl TitleClause {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

#[async_trait]
impl Clause for TitleClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Title
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        store.find_by_title(&self.title).await
    }
}
