//! Films crediting any of the requested actors, matched by full name.

use crate::traits::{Clause, ClauseKind};
use async_trait::async_trait;
use catalog::FilmSummary;
use std::collections::BTreeSet;
use storage::{FilmStore, StorageResult};

pub struct ActorClause {
    actors: Vec<String>,
}

impl ActorClause {
    pub fn new(actors: &BTreeSet<String>) -> Self {
        Self {
            actors: actors.iter().cloned().collect(),
        }
    }
}

#[async_trait]
impl Clause for ActorClause {
    fn kind(&self) -> ClauseKind {
        ClauseKind::Actors
    }

    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>> {
        store.find_by_actors(&self.actors).await
    }
}
