//! The Dispatcher runs the clauses of one search concurrently.
//!
//! Clauses are independent read-only queries, so they are started together
//! and joined with `try_join_all`. The first storage failure aborts the
//! whole dispatch and drops the remaining in-flight queries. A request with
//! no clause falls back to an unconstrained listing.

use crate::clauses::{
    ActorClause, ContentRatingClause, GenreClause, RatingClause, ReleaseDateClause, TitleClause,
};
use crate::criteria::SearchCriteria;
use crate::error::{Result, SearchError, empty_on_no_rows};
use crate::traits::{Clause, ClauseKind, PartialMatch};
use futures::future::try_join_all;
use std::time::Instant;
use storage::{FilmStore, StorageError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// What the dispatcher produced for the combiner
#[derive(Debug)]
pub enum Dispatched {
    /// No clause was requested; every film in the catalog
    Browse(PartialMatch),
    /// One partial match per clause, in dispatch order
    Clauses(Vec<PartialMatch>),
}

/// Runs a set of clauses against the storage port.
///
/// ## Usage
/// ```ignore
/// let dispatcher = Dispatcher::new()
///     .add_clause(TitleClause::new("matrix"))
///     .add_clause(RatingClause::new(Some(7.0), None));
///
/// let dispatched = dispatcher.dispatch(store.as_ref(), &cancel).await?;
/// ```
pub struct Dispatcher {
    clauses: Vec<Box<dyn Clause>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            clauses: Vec::new(),
        }
    }

    /// Add a clause (builder pattern)
    pub fn add_clause(mut self, clause: impl Clause + 'static) -> Self {
        self.clauses.push(Box::new(clause));
        self
    }

    /// One clause per populated criteria field
    pub fn for_criteria(criteria: &SearchCriteria) -> Self {
        let mut dispatcher = Self::new();
        if let Some(title) = &criteria.title {
            dispatcher = dispatcher.add_clause(TitleClause::new(title.clone()));
        }
        if criteria.release.is_set() {
            dispatcher = dispatcher
                .add_clause(ReleaseDateClause::new(criteria.release.from, criteria.release.to));
        }
        if criteria.rating.is_set() {
            dispatcher =
                dispatcher.add_clause(RatingClause::new(criteria.rating.min, criteria.rating.max));
        }
        if let Some(mpaa) = &criteria.content_rating {
            dispatcher = dispatcher.add_clause(ContentRatingClause::new(mpaa.clone()));
        }
        if !criteria.genres.is_empty() {
            dispatcher = dispatcher.add_clause(GenreClause::new(&criteria.genres));
        }
        if !criteria.actors.is_empty() {
            dispatcher = dispatcher.add_clause(ActorClause::new(&criteria.actors));
        }
        dispatcher
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn clause_kinds(&self) -> Vec<ClauseKind> {
        self.clauses.iter().map(|clause| clause.kind()).collect()
    }

    /// Run every clause, or the browse listing when there are none.
    ///
    /// Returns [`SearchError::Cancelled`] as soon as `cancel` fires; pending
    /// storage calls are dropped with it.
    #[instrument(skip_all, fields(clauses = self.clauses.len(), backend = store.backend()))]
    pub async fn dispatch(
        &self,
        store: &dyn FilmStore,
        cancel: &CancellationToken,
    ) -> Result<Dispatched> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                warn!("search cancelled while clauses were in flight");
                Err(SearchError::Cancelled)
            }
            result = self.run(store) => result,
        }
    }

    async fn run(&self, store: &dyn FilmStore) -> Result<Dispatched> {
        if self.clauses.is_empty() {
            let films = empty_on_no_rows(store.list_films().await)?;
            debug!(films = films.len(), "no clauses, browsing catalog");
            return Ok(Dispatched::Browse(PartialMatch::new(ClauseKind::Browse, films)));
        }

        let partials = try_join_all(
            self.clauses
                .iter()
                .map(|clause| run_clause(clause.as_ref(), store)),
        )
        .await?;
        Ok(Dispatched::Clauses(partials))
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_clause(
    clause: &dyn Clause,
    store: &dyn FilmStore,
) -> std::result::Result<PartialMatch, StorageError> {
    let kind = clause.kind();
    let start = Instant::now();

    match clause.evaluate(store).await {
        Ok(films) => {
            let partial = PartialMatch::new(kind, films);
            debug!(
                clause = %kind,
                matches = partial.len(),
                elapsed = ?start.elapsed(),
                "clause evaluated"
            );
            Ok(partial)
        }
        Err(StorageError::NoRows) => {
            debug!(clause = %kind, "clause matched no rows");
            Ok(PartialMatch::empty(kind))
        }
        Err(err) => {
            warn!(clause = %kind, error = %err, "clause query failed");
            Err(err)
        }
    }
}
