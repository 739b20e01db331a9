//! Search facade: normalize, dispatch, combine.
//!
//! [`FilmSearch`] is the single entry point the HTTP layer and the CLI use.
//! It holds nothing but the shared storage handle, so one instance serves
//! every request concurrently.

use crate::combiner::combine;
use crate::criteria::{RawSearchRequest, SearchCriteria, SearchRequestBody, normalize, normalize_body};
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::rating::aggregate_rating;
use catalog::{FilmId, FilmSummary, RatingSummary};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use storage::FilmStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Search entry point over any storage backend
#[derive(Clone)]
pub struct FilmSearch {
    store: Arc<dyn FilmStore>,
}

impl FilmSearch {
    pub fn new(store: Arc<dyn FilmStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn FilmStore> {
        &self.store
    }

    /// Search from query-string parameters.
    ///
    /// Malformed criteria fail before storage is touched.
    pub async fn search(
        &self,
        request: &RawSearchRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<FilmSummary>> {
        let criteria = normalize(request)?;
        self.search_criteria(&criteria, cancel).await
    }

    /// Search from a JSON request body
    pub async fn search_body(
        &self,
        body: &SearchRequestBody,
        cancel: &CancellationToken,
    ) -> Result<Vec<FilmSummary>> {
        let criteria = normalize_body(body)?;
        self.search_criteria(&criteria, cancel).await
    }

    /// Search with already-validated criteria.
    ///
    /// Results hold every film matching all populated clauses, newest
    /// release first. No clauses means every film in the catalog.
    #[instrument(skip_all, fields(clauses = criteria.clause_count()))]
    pub async fn search_criteria(
        &self,
        criteria: &SearchCriteria,
        cancel: &CancellationToken,
    ) -> Result<Vec<FilmSummary>> {
        let start = Instant::now();

        let dispatcher = Dispatcher::for_criteria(criteria);
        let dispatched = dispatcher.dispatch(self.store.as_ref(), cancel).await?;
        let dispatch_time = start.elapsed();

        let films = combine(dispatched);

        info!(
            results = films.len(),
            dispatch = ?dispatch_time,
            total = ?start.elapsed(),
            "search complete"
        );
        Ok(films)
    }

    /// Rating summary of one film; `{0, 0}` when it has no ratings
    pub async fn film_rating(&self, film_id: FilmId) -> Result<RatingSummary> {
        Ok(aggregate_rating(self.store.as_ref(), film_id).await?)
    }
}

/// 1-based page of an ordered result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub page: usize,
    pub per_page: usize,
}

impl Page {
    pub const DEFAULT_PER_PAGE: usize = 20;
    pub const MAX_PER_PAGE: usize = 100;

    /// Page numbers below 1 become 1; `per_page` is clamped to `1..=MAX_PER_PAGE`
    pub fn new(page: usize, per_page: usize) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, Self::MAX_PER_PAGE),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.per_page)
    }

    /// Slice of `items` on this page; past the end is empty
    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, Self::DEFAULT_PER_PAGE)
    }
}
