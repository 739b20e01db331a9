//! Core traits for the clause dispatcher.
//!
//! This module defines the Clause trait: one single-predicate query against
//! the storage port. Every clause produces a [`PartialMatch`], and a search
//! result is the intersection of all of them.

use async_trait::async_trait;
use catalog::{FilmId, FilmSummary};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use storage::{FilmStore, StorageResult};

/// Which predicate produced a partial match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClauseKind {
    Title,
    ReleaseDate,
    Rating,
    ContentRating,
    Genres,
    Actors,
    /// Unconstrained listing used when a request names no clause
    Browse,
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClauseKind::Title => "title",
            ClauseKind::ReleaseDate => "release_date",
            ClauseKind::Rating => "rating",
            ClauseKind::ContentRating => "content_rating",
            ClauseKind::Genres => "genres",
            ClauseKind::Actors => "actors",
            ClauseKind::Browse => "browse",
        };
        f.write_str(name)
    }
}

/// Films satisfying one clause, keyed by id.
///
/// Keying by id removes duplicates a storage query may return (a film
/// matching two requested genres, say) before the combiner sees them.
#[derive(Debug, Clone)]
pub struct PartialMatch {
    pub kind: ClauseKind,
    pub films: HashMap<FilmId, FilmSummary>,
}

impl PartialMatch {
    pub fn new(kind: ClauseKind, films: Vec<FilmSummary>) -> Self {
        let films = films.into_iter().map(|film| (film.id, film)).collect();
        Self { kind, films }
    }

    pub fn empty(kind: ClauseKind) -> Self {
        Self {
            kind,
            films: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.films.len()
    }

    pub fn is_empty(&self) -> bool {
        self.films.is_empty()
    }

    pub fn contains(&self, id: FilmId) -> bool {
        self.films.contains_key(&id)
    }
}

/// Core trait for search clauses.
///
/// ## Design Note
/// - `Send + Sync` lets the dispatcher run every clause of a request concurrently
/// - A clause only talks to the storage port, never to another clause
/// - "No rows" from storage means an empty match; the dispatcher handles that
#[async_trait]
pub trait Clause: Send + Sync {
    fn kind(&self) -> ClauseKind;

    /// Run this clause's query against the store
    async fn evaluate(&self, store: &dyn FilmStore) -> StorageResult<Vec<FilmSummary>>;
}
