//! Intersection of partial matches and result ordering.
//!
//! ## Algorithm
//! 1. Pick the smallest partial match as the pivot
//! 2. Keep each pivot film present in every other partial match, probing
//!    the smaller sets first
//! 3. Order by release date, newest first, ties broken by ascending id
//!
//! Cost is O(|pivot| * clauses) hash lookups, independent of the size of the
//! larger sets.

use crate::dispatcher::Dispatched;
use crate::traits::PartialMatch;
use catalog::FilmSummary;
use tracing::debug;

/// Turn a dispatch outcome into the ordered search result
pub fn combine(dispatched: Dispatched) -> Vec<FilmSummary> {
    let films = match dispatched {
        Dispatched::Browse(all) => all.films.into_values().collect(),
        Dispatched::Clauses(partials) => intersect(partials),
    };
    order_films(films)
}

/// Films present in every partial match, unordered.
///
/// No partial matches means no constraint was evaluated, so nothing is
/// returned; browsing is the dispatcher's job.
pub fn intersect(mut partials: Vec<PartialMatch>) -> Vec<FilmSummary> {
    if partials.is_empty() {
        return Vec::new();
    }

    partials.sort_by_key(PartialMatch::len);
    let pivot = partials.remove(0);
    debug!(
        pivot = %pivot.kind,
        pivot_size = pivot.len(),
        others = partials.len(),
        "intersecting partial matches"
    );

    if pivot.is_empty() {
        return Vec::new();
    }

    pivot
        .films
        .into_values()
        .filter(|film| partials.iter().all(|other| other.contains(film.id)))
        .collect()
}

/// Newest release first, then ascending id
pub fn order_films(mut films: Vec<FilmSummary>) -> Vec<FilmSummary> {
    films.sort_by(|a, b| {
        b.release_date
            .cmp(&a.release_date)
            .then_with(|| a.id.cmp(&b.id))
    });
    films
}
