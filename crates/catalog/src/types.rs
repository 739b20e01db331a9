//! Core domain types for the film catalog.
//!
//! Films, actors, user comments with their ratings, and the in-memory
//! [`CatalogIndex`] that ties them together with secondary indices.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a film
pub type FilmId = u64;

/// Unique identifier for an actor (a crew member appearing in a cast)
pub type ActorId = u64;

/// Unique identifier for a user of the service
pub type UserId = u64;

/// Upper end of the rating scale used by user comments (ratings are 0..=10)
pub const RATING_SCALE_MAX: f64 = 10.0;

// =============================================================================
// Film-related Types
// =============================================================================

/// A film as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Film {
    pub id: FilmId,
    pub title: String,
    /// Synopsis shown on the film page
    pub info: String,
    /// Poster reference (path or URL)
    pub poster: String,
    pub release_date: NaiveDate,
    pub country: String,
    /// MPAA-style content rating code ("G", "PG-13", "R", ...)
    pub mpaa: String,
}

impl Film {
    /// The short form returned by every set query
    pub fn summary(&self) -> FilmSummary {
        FilmSummary {
            id: self.id,
            title: self.title.clone(),
            poster: self.poster.clone(),
            release_date: self.release_date,
        }
    }
}

/// Short film representation used in listings and search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmSummary {
    pub id: FilmId,
    pub title: String,
    pub poster: String,
    pub release_date: NaiveDate,
}

// =============================================================================
// Actor-related Types
// =============================================================================

/// A person appearing in the cast of one or more films
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    pub birth_date: Option<NaiveDate>,
    pub country: String,
    pub photo: String,
    pub info: String,
}

/// One actor's appearance in one film
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub actor_id: ActorId,
    /// Name of the character played, empty when unknown
    pub character: String,
}

/// Cast listing entry returned with film details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorSummary {
    pub id: ActorId,
    pub name: String,
    pub photo: String,
    pub character: String,
}

// =============================================================================
// Rating Types
// =============================================================================

/// A user comment on a film, carrying that user's rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user_id: UserId,
    pub film_id: FilmId,
    /// Rating value from 0.0 to [`RATING_SCALE_MAX`]
    pub rating: f64,
    pub text: String,
}

/// Storage-side aggregate of a film's ratings: their sum and how many there are
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingRollup {
    pub total: f64,
    pub count: u64,
}

/// Mean rating of a film and the number of ratings it was computed from.
///
/// A film that was never rated has `count == 0` and `average == 0.0`. The
/// zero count is checked before dividing, so "never rated" stays
/// distinguishable from "rated zero" through `count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u64,
}

impl RatingSummary {
    /// Summary of a film with no ratings
    pub const UNRATED: RatingSummary = RatingSummary {
        average: 0.0,
        count: 0,
    };

    /// Summarize raw per-user ratings. Only existing ratings are averaged.
    pub fn from_ratings(ratings: &[f64]) -> Self {
        Self::from_rollup(RatingRollup {
            total: ratings.iter().sum(),
            count: ratings.len() as u64,
        })
    }

    /// Summarize a storage-side rollup
    pub fn from_rollup(rollup: RatingRollup) -> Self {
        if rollup.count == 0 {
            return Self::UNRATED;
        }
        let average = rollup.total / rollup.count as f64;
        Self {
            average: average.clamp(0.0, RATING_SCALE_MAX),
            count: rollup.count,
        }
    }

    /// True when at least one rating contributed to the average
    pub fn is_rated(&self) -> bool {
        self.count > 0
    }
}

// =============================================================================
// CatalogIndex - The In-Memory Catalog
// =============================================================================

/// Holds the whole catalog plus the secondary indices used by set queries.
///
/// Primary stores are keyed by id. Secondary indices map a genre name, an actor
/// name or a release date to the films that match it, so every single-predicate
/// lookup is a map access instead of a scan.
#[derive(Debug, Default)]
pub struct CatalogIndex {
    // Primary data stores
    pub(crate) films: HashMap<FilmId, Film>,
    pub(crate) actors: HashMap<ActorId, Actor>,

    /// Genre names attached to each film, in file order
    pub(crate) film_genres: HashMap<FilmId, Vec<String>>,
    /// Cast of each film
    pub(crate) credits: HashMap<FilmId, Vec<Credit>>,
    /// Comments (and their ratings) left on each film
    pub(crate) film_comments: HashMap<FilmId, Vec<Comment>>,

    // Secondary indices
    pub(crate) genre_index: HashMap<String, Vec<FilmId>>,
    pub(crate) actor_films: HashMap<ActorId, Vec<FilmId>>,
    pub(crate) actor_name_index: HashMap<String, Vec<ActorId>>,
    pub(crate) release_index: BTreeMap<NaiveDate, Vec<FilmId>>,

    // Precomputed statistics
    pub(crate) film_stats: HashMap<FilmId, RatingSummary>,
}

impl CatalogIndex {
    /// Creates a new, empty CatalogIndex
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_film(&self, id: FilmId) -> Option<&Film> {
        self.films.get(&id)
    }

    pub fn get_actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// Genre names of a film, empty if the film has none or doesn't exist
    pub fn film_genres(&self, film_id: FilmId) -> &[String] {
        self.film_genres
            .get(&film_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn film_credits(&self, film_id: FilmId) -> &[Credit] {
        self.credits
            .get(&film_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn film_comments(&self, film_id: FilmId) -> &[Comment] {
        self.film_comments
            .get(&film_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Films tagged with a genre (exact name match)
    pub fn films_by_genre(&self, genre: &str) -> &[FilmId] {
        self.genre_index
            .get(genre)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Actors carrying exactly this name
    pub fn actors_named(&self, name: &str) -> &[ActorId] {
        self.actor_name_index
            .get(name)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Films an actor appears in
    pub fn actor_films(&self, actor_id: ActorId) -> &[FilmId] {
        self.actor_films
            .get(&actor_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Films released within `[from, to]`, either side open when `None`
    pub fn films_released_between(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Vec<FilmId> {
        let lower = from.unwrap_or(NaiveDate::MIN);
        let upper = to.unwrap_or(NaiveDate::MAX);
        // BTreeMap::range panics on an inverted range
        if lower > upper {
            return Vec::new();
        }
        self.release_index
            .range(lower..=upper)
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect()
    }

    /// Rating summary for a film, [`RatingSummary::UNRATED`] if nobody rated it
    pub fn film_stats(&self, film_id: FilmId) -> RatingSummary {
        self.film_stats
            .get(&film_id)
            .copied()
            .unwrap_or(RatingSummary::UNRATED)
    }

    pub fn all_film_ids(&self) -> Vec<FilmId> {
        self.films.keys().copied().collect()
    }

    pub fn films(&self) -> impl Iterator<Item = &Film> {
        self.films.values()
    }

    pub fn genre_names(&self) -> Vec<&str> {
        self.genre_index.keys().map(|g| g.as_str()).collect()
    }

    pub fn actor_names(&self) -> Vec<&str> {
        self.actor_name_index.keys().map(|n| n.as_str()).collect()
    }

    // Mutators used during loading. Secondary indices and stats are rebuilt
    // afterwards by `build_secondary_indices` and `compute_film_stats`.

    /// Insert a film together with its genre names
    pub fn insert_film(&mut self, film: Film, genres: Vec<String>) {
        self.film_genres.insert(film.id, genres);
        self.films.insert(film.id, film);
    }

    pub fn insert_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id, actor);
    }

    pub fn insert_credit(&mut self, film_id: FilmId, credit: Credit) {
        self.credits.entry(film_id).or_default().push(credit);
    }

    pub fn insert_comment(&mut self, comment: Comment) {
        self.film_comments
            .entry(comment.film_id)
            .or_default()
            .push(comment);
    }

    /// Get counts for debugging/validation: (films, actors, comments)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_comments = self.film_comments.values().map(|v| v.len()).sum();
        (self.films.len(), self.actors.len(), total_comments)
    }
}
