//! # Catalog Crate
//!
//! Domain types of the film catalog and an in-memory, indexed copy of it.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Film, Actor, Comment, RatingSummary, CatalogIndex)
//! - **parser**: Parse `.dat` catalog files into Rust structs
//! - **index**: Build secondary indices and rating statistics
//! - **error**: Error types for catalog loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use catalog::CatalogIndex;
//! use std::path::Path;
//!
//! let index = CatalogIndex::load_from_files(Path::new("data/catalog"))?;
//!
//! let film = index.get_film(1).unwrap();
//! let rating = index.film_stats(1);
//! println!("{} rated {:.1} by {} users", film.title, rating.average, rating.count);
//! ```

pub mod error;
pub mod index;
pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{CatalogError, Result};
pub use types::{
    // Type aliases
    ActorId,
    FilmId,
    UserId,
    // Core types
    Actor,
    ActorSummary,
    CatalogIndex,
    Comment,
    Credit,
    Film,
    FilmSummary,
    RatingRollup,
    RatingSummary,
    // Constants
    RATING_SCALE_MAX,
};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_catalog_index_creation() {
        let index = CatalogIndex::new();
        let (films, actors, comments) = index.counts();

        assert_eq!(films, 0);
        assert_eq!(actors, 0);
        assert_eq!(comments, 0);
    }

    #[test]
    fn test_insert_film() {
        let mut index = CatalogIndex::new();

        let film = Film {
            id: 1,
            title: "The Matrix".to_string(),
            info: "A hacker learns the truth.".to_string(),
            poster: "/posters/matrix.jpg".to_string(),
            release_date: NaiveDate::from_ymd_opt(1999, 3, 31).unwrap(),
            country: "USA".to_string(),
            mpaa: "R".to_string(),
        };

        index.insert_film(film.clone(), vec!["Action".to_string(), "Sci-Fi".to_string()]);

        let retrieved = index.get_film(1).unwrap();
        assert_eq!(retrieved, &film);
        assert_eq!(index.film_genres(1).len(), 2);
        assert_eq!(retrieved.summary().title, "The Matrix");
    }

    #[test]
    fn test_rating_summary_guards_zero_count() {
        assert_eq!(RatingSummary::from_ratings(&[]), RatingSummary::UNRATED);
        assert_eq!(
            RatingSummary::from_rollup(RatingRollup { total: 0.0, count: 0 }),
            RatingSummary { average: 0.0, count: 0 }
        );
        assert!(!RatingSummary::UNRATED.is_rated());

        let rated_zero = RatingSummary::from_ratings(&[0.0]);
        assert_eq!(rated_zero.average, 0.0);
        assert!(rated_zero.is_rated());
    }

    #[test]
    fn test_rating_summary_mean() {
        let summary = RatingSummary::from_ratings(&[8.0, 9.0, 10.0]);
        assert_eq!(summary.count, 3);
        assert!((summary.average - 9.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_queries() {
        let index = CatalogIndex::new();

        assert!(index.get_film(999).is_none());
        assert!(index.get_actor(999).is_none());
        assert!(index.film_genres(999).is_empty());
        assert!(index.film_comments(999).is_empty());
        assert!(index.films_by_genre("Drama").is_empty());
        assert!(index.actors_named("Keanu Reeves").is_empty());
        assert_eq!(index.film_stats(999), RatingSummary::UNRATED);
    }
}
