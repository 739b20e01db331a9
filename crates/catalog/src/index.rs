//! CatalogIndex building and indexing logic.
//!
//! Loads the four catalog files, fills the primary stores, then builds the
//! secondary indices (genre, actor name, release date) and the per-film rating
//! statistics used by rating-range queries.

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

impl CatalogIndex {
    /// Load a catalog from a directory containing films.dat, actors.dat,
    /// cast.dat and comments.dat
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading film catalog from {:?}", data_dir);

        let films_path = data_dir.join("films.dat");
        let actors_path = data_dir.join("actors.dat");
        let cast_path = data_dir.join("cast.dat");
        let comments_path = data_dir.join("comments.dat");

        // Parse the four files in parallel
        let ((films, actors), (cast, comments)) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_films(&films_path),
                    || parser::parse_actors(&actors_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_cast(&cast_path),
                    || parser::parse_comments(&comments_path),
                )
            },
        );

        let films = films?;
        let actors = actors?;
        let cast = cast?;
        let comments = comments?;

        info!(
            "Parsed {} films, {} actors, {} credits, {} comments",
            films.len(),
            actors.len(),
            cast.len(),
            comments.len()
        );

        let mut index = CatalogIndex::new();

        for record in films {
            index.insert_film(record.film, record.genres);
        }
        for actor in actors {
            index.insert_actor(actor);
        }
        for record in cast {
            index.insert_credit(record.film_id, record.credit);
        }
        for comment in comments {
            index.insert_comment(comment);
        }

        index.validate()?;
        index.build_secondary_indices();
        index.compute_film_stats();

        info!("Catalog index built and validated");
        Ok(index)
    }

    /// Build secondary indices after primary data is loaded.
    ///
    /// Index vectors are sorted so lookups return ids in a stable order.
    pub fn build_secondary_indices(&mut self) {
        self.genre_index.clear();
        self.release_index.clear();
        self.actor_films.clear();
        self.actor_name_index.clear();

        for (film_id, genres) in &self.film_genres {
            for genre in genres {
                self.genre_index
                    .entry(genre.clone())
                    .or_default()
                    .push(*film_id);
            }
        }

        for (film_id, film) in &self.films {
            self.release_index
                .entry(film.release_date)
                .or_default()
                .push(*film_id);
        }

        for (film_id, credits) in &self.credits {
            for credit in credits {
                self.actor_films
                    .entry(credit.actor_id)
                    .or_default()
                    .push(*film_id);
            }
        }

        for (actor_id, actor) in &self.actors {
            self.actor_name_index
                .entry(actor.name.clone())
                .or_default()
                .push(*actor_id);
        }

        for ids in self
            .genre_index
            .values_mut()
            .chain(self.release_index.values_mut())
            .chain(self.actor_films.values_mut())
            .chain(self.actor_name_index.values_mut())
        {
            ids.sort_unstable();
            ids.dedup();
        }
    }

    /// Compute the rating summary of every commented film
    pub fn compute_film_stats(&mut self) {
        self.film_stats = self
            .film_comments
            .par_iter()
            .map(|(&film_id, comments)| {
                let ratings: Vec<f64> = comments.iter().map(|c| c.rating).collect();
                (film_id, RatingSummary::from_ratings(&ratings))
            })
            .collect();
    }

    /// Validate data integrity
    ///
    /// Checks that every credit and comment points at an existing film (and
    /// actor), and that ratings sit on the 0..=10 scale.
    pub fn validate(&self) -> Result<()> {
        for (film_id, credits) in &self.credits {
            if !self.films.contains_key(film_id) {
                return Err(CatalogError::MissingReference {
                    entity: "Film".to_string(),
                    id: *film_id,
                });
            }
            for credit in credits {
                if !self.actors.contains_key(&credit.actor_id) {
                    return Err(CatalogError::MissingReference {
                        entity: "Actor".to_string(),
                        id: credit.actor_id,
                    });
                }
            }
        }

        for (film_id, comments) in &self.film_comments {
            if !self.films.contains_key(film_id) {
                return Err(CatalogError::MissingReference {
                    entity: "Film".to_string(),
                    id: *film_id,
                });
            }
            for comment in comments {
                if !(0.0..=RATING_SCALE_MAX).contains(&comment.rating) {
                    return Err(CatalogError::InvalidValue {
                        field: "rating".to_string(),
                        value: comment.rating.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
