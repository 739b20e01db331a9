//! Small catalog builder shared by the unit tests of this crate.

use catalog::{Actor, ActorId, CatalogIndex, Comment, Credit, Film, FilmId};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use storage::InMemoryStore;

#[derive(Default)]
pub(crate) struct TestCatalog {
    index: CatalogIndex,
    actors: HashMap<String, ActorId>,
    next_user: u64,
}

impl TestCatalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a film released on `release` (`YYYY-MM-DD`) with one comment per rating
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn film(
        mut self,
        id: FilmId,
        title: &str,
        release: &str,
        mpaa: &str,
        genres: &[&str],
        actors: &[&str],
        ratings: &[f64],
    ) -> Self {
        let release_date = NaiveDate::parse_from_str(release, "%Y-%m-%d").unwrap();
        self.index.insert_film(
            Film {
                id,
                title: title.to_string(),
                info: String::new(),
                poster: format!("/posters/{id}.jpg"),
                release_date,
                country: "USA".to_string(),
                mpaa: mpaa.to_string(),
            },
            genres.iter().map(|g| g.to_string()).collect(),
        );

        for name in actors {
            let next_id = self.actors.len() as ActorId + 1;
            let actor_id = *self.actors.entry(name.to_string()).or_insert(next_id);
            if actor_id == next_id {
                self.index.insert_actor(Actor {
                    id: actor_id,
                    name: name.to_string(),
                    birth_date: None,
                    country: String::new(),
                    photo: String::new(),
                    info: String::new(),
                });
            }
            self.index.insert_credit(
                id,
                Credit {
                    actor_id,
                    character: String::new(),
                },
            );
        }

        for &rating in ratings {
            self.next_user += 1;
            self.index.insert_comment(Comment {
                user_id: self.next_user,
                film_id: id,
                rating,
                text: String::new(),
            });
        }
        self
    }

    pub(crate) fn build(mut self) -> Arc<InMemoryStore> {
        self.index.validate().unwrap();
        self.index.build_secondary_indices();
        self.index.compute_film_stats();
        Arc::new(InMemoryStore::new(Arc::new(self.index)))
    }
}

/// Three films: A (Drama, 8.0), B (Comedy, 5.0), C (Action, 9.0)
pub(crate) fn abc_store() -> Arc<InMemoryStore> {
    TestCatalog::new()
        .film(1, "A", "2001-01-01", "PG", &["Drama"], &["Ann"], &[8.0])
        .film(2, "B", "2002-01-01", "PG", &["Comedy"], &["Bob"], &[5.0])
        .film(3, "C", "2003-01-01", "R", &["Action"], &["Ann"], &[9.0])
        .build()
}

pub(crate) fn ids(films: &[catalog::FilmSummary]) -> Vec<FilmId> {
    films.iter().map(|film| film.id).collect()
}
