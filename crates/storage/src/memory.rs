//! In-memory backend over a loaded [`CatalogIndex`].
//!
//! The catalog itself is read-only and shared through an `Arc`, so concurrent
//! searches need no locking. Favorites are the only mutable state and sit
//! behind a `tokio::sync::RwLock`.

use crate::port::{FavoriteStore, FilmStore, StorageError, StorageResult};
use async_trait::async_trait;
use catalog::{
    Actor, ActorId, ActorSummary, CatalogIndex, Film, FilmId, FilmSummary, RatingRollup, UserId,
};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Storage backend answering every query from a [`CatalogIndex`]
pub struct InMemoryStore {
    /// Shared reference to the catalog (read-only, so no Mutex needed)
    index: Arc<CatalogIndex>,
    favorite_films: RwLock<HashMap<UserId, BTreeSet<FilmId>>>,
    favorite_actors: RwLock<HashMap<UserId, BTreeSet<ActorId>>>,
}

impl InMemoryStore {
    pub fn new(index: Arc<CatalogIndex>) -> Self {
        Self {
            index,
            favorite_films: RwLock::new(HashMap::new()),
            favorite_actors: RwLock::new(HashMap::new()),
        }
    }

    pub fn index(&self) -> &Arc<CatalogIndex> {
        &self.index
    }

    /// Summaries for a set of ids, sorted by id, unknown ids skipped
    fn summaries<I>(&self, ids: I) -> Vec<FilmSummary>
    where
        I: IntoIterator<Item = FilmId>,
    {
        let ids: BTreeSet<FilmId> = ids.into_iter().collect();
        ids.into_iter()
            .filter_map(|id| self.index.get_film(id))
            .map(Film::summary)
            .collect()
    }
}

#[async_trait]
impl FilmStore for InMemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn list_films(&self) -> StorageResult<Vec<FilmSummary>> {
        Ok(self.summaries(self.index.all_film_ids()))
    }

    async fn find_by_title(&self, title: &str) -> StorageResult<Vec<FilmSummary>> {
        let needle = title.to_lowercase();
        let ids = self
            .index
            .films()
            .filter(|film| film.title.to_lowercase().contains(&needle))
            .map(|film| film.id);
        Ok(self.summaries(ids))
    }

    async fn find_by_release_date(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StorageResult<Vec<FilmSummary>> {
        Ok(self.summaries(self.index.films_released_between(from, to)))
    }

    async fn find_by_rating(
        &self,
        min: Option<f64>,
        max: Option<f64>,
    ) -> StorageResult<Vec<FilmSummary>> {
        let ids = self.index.films().map(|film| film.id).filter(|&id| {
            let stats = self.index.film_stats(id);
            stats.is_rated()
                && min.is_none_or(|min| stats.average >= min)
                && max.is_none_or(|max| stats.average <= max)
        });
        Ok(self.summaries(ids))
    }

    async fn find_by_content_rating(&self, mpaa: &str) -> StorageResult<Vec<FilmSummary>> {
        let ids = self
            .index
            .films()
            .filter(|film| film.mpaa == mpaa)
            .map(|film| film.id);
        Ok(self.summaries(ids))
    }

    async fn find_by_genres(&self, genres: &[String]) -> StorageResult<Vec<FilmSummary>> {
        let ids = genres
            .iter()
            .flat_map(|genre| self.index.films_by_genre(genre).iter().copied());
        Ok(self.summaries(ids))
    }

    async fn find_by_actors(&self, actors: &[String]) -> StorageResult<Vec<FilmSummary>> {
        let ids = actors
            .iter()
            .flat_map(|name| self.index.actors_named(name).iter().copied())
            .flat_map(|actor_id| self.index.actor_films(actor_id).iter().copied());
        Ok(self.summaries(ids))
    }

    async fn film(&self, id: FilmId) -> StorageResult<Film> {
        self.index.get_film(id).cloned().ok_or(StorageError::NoRows)
    }

    async fn film_genres(&self, id: FilmId) -> StorageResult<Vec<String>> {
        Ok(self.index.film_genres(id).to_vec())
    }

    async fn film_cast(&self, id: FilmId) -> StorageResult<Vec<ActorSummary>> {
        let cast = self
            .index
            .film_credits(id)
            .iter()
            .filter_map(|credit| {
                let actor = self.index.get_actor(credit.actor_id)?;
                Some(ActorSummary {
                    id: actor.id,
                    name: actor.name.clone(),
                    photo: actor.photo.clone(),
                    character: credit.character.clone(),
                })
            })
            .collect();
        Ok(cast)
    }

    async fn rating_rollup(&self, id: FilmId) -> StorageResult<RatingRollup> {
        let comments = self.index.film_comments(id);
        if comments.is_empty() {
            debug!(film_id = id, "no ratings stored for film");
            return Err(StorageError::NoRows);
        }
        Ok(RatingRollup {
            total: comments.iter().map(|c| c.rating).sum(),
            count: comments.len() as u64,
        })
    }

    async fn actor(&self, id: ActorId) -> StorageResult<Actor> {
        self.index.get_actor(id).cloned().ok_or(StorageError::NoRows)
    }

    async fn actor_films(&self, id: ActorId) -> StorageResult<Vec<FilmSummary>> {
        Ok(self.summaries(self.index.actor_films(id).iter().copied()))
    }
}

#[async_trait]
impl FavoriteStore for InMemoryStore {
    async fn favorite_films(&self, user: UserId) -> StorageResult<Vec<FilmSummary>> {
        let favorites = self.favorite_films.read().await;
        let ids = favorites.get(&user).into_iter().flatten().copied();
        Ok(self.summaries(ids))
    }

    async fn add_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()> {
        if self.index.get_film(film).is_none() {
            return Err(StorageError::NoRows);
        }
        self.favorite_films
            .write()
            .await
            .entry(user)
            .or_default()
            .insert(film);
        Ok(())
    }

    async fn remove_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()> {
        if let Some(films) = self.favorite_films.write().await.get_mut(&user) {
            films.remove(&film);
        }
        Ok(())
    }

    async fn favorite_actors(&self, user: UserId) -> StorageResult<Vec<Actor>> {
        let favorites = self.favorite_actors.read().await;
        let actors = favorites
            .get(&user)
            .into_iter()
            .flatten()
            .filter_map(|id| self.index.get_actor(*id).cloned())
            .collect();
        Ok(actors)
    }

    async fn add_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()> {
        if self.index.get_actor(actor).is_none() {
            return Err(StorageError::NoRows);
        }
        self.favorite_actors
            .write()
            .await
            .entry(user)
            .or_default()
            .insert(actor);
        Ok(())
    }

    async fn remove_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()> {
        if let Some(actors) = self.favorite_actors.write().await.get_mut(&user) {
            actors.remove(&actor);
        }
        Ok(())
    }
}
