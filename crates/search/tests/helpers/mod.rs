//! Shared fixtures for search integration tests.
//!
//! [`FixtureFilm`] describes a film together with everything a clause can
//! match on, so tests can build a store from it and also evaluate the same
//! criteria by brute force. [`ProbeStore`] wraps a real store, counts calls
//! and can inject failures, empty answers or delays.

#![allow(dead_code)]

use async_trait::async_trait;
use catalog::{
    Actor, ActorId, ActorSummary, CatalogIndex, Comment, Credit, Film, FilmId, FilmSummary,
    RatingRollup,
};
use chrono::NaiveDate;
use search::SearchCriteria;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use storage::{FilmStore, InMemoryStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub struct FixtureFilm {
    pub id: FilmId,
    pub title: String,
    pub release: NaiveDate,
    pub mpaa: String,
    pub genres: Vec<String>,
    pub actors: Vec<String>,
    pub ratings: Vec<f64>,
}

impl FixtureFilm {
    pub fn new(id: FilmId, title: &str, release: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            release: NaiveDate::parse_from_str(release, "%Y-%m-%d").unwrap(),
            mpaa: "PG".to_string(),
            genres: Vec::new(),
            actors: Vec::new(),
            ratings: Vec::new(),
        }
    }

    pub fn mpaa(mut self, mpaa: &str) -> Self {
        self.mpaa = mpaa.to_string();
        self
    }

    pub fn genres(mut self, genres: &[&str]) -> Self {
        self.genres = genres.iter().map(|g| g.to_string()).collect();
        self
    }

    pub fn actors(mut self, actors: &[&str]) -> Self {
        self.actors = actors.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn ratings(mut self, ratings: &[f64]) -> Self {
        self.ratings = ratings.to_vec();
        self
    }

    fn average(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        Some(self.ratings.iter().sum::<f64>() / self.ratings.len() as f64)
    }

    /// Reference evaluation of every populated clause against this film
    pub fn matches(&self, criteria: &SearchCriteria) -> bool {
        if let Some(title) = &criteria.title {
            if !self.title.to_lowercase().contains(&title.to_lowercase()) {
                return false;
            }
        }
        if criteria.release.from.is_some_and(|from| self.release < from)
            || criteria.release.to.is_some_and(|to| self.release > to)
        {
            return false;
        }
        if criteria.rating.is_set() {
            let Some(average) = self.average() else {
                return false;
            };
            if criteria.rating.min.is_some_and(|min| average < min)
                || criteria.rating.max.is_some_and(|max| average > max)
            {
                return false;
            }
        }
        if criteria
            .content_rating
            .as_ref()
            .is_some_and(|mpaa| *mpaa != self.mpaa)
        {
            return false;
        }
        if !criteria.genres.is_empty() && !self.genres.iter().any(|g| criteria.genres.contains(g)) {
            return false;
        }
        if !criteria.actors.is_empty() && !self.actors.iter().any(|a| criteria.actors.contains(a)) {
            return false;
        }
        true
    }
}

/// Ids of the films matching `criteria`, newest first then by id
pub fn brute_force(films: &[FixtureFilm], criteria: &SearchCriteria) -> Vec<FilmId> {
    let mut matching: Vec<&FixtureFilm> = films.iter().filter(|f| f.matches(criteria)).collect();
    matching.sort_by(|a, b| b.release.cmp(&a.release).then_with(|| a.id.cmp(&b.id)));
    matching.into_iter().map(|f| f.id).collect()
}

pub fn build_store(films: &[FixtureFilm]) -> Arc<InMemoryStore> {
    let mut index = CatalogIndex::new();
    let mut actor_ids: HashMap<String, ActorId> = HashMap::new();
    let mut next_user = 0;

    for fixture in films {
        index.insert_film(
            Film {
                id: fixture.id,
                title: fixture.title.clone(),
                info: String::new(),
                poster: String::new(),
                release_date: fixture.release,
                country: String::new(),
                mpaa: fixture.mpaa.clone(),
            },
            fixture.genres.clone(),
        );

        for name in &fixture.actors {
            let actor_id = match actor_ids.get(name) {
                Some(&id) => id,
                None => {
                    let id = actor_ids.len() as ActorId + 1;
                    actor_ids.insert(name.clone(), id);
                    index.insert_actor(Actor {
                        id,
                        name: name.clone(),
                        birth_date: None,
                        country: String::new(),
                        photo: String::new(),
                        info: String::new(),
                    });
                    id
                }
            };
            index.insert_credit(
                fixture.id,
                Credit {
                    actor_id,
                    character: String::new(),
                },
            );
        }

        for &rating in &fixture.ratings {
            next_user += 1;
            index.insert_comment(Comment {
                user_id: next_user,
                film_id: fixture.id,
                rating,
                text: String::new(),
            });
        }
    }

    index.validate().unwrap();
    index.build_secondary_indices();
    index.compute_film_stats();
    Arc::new(InMemoryStore::new(Arc::new(index)))
}

/// A(Drama, 8.0), B(Comedy, 5.0), C(Action, 9.0)
pub fn abc_films() -> Vec<FixtureFilm> {
    vec![
        FixtureFilm::new(1, "A", "2001-05-01").genres(&["Drama"]).ratings(&[8.0]),
        FixtureFilm::new(2, "B", "2002-05-01").genres(&["Comedy"]).ratings(&[5.0]),
        FixtureFilm::new(3, "C", "2003-05-01").genres(&["Action"]).ratings(&[9.0]),
    ]
}

pub fn ids(films: &[FilmSummary]) -> Vec<FilmId> {
    films.iter().map(|f| f.id).collect()
}

/// Store wrapper that records every call and can misbehave on demand
pub struct ProbeStore {
    inner: Arc<InMemoryStore>,
    calls: AtomicUsize,
    failing: Mutex<Option<&'static str>>,
    no_rows: Mutex<Option<&'static str>>,
    delay: Mutex<Option<Duration>>,
    slow_op: Mutex<Option<(&'static str, Duration)>>,
}

impl ProbeStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            failing: Mutex::new(None),
            no_rows: Mutex::new(None),
            delay: Mutex::new(None),
            slow_op: Mutex::new(None),
        }
    }

    /// Make the named operation fail with `StorageError::Unavailable`
    pub fn fail_on(self, operation: &'static str) -> Self {
        *self.failing.lock().unwrap() = Some(operation);
        self
    }

    /// Make the named operation answer `StorageError::NoRows`
    pub fn no_rows_on(self, operation: &'static str) -> Self {
        *self.no_rows.lock().unwrap() = Some(operation);
        self
    }

    /// Delay every call by `delay`
    pub fn slow(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    /// Delay only the named operation
    pub fn slow_on(self, operation: &'static str, delay: Duration) -> Self {
        *self.slow_op.lock().unwrap() = Some((operation, delay));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self, operation: &'static str) -> StorageResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        let slow_op = *self.slow_op.lock().unwrap();
        let delay = match slow_op {
            Some((slow, op_delay)) if slow == operation => Some(op_delay),
            _ => delay,
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failing = *self.failing.lock().unwrap();
        if failing == Some(operation) {
            return Err(StorageError::Unavailable(format!("{operation} injected failure")));
        }
        let no_rows = *self.no_rows.lock().unwrap();
        if no_rows == Some(operation) {
            return Err(StorageError::NoRows);
        }
        Ok(())
    }
}

#[async_trait]
impl FilmStore for ProbeStore {
    fn backend(&self) -> &'static str {
        "probe"
    }

    async fn ping(&self) -> StorageResult<()> {
        self.enter("ping").await?;
        self.inner.ping().await
    }

    async fn list_films(&self) -> StorageResult<Vec<FilmSummary>> {
        self.enter("list_films").await?;
        self.inner.list_films().await
    }

    async fn find_by_title(&self, title: &str) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_title").await?;
        self.inner.find_by_title(title).await
    }

    async fn find_by_release_date(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_release_date").await?;
        self.inner.find_by_release_date(from, to).await
    }

    async fn find_by_rating(
        &self,
        min: Option<f64>,
        max: Option<f64>,
    ) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_rating").await?;
        self.inner.find_by_rating(min, max).await
    }

    async fn find_by_content_rating(&self, mpaa: &str) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_content_rating").await?;
        self.inner.find_by_content_rating(mpaa).await
    }

    async fn find_by_genres(&self, genres: &[String]) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_genres").await?;
        self.inner.find_by_genres(genres).await
    }

    async fn find_by_actors(&self, actors: &[String]) -> StorageResult<Vec<FilmSummary>> {
        self.enter("find_by_actors").await?;
        self.inner.find_by_actors(actors).await
    }

    async fn film(&self, id: FilmId) -> StorageResult<Film> {
        self.enter("film").await?;
        self.inner.film(id).await
    }

    async fn film_genres(&self, id: FilmId) -> StorageResult<Vec<String>> {
        self.enter("film_genres").await?;
        self.inner.film_genres(id).await
    }

    async fn film_cast(&self, id: FilmId) -> StorageResult<Vec<ActorSummary>> {
        self.enter("film_cast").await?;
        self.inner.film_cast(id).await
    }

    async fn rating_rollup(&self, id: FilmId) -> StorageResult<RatingRollup> {
        self.enter("rating_rollup").await?;
        self.inner.rating_rollup(id).await
    }

    async fn actor(&self, id: ActorId) -> StorageResult<Actor> {
        self.enter("actor").await?;
        self.inner.actor(id).await
    }

    async fn actor_films(&self, id: ActorId) -> StorageResult<Vec<FilmSummary>> {
        self.enter("actor_films").await?;
        self.inner.actor_films(id).await
    }
}
