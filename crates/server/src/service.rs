//! # Catalog Service
//!
//! Coordinates the storage port and the search core for each endpoint:
//! - film and actor detail pages (point lookup, then related queries in parallel)
//! - the release calendar for the current month
//! - per-user favorites
//!
//! Searching itself is delegated to [`FilmSearch`].

use std::sync::Arc;
use std::time::Instant;

use catalog::{Actor, ActorId, ActorSummary, Film, FilmId, FilmSummary, RatingSummary, UserId};
use chrono::{Datelike, Local, NaiveDate};
use search::{
    FilmSearch, SearchError, aggregate_rating, empty_on_no_rows, not_found_on_no_rows, order_films,
};
use serde::Serialize;
use storage::{FavoriteStore, FilmStore};
use tracing::{debug, info, instrument};

type Result<T> = std::result::Result<T, SearchError>;

/// Everything the film page shows
#[derive(Debug, Clone, Serialize)]
pub struct FilmDetails {
    pub film: Film,
    pub genres: Vec<String>,
    pub rating: RatingSummary,
    pub cast: Vec<ActorSummary>,
}

/// An actor and their filmography, newest first
#[derive(Debug, Clone, Serialize)]
pub struct ActorDetails {
    pub actor: Actor,
    pub films: Vec<FilmSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub films: Vec<FilmSummary>,
}

/// Releases of one month grouped by day of month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Calendar {
    pub year: i32,
    pub month: u32,
    pub today: u32,
    pub days: Vec<CalendarDay>,
}

/// Shared service behind every route
#[derive(Clone)]
pub struct CatalogService {
    films: Arc<dyn FilmStore>,
    favorites: Arc<dyn FavoriteStore>,
    search: FilmSearch,
}

impl CatalogService {
    pub fn new(films: Arc<dyn FilmStore>, favorites: Arc<dyn FavoriteStore>) -> Self {
        let search = FilmSearch::new(films.clone());
        Self {
            films,
            favorites,
            search,
        }
    }

    pub fn search(&self) -> &FilmSearch {
        &self.search
    }

    pub fn store(&self) -> &Arc<dyn FilmStore> {
        &self.films
    }

    /// Film page: the film itself, then genres, cast and rating concurrently
    #[instrument(skip(self))]
    pub async fn film_details(&self, film_id: FilmId) -> Result<FilmDetails> {
        let start = Instant::now();

        let film = self
            .films
            .film(film_id)
            .await
            .map_err(not_found_on_no_rows("film", film_id))?;

        let store = self.films.as_ref();
        let (genres, cast, rating) = tokio::join!(
            async { empty_on_no_rows(store.film_genres(film_id).await) },
            async { empty_on_no_rows(store.film_cast(film_id).await) },
            aggregate_rating(store, film_id),
        );

        let details = FilmDetails {
            film,
            genres: genres?,
            cast: cast?,
            rating: rating?,
        };
        debug!(
            cast = details.cast.len(),
            ratings = details.rating.count,
            elapsed = ?start.elapsed(),
            "film details assembled"
        );
        Ok(details)
    }

    #[instrument(skip(self))]
    pub async fn actor_details(&self, actor_id: ActorId) -> Result<ActorDetails> {
        let actor = self
            .films
            .actor(actor_id)
            .await
            .map_err(not_found_on_no_rows("actor", actor_id))?;
        let films = order_films(empty_on_no_rows(self.films.actor_films(actor_id).await)?);
        Ok(ActorDetails { actor, films })
    }

    /// Releases of the current month
    pub async fn calendar(&self) -> Result<Calendar> {
        self.calendar_for(Local::now().date_naive()).await
    }

    /// Releases of the month containing `today`, one entry per day with releases
    #[instrument(skip(self))]
    pub async fn calendar_for(&self, today: NaiveDate) -> Result<Calendar> {
        let (first, last) = month_bounds(today)?;
        let mut films =
            empty_on_no_rows(self.films.find_by_release_date(Some(first), Some(last)).await)?;
        films.sort_by(|a, b| a.release_date.cmp(&b.release_date).then_with(|| a.id.cmp(&b.id)));

        let mut days: Vec<CalendarDay> = Vec::new();
        for film in films {
            let day = film.release_date.day();
            match days.last_mut() {
                Some(entry) if entry.day == day => entry.films.push(film),
                _ => days.push(CalendarDay {
                    day,
                    films: vec![film],
                }),
            }
        }

        info!(year = today.year(), month = today.month(), days = days.len(), "calendar built");
        Ok(Calendar {
            year: today.year(),
            month: today.month(),
            today: today.day(),
            days,
        })
    }

    pub async fn favorite_films(&self, user: UserId) -> Result<Vec<FilmSummary>> {
        Ok(empty_on_no_rows(self.favorites.favorite_films(user).await)?)
    }

    #[instrument(skip(self))]
    pub async fn add_favorite_film(&self, user: UserId, film_id: FilmId) -> Result<()> {
        self.favorites
            .add_favorite_film(user, film_id)
            .await
            .map_err(not_found_on_no_rows("film", film_id))
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite_film(&self, user: UserId, film_id: FilmId) -> Result<()> {
        Ok(self.favorites.remove_favorite_film(user, film_id).await?)
    }

    pub async fn favorite_actors(&self, user: UserId) -> Result<Vec<Actor>> {
        Ok(empty_on_no_rows(self.favorites.favorite_actors(user).await)?)
    }

    #[instrument(skip(self))]
    pub async fn add_favorite_actor(&self, user: UserId, actor_id: ActorId) -> Result<()> {
        self.favorites
            .add_favorite_actor(user, actor_id)
            .await
            .map_err(not_found_on_no_rows("actor", actor_id))
    }

    #[instrument(skip(self))]
    pub async fn remove_favorite_actor(&self, user: UserId, actor_id: ActorId) -> Result<()> {
        Ok(self.favorites.remove_favorite_actor(user, actor_id).await?)
    }
}

/// First and last day of the month containing `date`
fn month_bounds(date: NaiveDate) -> Result<(NaiveDate, NaiveDate)> {
    let first = date
        .with_day(1)
        .ok_or_else(|| SearchError::Internal(format!("no first day for {date}")))?;
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    let last = next_month
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| SearchError::Internal(format!("no last day for {date}")))?;
    Ok((first, last))
}
