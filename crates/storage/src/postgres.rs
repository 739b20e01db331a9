//! Postgres backend.
//!
//! Expects the catalog schema:
//!
//! ```text
//! film(id, title, info, poster, release_date, country, mpaa)
//! genre(id, title)            films_genre(id_film, id_genre)
//! crew(id, name, birth_date, country, photo, info)
//! person_in_film(id_film, id_person, character_name)
//! users_comment(id_user, id_film, rating, comment)
//! users_favorite_film(id_user, id_film)    -- unique (id_user, id_film)
//! users_favorite_actor(id_user, id_actor)  -- unique (id_user, id_actor)
//! ```

use crate::port::{FavoriteStore, FilmStore, StorageError, StorageResult};
use async_trait::async_trait;
use catalog::{
    Actor, ActorId, ActorSummary, Film, FilmId, FilmSummary, RatingRollup, UserId,
};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgSslMode};
use std::str::FromStr;
use tracing::{info, instrument};

/// Default maximum number of pooled connections
pub const DEFAULT_MAX_OPEN_CONNS: u32 = 10;

/// Connection settings for [`PgStore`]
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// Full connection URL; when set it wins over the individual fields
    pub url: Option<String>,
    pub user: String,
    pub dbname: String,
    pub password: String,
    pub host: String,
    pub port: u16,
    pub sslmode: String,
    pub max_open_conns: u32,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: None,
            user: "postgres".to_string(),
            dbname: "films".to_string(),
            password: String::new(),
            host: "localhost".to_string(),
            port: 5432,
            sslmode: "disable".to_string(),
            max_open_conns: DEFAULT_MAX_OPEN_CONNS,
        }
    }
}

impl PostgresConfig {
    fn connect_options(&self) -> StorageResult<PgConnectOptions> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).map_err(query_error("parse database url"));
        }
        let ssl_mode = PgSslMode::from_str(&self.sslmode).map_err(query_error("parse sslmode"))?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.dbname)
            .ssl_mode(ssl_mode))
    }
}

/// Maps a sqlx error to a [`StorageError`], keeping "no rows" distinct
fn query_error(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StorageError {
    move |source| {
        if matches!(source, sqlx::Error::RowNotFound) {
            return StorageError::NoRows;
        }
        if matches!(source, sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed) {
            return StorageError::Unavailable(format!("{operation}: {source}"));
        }
        StorageError::Query { operation, source }
    }
}

/// Catalog ids are unsigned; the schema stores them as bigint
fn db_id(id: u64) -> StorageResult<i64> {
    i64::try_from(id).map_err(|_| StorageError::NoRows)
}

fn catalog_id(raw: i64) -> StorageResult<u64> {
    u64::try_from(raw).map_err(|_| StorageError::Internal(format!("negative id {raw}")))
}

/// Escapes LIKE wildcards so a title is matched literally
fn like_pattern(title: &str) -> String {
    let escaped = title
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[derive(sqlx::FromRow)]
struct FilmSummaryRow {
    id: i64,
    title: String,
    poster: String,
    release_date: NaiveDate,
}

impl TryFrom<FilmSummaryRow> for FilmSummary {
    type Error = StorageError;

    fn try_from(row: FilmSummaryRow) -> StorageResult<Self> {
        Ok(FilmSummary {
            id: catalog_id(row.id)?,
            title: row.title,
            poster: row.poster,
            release_date: row.release_date,
        })
    }
}

#[derive(sqlx::FromRow)]
struct FilmRow {
    id: i64,
    title: String,
    info: String,
    poster: String,
    release_date: NaiveDate,
    country: String,
    mpaa: String,
}

#[derive(sqlx::FromRow)]
struct ActorRow {
    id: i64,
    name: String,
    birth_date: Option<NaiveDate>,
    country: String,
    photo: String,
    info: String,
}

impl TryFrom<ActorRow> for Actor {
    type Error = StorageError;

    fn try_from(row: ActorRow) -> StorageResult<Self> {
        Ok(Actor {
            id: catalog_id(row.id)?,
            name: row.name,
            birth_date: row.birth_date,
            country: row.country,
            photo: row.photo,
            info: row.info,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CastRow {
    id: i64,
    name: String,
    photo: String,
    character_name: String,
}

fn summaries(rows: Vec<FilmSummaryRow>) -> StorageResult<Vec<FilmSummary>> {
    rows.into_iter().map(FilmSummary::try_from).collect()
}

const FILM_SUMMARY_COLUMNS: &str = "film.id, film.title, film.poster, film.release_date";

/// Storage backend over a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a pool and check it answers before handing it out
    pub async fn connect(config: &PostgresConfig) -> StorageResult<Self> {
        let options = config.connect_options()?;
        let pool = PgPoolOptions::new()
            .max_connections(config.max_open_conns)
            .connect_with(options)
            .await
            .map_err(query_error("connect"))?;

        let store = Self { pool };
        store.ping().await?;
        info!(
            host = %config.host,
            dbname = %config.dbname,
            max_open_conns = config.max_open_conns,
            "Connected to Postgres"
        );
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_summaries(
        &self,
        operation: &'static str,
        query: sqlx::query::QueryAs<'_, sqlx::Postgres, FilmSummaryRow, sqlx::postgres::PgArguments>,
    ) -> StorageResult<Vec<FilmSummary>> {
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(query_error(operation))?;
        summaries(rows)
    }

    async fn film_exists(&self, id: i64) -> StorageResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM film WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("film exists"))?;
        Ok(found.is_some())
    }

    async fn actor_exists(&self, id: i64) -> StorageResult<bool> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM crew WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error("actor exists"))?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl FilmStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(query_error("ping"))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_films(&self) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT {FILM_SUMMARY_COLUMNS} FROM film ORDER BY film.release_date DESC, film.id"
        );
        self.fetch_summaries("list films", sqlx::query_as(&sql)).await
    }

    #[instrument(skip(self))]
    async fn find_by_title(&self, title: &str) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!("SELECT {FILM_SUMMARY_COLUMNS} FROM film WHERE film.title ILIKE $1");
        self.fetch_summaries("find by title", sqlx::query_as(&sql).bind(like_pattern(title)))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_release_date(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT {FILM_SUMMARY_COLUMNS} FROM film \
             WHERE ($1::date IS NULL OR film.release_date >= $1) \
             AND ($2::date IS NULL OR film.release_date <= $2)"
        );
        self.fetch_summaries(
            "find by release date",
            sqlx::query_as(&sql).bind(from).bind(to),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn find_by_rating(
        &self,
        min: Option<f64>,
        max: Option<f64>,
    ) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT {FILM_SUMMARY_COLUMNS} FROM film \
             JOIN users_comment ON film.id = users_comment.id_film \
             GROUP BY film.id \
             HAVING ($1::float8 IS NULL OR AVG(users_comment.rating)::float8 >= $1) \
             AND ($2::float8 IS NULL OR AVG(users_comment.rating)::float8 <= $2)"
        );
        self.fetch_summaries("find by rating", sqlx::query_as(&sql).bind(min).bind(max))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_content_rating(&self, mpaa: &str) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!("SELECT {FILM_SUMMARY_COLUMNS} FROM film WHERE film.mpaa = $1");
        self.fetch_summaries("find by content rating", sqlx::query_as(&sql).bind(mpaa))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_genres(&self, genres: &[String]) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT DISTINCT {FILM_SUMMARY_COLUMNS} FROM film \
             JOIN films_genre ON film.id = films_genre.id_film \
             JOIN genre ON genre.id = films_genre.id_genre \
             WHERE genre.title = ANY($1)"
        );
        self.fetch_summaries("find by genres", sqlx::query_as(&sql).bind(genres))
            .await
    }

    #[instrument(skip(self))]
    async fn find_by_actors(&self, actors: &[String]) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT DISTINCT {FILM_SUMMARY_COLUMNS} FROM film \
             JOIN person_in_film ON film.id = person_in_film.id_film \
             JOIN crew ON person_in_film.id_person = crew.id \
             WHERE crew.name = ANY($1)"
        );
        self.fetch_summaries("find by actors", sqlx::query_as(&sql).bind(actors))
            .await
    }

    async fn film(&self, id: FilmId) -> StorageResult<Film> {
        let row: FilmRow = sqlx::query_as(
            "SELECT id, title, info, poster, release_date, country, mpaa FROM film WHERE id = $1",
        )
        .bind(db_id(id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("get film"))?;

        Ok(Film {
            id: catalog_id(row.id)?,
            title: row.title,
            info: row.info,
            poster: row.poster,
            release_date: row.release_date,
            country: row.country,
            mpaa: row.mpaa,
        })
    }

    async fn film_genres(&self, id: FilmId) -> StorageResult<Vec<String>> {
        sqlx::query_scalar(
            "SELECT genre.title FROM genre \
             JOIN films_genre ON genre.id = films_genre.id_genre \
             WHERE films_genre.id_film = $1 ORDER BY genre.title",
        )
        .bind(db_id(id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("get film genres"))
    }

    async fn film_cast(&self, id: FilmId) -> StorageResult<Vec<ActorSummary>> {
        let rows: Vec<CastRow> = sqlx::query_as(
            "SELECT crew.id, crew.name, crew.photo, \
             COALESCE(person_in_film.character_name, '') AS character_name \
             FROM crew JOIN person_in_film ON crew.id = person_in_film.id_person \
             WHERE person_in_film.id_film = $1 ORDER BY crew.id",
        )
        .bind(db_id(id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("get film cast"))?;

        rows.into_iter()
            .map(|row| {
                Ok(ActorSummary {
                    id: catalog_id(row.id)?,
                    name: row.name,
                    photo: row.photo,
                    character: row.character_name,
                })
            })
            .collect()
    }

    async fn rating_rollup(&self, id: FilmId) -> StorageResult<RatingRollup> {
        let (total, count): (f64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(rating), 0)::float8, COUNT(rating) \
             FROM users_comment WHERE id_film = $1",
        )
        .bind(db_id(id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("get film rating"))?;

        Ok(RatingRollup {
            total,
            count: u64::try_from(count).unwrap_or_default(),
        })
    }

    async fn actor(&self, id: ActorId) -> StorageResult<Actor> {
        let row: ActorRow = sqlx::query_as(
            "SELECT id, name, birth_date, country, photo, info FROM crew WHERE id = $1",
        )
        .bind(db_id(id)?)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("get actor"))?;
        Actor::try_from(row)
    }

    async fn actor_films(&self, id: ActorId) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT DISTINCT {FILM_SUMMARY_COLUMNS} FROM film \
             JOIN person_in_film ON film.id = person_in_film.id_film \
             WHERE person_in_film.id_person = $1"
        );
        self.fetch_summaries("get actor films", sqlx::query_as(&sql).bind(db_id(id)?))
            .await
    }
}

#[async_trait]
impl FavoriteStore for PgStore {
    async fn favorite_films(&self, user: UserId) -> StorageResult<Vec<FilmSummary>> {
        let sql = format!(
            "SELECT {FILM_SUMMARY_COLUMNS} FROM film \
             JOIN users_favorite_film ON film.id = users_favorite_film.id_film \
             WHERE users_favorite_film.id_user = $1 ORDER BY film.id"
        );
        self.fetch_summaries("get favorite films", sqlx::query_as(&sql).bind(db_id(user)?))
            .await
    }

    async fn add_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()> {
        let film = db_id(film)?;
        if !self.film_exists(film).await? {
            return Err(StorageError::NoRows);
        }
        sqlx::query(
            "INSERT INTO users_favorite_film(id_user, id_film) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(db_id(user)?)
        .bind(film)
        .execute(&self.pool)
        .await
        .map_err(query_error("add favorite film"))?;
        Ok(())
    }

    async fn remove_favorite_film(&self, user: UserId, film: FilmId) -> StorageResult<()> {
        sqlx::query("DELETE FROM users_favorite_film WHERE id_user = $1 AND id_film = $2")
            .bind(db_id(user)?)
            .bind(db_id(film)?)
            .execute(&self.pool)
            .await
            .map_err(query_error("remove favorite film"))?;
        Ok(())
    }

    async fn favorite_actors(&self, user: UserId) -> StorageResult<Vec<Actor>> {
        let rows: Vec<ActorRow> = sqlx::query_as(
            "SELECT crew.id, crew.name, crew.birth_date, crew.country, crew.photo, crew.info \
             FROM crew JOIN users_favorite_actor ON crew.id = users_favorite_actor.id_actor \
             WHERE users_favorite_actor.id_user = $1 ORDER BY crew.id",
        )
        .bind(db_id(user)?)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error("get favorite actors"))?;

        rows.into_iter().map(Actor::try_from).collect()
    }

    async fn add_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()> {
        let actor = db_id(actor)?;
        if !self.actor_exists(actor).await? {
            return Err(StorageError::NoRows);
        }
        sqlx::query(
            "INSERT INTO users_favorite_actor(id_user, id_actor) VALUES ($1, $2) \
             ON CONFLICT DO NOTHING",
        )
        .bind(db_id(user)?)
        .bind(actor)
        .execute(&self.pool)
        .await
        .map_err(query_error("add favorite actor"))?;
        Ok(())
    }

    async fn remove_favorite_actor(&self, user: UserId, actor: ActorId) -> StorageResult<()> {
        sqlx::query("DELETE FROM users_favorite_actor WHERE id_user = $1 AND id_actor = $2")
            .bind(db_id(user)?)
            .bind(db_id(actor)?)
            .execute(&self.pool)
            .await
            .map_err(query_error("remove favorite actor"))?;
        Ok(())
    }
}
