//! HTTP routes.
//!
//! Every route answers with the `{status, body}` envelope. A route called
//! with the wrong method answers 405 in the same envelope, unknown paths 404.

use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog::{Actor, FilmSummary};
use search::{Page, RawSearchRequest, SearchRequestBody};
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{instrument, warn};

use crate::envelope::Envelope;
use crate::error::{ApiError, ApiResult};
use crate::service::{ActorDetails, Calendar, FilmDetails};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/films", get(films).fallback(method_not_allowed))
        .route("/api/v1/find", post(find).fallback(method_not_allowed))
        .route("/api/v1/film", get(film).fallback(method_not_allowed))
        .route("/api/v1/actor", get(actor).fallback(method_not_allowed))
        .route("/api/v1/calendar", get(calendar).fallback(method_not_allowed))
        .route(
            "/api/v1/favorite/films",
            get(favorite_films).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/favorite/film/add",
            get(add_favorite_film).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/favorite/film/remove",
            get(remove_favorite_film).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/favorite/actors",
            get(favorite_actors).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/favorite/actor/add",
            get(add_favorite_actor).fallback(method_not_allowed),
        )
        .route(
            "/api/v1/favorite/actor/remove",
            get(remove_favorite_actor).fallback(method_not_allowed),
        )
        .route("/health", get(health).fallback(method_not_allowed))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// PARAMETERS
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FilmsParams {
    #[serde(flatten)]
    criteria: RawSearchRequest,
    page: Option<String>,
    per_page: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IdParams {
    film_id: Option<String>,
    actor_id: Option<String>,
    user_id: Option<String>,
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// Parse a required unsigned id parameter
fn parse_id(field: &str, value: Option<&str>) -> ApiResult<u64> {
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("invalid {field} '{value}'")))
}

fn parse_count(field: &str, value: Option<&str>) -> ApiResult<Option<usize>> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("invalid {field} '{value}'"))),
    }
}

/// Paging is applied only when the request asks for it
fn page_of(params: &FilmsParams) -> ApiResult<Option<Page>> {
    let page = parse_count("page", params.page.as_deref())?;
    let per_page = parse_count("per_page", params.per_page.as_deref())?;
    Ok(match (page, per_page) {
        (None, None) => None,
        (page, per_page) => Some(Page::new(
            page.unwrap_or(1),
            per_page.unwrap_or(Page::DEFAULT_PER_PAGE),
        )),
    })
}

/// Cancels its token when the request deadline passes
struct Deadline {
    cancel: CancellationToken,
    timer: JoinHandle<()>,
}

impl Deadline {
    fn start(timeout: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            warn!(timeout = ?timeout, "request deadline passed, cancelling search");
            token.cancel();
        });
        Self { cancel, timer }
    }

    fn token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.timer.abort();
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[instrument(skip_all)]
async fn films(
    State(state): State<AppState>,
    query: Result<Query<FilmsParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<FilmSummary>>> {
    let params = query_params(query)?;
    let page = page_of(&params)?;

    let deadline = Deadline::start(state.request_timeout);
    let films = state
        .service
        .search()
        .search(&params.criteria, deadline.token())
        .await?;

    Ok(Envelope::ok(match page {
        Some(page) => page.apply(films),
        None => films,
    }))
}

#[instrument(skip_all)]
async fn find(
    State(state): State<AppState>,
    body: Result<Json<SearchRequestBody>, JsonRejection>,
) -> ApiResult<Envelope<Vec<FilmSummary>>> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let deadline = Deadline::start(state.request_timeout);
    let films = state
        .service
        .search()
        .search_body(&body, deadline.token())
        .await?;
    Ok(Envelope::ok(films))
}

async fn film(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<FilmDetails>> {
    let film_id = parse_id("film_id", query_params(query)?.film_id.as_deref())?;
    Ok(Envelope::ok(state.service.film_details(film_id).await?))
}

async fn actor(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<ActorDetails>> {
    let actor_id = parse_id("actor_id", query_params(query)?.actor_id.as_deref())?;
    Ok(Envelope::ok(state.service.actor_details(actor_id).await?))
}

async fn calendar(State(state): State<AppState>) -> ApiResult<Envelope<Calendar>> {
    Ok(Envelope::ok(state.service.calendar().await?))
}

async fn favorite_films(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<FilmSummary>>> {
    let user_id = parse_id("user_id", query_params(query)?.user_id.as_deref())?;
    Ok(Envelope::ok(state.service.favorite_films(user_id).await?))
}

async fn add_favorite_film(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<()>> {
    let params = query_params(query)?;
    let user_id = parse_id("user_id", params.user_id.as_deref())?;
    let film_id = parse_id("film_id", params.film_id.as_deref())?;
    state.service.add_favorite_film(user_id, film_id).await?;
    Ok(Envelope::empty(StatusCode::OK))
}

async fn remove_favorite_film(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<()>> {
    let params = query_params(query)?;
    let user_id = parse_id("user_id", params.user_id.as_deref())?;
    let film_id = parse_id("film_id", params.film_id.as_deref())?;
    state.service.remove_favorite_film(user_id, film_id).await?;
    Ok(Envelope::empty(StatusCode::OK))
}

async fn favorite_actors(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<Vec<Actor>>> {
    let user_id = parse_id("user_id", query_params(query)?.user_id.as_deref())?;
    Ok(Envelope::ok(state.service.favorite_actors(user_id).await?))
}

async fn add_favorite_actor(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<()>> {
    let params = query_params(query)?;
    let user_id = parse_id("user_id", params.user_id.as_deref())?;
    let actor_id = parse_id("actor_id", params.actor_id.as_deref())?;
    state.service.add_favorite_actor(user_id, actor_id).await?;
    Ok(Envelope::empty(StatusCode::OK))
}

async fn remove_favorite_actor(
    State(state): State<AppState>,
    query: Result<Query<IdParams>, QueryRejection>,
) -> ApiResult<Envelope<()>> {
    let params = query_params(query)?;
    let user_id = parse_id("user_id", params.user_id.as_deref())?;
    let actor_id = parse_id("actor_id", params.actor_id.as_deref())?;
    state.service.remove_favorite_actor(user_id, actor_id).await?;
    Ok(Envelope::empty(StatusCode::OK))
}

async fn health(State(state): State<AppState>) -> Response {
    match state.service.store().ping().await {
        Ok(()) => Envelope::ok("ok").into_response(),
        Err(err) => {
            warn!(error = %err, "health check failed");
            Envelope::empty(StatusCode::SERVICE_UNAVAILABLE).into_response()
        }
    }
}

async fn method_not_allowed() -> Envelope<()> {
    Envelope::empty(StatusCode::METHOD_NOT_ALLOWED)
}

async fn not_found() -> Envelope<()> {
    Envelope::empty(StatusCode::NOT_FOUND)
}
