//! HTTP tests for the film API.
//!
//! The router is driven in-process with `tower::ServiceExt::oneshot` over the
//! sample catalog in `data/catalog`.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use catalog::CatalogIndex;
use chrono::{Datelike, Local, NaiveDate};
use serde_json::{Value, json};
use server::{AppState, CatalogService, Storage, router};
use storage::InMemoryStore;
use tower::ServiceExt;

use broken::{BrokenStore, SparseStore};

fn sample_storage() -> Storage {
    let index = CatalogIndex::load_from_files(Path::new("../../data/catalog"))
        .expect("sample catalog should load");
    Storage::memory(Arc::new(index))
}

fn app() -> Router {
    router(AppState::new(sample_storage(), Duration::from_secs(5)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    send(app(), Request::get(uri).body(Body::empty()).unwrap()).await
}

fn ids(body: &Value) -> Vec<u64> {
    body["body"]
        .as_array()
        .expect("body should be a list")
        .iter()
        .map(|film| film["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_search_combines_clauses() {
    let (status, body) = get("/api/v1/films?genre=Drama,Comedy&rating_from=8.5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], 200);
    assert_eq!(ids(&body), vec![9, 8, 5, 3]);
}

#[tokio::test]
async fn test_search_by_title_any_case() {
    let (status, body) = get("/api/v1/films?title=MATRIX").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![2, 1]);
}

#[tokio::test]
async fn test_search_without_matches_is_empty_list() {
    let (status, body) = get("/api/v1/films?title=matrix&mpaa=G").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": 200, "body": []}));
}

#[tokio::test]
async fn test_search_by_actor_and_release_window() {
    let (status, body) =
        get("/api/v1/films?actors=Keanu%20Reeves&date_from=2000-01-01&date_to=2015-12-31").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![7, 2]);
}

#[tokio::test]
async fn test_malformed_rating_is_bad_request() {
    let (status, body) = get("/api/v1/films?rating_from=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"status": 400, "body": null}));
}

#[tokio::test]
async fn test_malformed_date_is_bad_request() {
    let (status, _) = get("/api/v1/films?date_from=31-12-2020").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_browse_with_paging() {
    let (status, body) = get("/api/v1/films?page=2&per_page=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![7, 5, 2, 6, 1]);

    let (_, body) = get("/api/v1/films").await;
    assert_eq!(ids(&body).len(), 12);

    let (status, _) = get("/api/v1/films?page=x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_wrong_method_is_405_envelope() {
    let request = Request::post("/api/v1/films").body(Body::empty()).unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"status": 405, "body": null}));

    let (status, _) = get("/api/v1/find").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_path_is_404_envelope() {
    let (status, body) = get("/api/v2/films").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_find_with_json_body() {
    let request = Request::post("/api/v1/find")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"genres": ["Sci-Fi"], "rating_from": 8.0}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![10, 11, 1]);
}

#[tokio::test]
async fn test_find_with_malformed_json() {
    let request = Request::post("/api/v1/find")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"genres\": "))
        .unwrap();
    let (status, body) = send(app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["body"], Value::Null);
}

#[tokio::test]
async fn test_film_details() {
    let (status, body) = get("/api/v1/film?film_id=1").await;
    assert_eq!(status, StatusCode::OK);

    let details = &body["body"];
    assert_eq!(details["film"]["title"], "The Matrix");
    assert_eq!(details["genres"], json!(["Action", "Sci-Fi"]));
    assert_eq!(details["rating"], json!({"average": 9.0, "count": 3}));
    assert_eq!(details["cast"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_unrated_film_reports_zero_rating() {
    let (status, body) = get("/api/v1/film?film_id=12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["rating"], json!({"average": 0.0, "count": 0}));
}

#[tokio::test]
async fn test_film_lookup_errors() {
    let (status, body) = get("/api/v1/film?film_id=999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"status": 404, "body": null}));

    let (status, _) = get("/api/v1/film?film_id=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get("/api/v1/film").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_actor_details() {
    let (status, body) = get("/api/v1/actor?actor_id=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["body"]["actor"]["name"], "Keanu Reeves");
    let films: Vec<u64> = body["body"]["films"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_u64().unwrap())
        .collect();
    assert_eq!(films, vec![7, 2, 1]);

    let (status, _) = get("/api/v1/actor?actor_id=404").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_favorite_films_flow() {
    let app = app();
    let call = |uri: &str| {
        let app = app.clone();
        let request = Request::get(uri).body(Body::empty()).unwrap();
        async move { send(app, request).await }
    };

    assert_eq!(call("/api/v1/favorite/film/add?user_id=1&film_id=4").await.0, StatusCode::OK);
    assert_eq!(call("/api/v1/favorite/film/add?user_id=1&film_id=4").await.0, StatusCode::OK);
    assert_eq!(call("/api/v1/favorite/film/add?user_id=1&film_id=9").await.0, StatusCode::OK);

    let (_, body) = call("/api/v1/favorite/films?user_id=1").await;
    assert_eq!(ids(&body), vec![4, 9]);

    assert_eq!(call("/api/v1/favorite/film/remove?user_id=1&film_id=4").await.0, StatusCode::OK);
    let (_, body) = call("/api/v1/favorite/films?user_id=1").await;
    assert_eq!(ids(&body), vec![9]);

    let (status, _) = call("/api/v1/favorite/film/add?user_id=1&film_id=999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call("/api/v1/favorite/films").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_favorite_actors_flow() {
    let app = app();
    let call = |uri: &str| {
        let app = app.clone();
        let request = Request::get(uri).body(Body::empty()).unwrap();
        async move { send(app, request).await }
    };

    assert_eq!(call("/api/v1/favorite/actor/add?user_id=2&actor_id=8").await.0, StatusCode::OK);
    let (_, body) = call("/api/v1/favorite/actors?user_id=2").await;
    assert_eq!(body["body"][0]["name"], "Amy Adams");

    assert_eq!(call("/api/v1/favorite/actor/remove?user_id=2&actor_id=8").await.0, StatusCode::OK);
    let (_, body) = call("/api/v1/favorite/actors?user_id=2").await;
    assert_eq!(body["body"], json!([]));

    let (status, _) = call("/api/v1/favorite/actor/add?user_id=2&actor_id=77").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_calendar_is_current_month() {
    let (status, body) = get("/api/v1/calendar").await;
    assert_eq!(status, StatusCode::OK);

    let today = Local::now().date_naive();
    assert_eq!(body["body"]["year"], today.year());
    assert_eq!(body["body"]["month"], today.month());
    assert!(body["body"]["days"].is_array());
}

#[tokio::test]
async fn test_calendar_groups_releases_by_day() {
    let storage = sample_storage();
    let service = CatalogService::new(storage.films, storage.favorites);

    let october_2014 = service
        .calendar_for(NaiveDate::from_ymd_opt(2014, 10, 2).unwrap())
        .await
        .unwrap();
    assert_eq!(october_2014.today, 2);
    assert_eq!(october_2014.days.len(), 1);
    assert_eq!(october_2014.days[0].day, 24);
    assert_eq!(october_2014.days[0].films[0].title, "John Wick");

    let empty = service
        .calendar_for(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap())
        .await
        .unwrap();
    assert!(empty.days.is_empty());
}

#[tokio::test]
async fn test_health() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": 200, "body": "ok"}));
}

fn broken_app() -> Router {
    let favorites = Arc::new(InMemoryStore::new(Arc::new(CatalogIndex::new())));
    let storage = Storage {
        films: Arc::new(BrokenStore),
        favorites,
    };
    router(AppState::new(storage, Duration::from_secs(5)))
}

#[tokio::test]
async fn test_storage_failure_is_500_without_details() {
    let request = Request::get("/api/v1/films?genre=Drama&rating_from=7")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(broken_app(), request).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"status": 500, "body": null}));
}

#[tokio::test]
async fn test_health_reports_unreachable_storage() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(broken_app(), request).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], 503);
}

#[tokio::test]
async fn test_bad_criteria_rejected_before_storage() {
    // The broken store would turn any storage call into a 500
    let request = Request::get("/api/v1/films?rating_to=NaN")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(broken_app(), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn sparse_service() -> CatalogService {
    let storage = sample_storage();
    CatalogService::new(Arc::new(SparseStore(storage.films)), storage.favorites)
}

#[tokio::test]
async fn test_no_rows_from_detail_lists_is_empty() {
    let service = sparse_service();

    let film = service.film_details(1).await.unwrap();
    assert_eq!(film.film.title, "The Matrix");
    assert!(film.genres.is_empty());
    assert!(film.cast.is_empty());
    assert_eq!(film.rating.count, 0);

    let actor = service.actor_details(1).await.unwrap();
    assert!(actor.films.is_empty());
}

#[tokio::test]
async fn test_no_rows_from_calendar_is_empty_month() {
    let calendar = sparse_service()
        .calendar_for(NaiveDate::from_ymd_opt(2014, 10, 2).unwrap())
        .await
        .unwrap();
    assert!(calendar.days.is_empty());
}

#[tokio::test]
async fn test_no_rows_search_over_http_is_empty_list() {
    let storage = sample_storage();
    let storage = Storage {
        films: Arc::new(SparseStore(storage.films)),
        favorites: storage.favorites,
    };
    let app = router(AppState::new(storage, Duration::from_secs(5)));
    let request = Request::get("/api/v1/films?genre=Drama")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": 200, "body": []}));
}

mod broken {
    use std::sync::Arc;

    use catalog::{Actor, ActorId, ActorSummary, Film, FilmId, FilmSummary, RatingRollup};
    use chrono::NaiveDate;
    use storage::{FilmStore, StorageError, StorageResult};

    /// Store whose every query fails as if the database were down
    pub struct BrokenStore;

    fn down<T>() -> StorageResult<T> {
        Err(StorageError::Unavailable("connection refused".to_string()))
    }

    #[async_trait::async_trait]
    impl FilmStore for BrokenStore {
        fn backend(&self) -> &'static str {
            "broken"
        }
        async fn ping(&self) -> StorageResult<()> {
            down()
        }
        async fn list_films(&self) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_title(&self, _: &str) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_release_date(
            &self,
            _: Option<NaiveDate>,
            _: Option<NaiveDate>,
        ) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_rating(&self, _: Option<f64>, _: Option<f64>) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_content_rating(&self, _: &str) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_genres(&self, _: &[String]) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn find_by_actors(&self, _: &[String]) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
        async fn film(&self, _: FilmId) -> StorageResult<Film> {
            down()
        }
        async fn film_genres(&self, _: FilmId) -> StorageResult<Vec<String>> {
            down()
        }
        async fn film_cast(&self, _: FilmId) -> StorageResult<Vec<ActorSummary>> {
            down()
        }
        async fn rating_rollup(&self, _: FilmId) -> StorageResult<RatingRollup> {
            down()
        }
        async fn actor(&self, _: ActorId) -> StorageResult<Actor> {
            down()
        }
        async fn actor_films(&self, _: ActorId) -> StorageResult<Vec<FilmSummary>> {
            down()
        }
    }

    /// Store that finds point lookups but answers "no rows" to every list query
    pub struct SparseStore(pub Arc<dyn FilmStore>);

    fn no_rows<T>() -> StorageResult<T> {
        Err(StorageError::NoRows)
    }

    #[async_trait::async_trait]
    impl FilmStore for SparseStore {
        fn backend(&self) -> &'static str {
            "sparse"
        }
        async fn ping(&self) -> StorageResult<()> {
            self.0.ping().await
        }
        async fn list_films(&self) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_title(&self, _: &str) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_release_date(
            &self,
            _: Option<NaiveDate>,
            _: Option<NaiveDate>,
        ) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_rating(&self, _: Option<f64>, _: Option<f64>) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_content_rating(&self, _: &str) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_genres(&self, _: &[String]) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn find_by_actors(&self, _: &[String]) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
        async fn film(&self, id: FilmId) -> StorageResult<Film> {
            self.0.film(id).await
        }
        async fn film_genres(&self, _: FilmId) -> StorageResult<Vec<String>> {
            no_rows()
        }
        async fn film_cast(&self, _: FilmId) -> StorageResult<Vec<ActorSummary>> {
            no_rows()
        }
        async fn rating_rollup(&self, _: FilmId) -> StorageResult<RatingRollup> {
            no_rows()
        }
        async fn actor(&self, id: ActorId) -> StorageResult<Actor> {
            self.0.actor(id).await
        }
        async fn actor_films(&self, _: ActorId) -> StorageResult<Vec<FilmSummary>> {
            no_rows()
        }
    }
}
