use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use challenge_picker::config::AppConfig;
use challenge_picker::domain::NewChallenge;
use challenge_picker::error::{StoreError, StoreResult};
use challenge_picker::store::{ChallengeStore, SqliteStore};
use challenge_picker::{build_router, AppState, Challenge, ChallengePatch};

fn app() -> Router {
    build_router(Arc::new(AppState::in_memory()), &AppConfig::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(b) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn create(app: &Router, body: Value) -> Value {
    let (status, created) = send(app, Method::POST, "/challenge", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    created
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn create_returns_201_with_defaults_applied() {
    let app = app();
    let created = create(&app, json!({ "title": "Two Sum" })).await;
    assert_eq!(created["id"], 1);
    assert_eq!(created["title"], "Two Sum");
    assert_eq!(created["description"], "");
    assert_eq!(created["tags"], json!([]));
    assert_eq!(created["difficulty"], Value::Null);
    assert!(created["createdAt"].is_string());
    assert!(created["updatedAt"].is_string());
}

#[tokio::test]
async fn invalid_create_body_is_422_with_field_list() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/challenge",
        Some(json!({ "difficulty": "impossible", "tags": [1] })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["statusCode"], 422);
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["path"], "/challenge");
    assert_eq!(body["method"], "POST");
    assert!(body["timestamp"].is_string());
    assert_eq!(
        body["errors"],
        json!([
            { "property": "title", "message": "Title is required" },
            { "property": "difficulty", "message": "Difficulty must be one of: easy, medium, hard" },
            { "property": "tags", "message": "Each tag must be a string" },
        ])
    );
}

#[tokio::test]
async fn malformed_json_is_rejected_before_validation() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/challenge")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let res = app().oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&to_bytes(res.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["message"], "Invalid JSON body");
}

/// Store whose writes hit a uniqueness constraint on `slug`.
struct ConstrainedStore;

#[async_trait::async_trait]
impl ChallengeStore for ConstrainedStore {
    async fn count(&self) -> StoreResult<u64> {
        Ok(0)
    }
    async fn find_all(&self) -> StoreResult<Vec<Challenge>> {
        Ok(vec![])
    }
    async fn find_at_offset(&self, _offset: u64) -> StoreResult<Option<Challenge>> {
        Ok(None)
    }
    async fn find_by_id(&self, _id: i64) -> StoreResult<Option<Challenge>> {
        Ok(None)
    }
    async fn insert(&self, _row: NewChallenge) -> StoreResult<Challenge> {
        Err(StoreError::UniqueViolation { fields: vec!["slug".into()] })
    }
    async fn update(&self, _id: i64, _patch: &ChallengePatch) -> StoreResult<Challenge> {
        Err(StoreError::UniqueViolation { fields: vec!["slug".into()] })
    }
    async fn delete(&self, _id: i64) -> StoreResult<Challenge> {
        Err(StoreError::RecordNotFound)
    }
}

#[tokio::test]
async fn store_constraint_violation_is_400_with_offending_field() {
    let app = build_router(Arc::new(AppState::new(Arc::new(ConstrainedStore))), &AppConfig::default());
    let (status, body) = send(&app, Method::POST, "/challenge", Some(json!({ "title": "Two Sum" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["message"], "Unique constraint violation");
    assert_eq!(body["errors"], json!({ "field": ["slug"] }));
    assert_eq!(body["path"], "/challenge");
}

#[tokio::test]
async fn repeated_titles_are_accepted() {
    let app = app();
    let first = create(&app, json!({ "title": "Two Sum" })).await;
    let second = create(&app, json!({ "title": "Two Sum" })).await;
    assert_ne!(first["id"], second["id"]);

    let third = create(&app, json!({ "title": "Three Sum" })).await;
    let uri = format!("/challenge/{}", third["id"]);
    let (status, renamed) = send(&app, Method::PATCH, &uri, Some(json!({ "title": "Two Sum" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["title"], "Two Sum");
}

#[tokio::test]
async fn random_on_empty_store_is_404() {
    let (status, body) = send(&app(), Method::GET, "/challenge/random", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["statusCode"], 404);
    assert_eq!(body["message"], "No challenges found");
    assert_eq!(body["path"], "/challenge/random");
    assert_eq!(body["method"], "GET");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn random_returns_one_of_the_stored_records() {
    let app = app();
    for title in ["a", "b", "c"] {
        create(&app, json!({ "title": title })).await;
    }
    for _ in 0..20 {
        let (status, body) = send(&app, Method::GET, "/challenge/random", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(["a", "b", "c"].contains(&body["title"].as_str().unwrap()));
    }
}

#[tokio::test]
async fn list_returns_every_record() {
    let app = app();
    create(&app, json!({ "title": "a" })).await;
    create(&app, json!({ "title": "b", "difficulty": "hard" })).await;
    let (status, body) = send(&app, Method::GET, "/challenge", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn get_by_id_resolves_or_404s() {
    let app = app();
    let created = create(&app, json!({ "title": "a" })).await;
    let (status, body) = send(&app, Method::GET, "/challenge/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, created);

    let (status, body) = send(&app, Method::GET, "/challenge/2", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Challenge with ID 2 not found");
}

#[tokio::test]
async fn patch_on_missing_or_malformed_id_is_404() {
    let app = app();
    create(&app, json!({ "title": "a" })).await;
    let patch = json!({ "title": "X" });

    let (status, body) = send(&app, Method::PATCH, "/challenge/42", Some(patch.clone())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Challenge with ID 42 not found");
    assert_eq!(body["path"], "/challenge/42");
    assert_eq!(body["method"], "PATCH");

    let (status, body) = send(&app, Method::PATCH, "/challenge/abc", Some(patch)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Challenge with ID abc not found");
}

#[tokio::test]
async fn patch_changes_only_the_sent_fields() {
    let app = app();
    let before = create(
        &app,
        json!({
            "title": "Two Sum",
            "description": "Find indices",
            "difficulty": "easy",
            "tags": ["array"],
            "category": "arrays",
        }),
    )
    .await;

    let (status, after) = send(&app, Method::PATCH, "/challenge/1", Some(json!({ "title": "X" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["title"], "X");
    for field in ["id", "description", "difficulty", "tags", "category", "createdAt"] {
        assert_eq!(after[field], before[field], "{field} changed");
    }
}

#[tokio::test]
async fn patch_validation_failure_is_422() {
    let app = app();
    create(&app, json!({ "title": "a" })).await;
    let (status, body) = send(&app, Method::PATCH, "/challenge/1", Some(json!({ "title": 3 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["errors"], json!([{ "property": "title", "message": "Title must be a string" }]));
}

#[tokio::test]
async fn delete_returns_removed_record_and_then_404s() {
    let app = app();
    let created = create(&app, json!({ "title": "a" })).await;

    let (status, removed) = send(&app, Method::DELETE, "/challenge/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed, created);

    let (_, list) = send(&app, Method::GET, "/challenge", None).await;
    assert_eq!(list, json!([]));

    let (status, body) = send(&app, Method::DELETE, "/challenge/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Challenge with ID 1 not found");
}

#[tokio::test]
async fn unknown_route_uses_the_error_envelope() {
    let (status, body) = send(&app(), Method::GET, "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Cannot GET /nope");
    assert_eq!(body["statusCode"], 404);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let req = Request::builder()
        .method(Method::OPTIONS)
        .uri("/challenge")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
        .body(Body::empty())
        .unwrap();
    let res = app().oneshot(req).await.unwrap();
    let headers = res.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:5173");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
}

#[tokio::test]
async fn two_sum_lifecycle_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::open(dir.path().join("challenges.db")).unwrap();
    let app = build_router(Arc::new(AppState::new(Arc::new(store))), &AppConfig::default());

    let created = create(&app, json!({ "title": "Two Sum", "description": "Find indices" })).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["title"], "Two Sum");
    assert_eq!(created["description"], "Find indices");

    let uri = format!("/challenge/{id}");
    let (status, updated) =
        send(&app, Method::PATCH, &uri, Some(json!({ "description": "Find two indices" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id);
    assert_eq!(updated["title"], "Two Sum");
    assert_eq!(updated["description"], "Find two indices");

    let (status, removed) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(removed, updated);

    let (status, _) = send(&app, Method::PATCH, &uri, Some(json!({ "title": "Three Sum" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
