//! Router-level tests: real pool adapter over in-memory SQLite.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use userdb_core::{
    ExecOutcome, PoolConfig, PooledStore, SqlValue, StatementExecutor, StoreError, UserHandler,
};
use userdb_server::{build_router, AppState, ServerConfig};

async fn sqlite_store() -> Arc<PooledStore> {
    let config = PoolConfig {
        connection_limit: 1,
        ..PoolConfig::from_url("sqlite::memory:")
    };
    let store = PooledStore::connect(&config).await.expect("open sqlite pool");
    store
        .execute(
            "CREATE TABLE users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL
            )",
            &[],
        )
        .await
        .expect("create users table");
    Arc::new(store)
}

fn config() -> ServerConfig {
    ServerConfig {
        static_dir: None,
        ..ServerConfig::default()
    }
}

async fn app() -> Router {
    let users = UserHandler::new(sqlite_store().await);
    build_router(AppState::new(users), &config())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn crud_round_trip() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({"username": "alice", "email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({"id": 1}));

    let (status, body) = send(&app, "GET", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"id": 1, "username": "alice", "email": "a@x.com"}));

    let (status, body) = send(
        &app,
        "PUT",
        "/api/users/1",
        Some(json!({"username": "alice2", "email": "a2@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user updated");

    let (_, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(
        body,
        json!([{"id": 1, "username": "alice2", "email": "a2@x.com"}])
    );

    let (status, body) = send(&app, "DELETE", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "user deleted");

    let (status, body) = send(&app, "GET", "/api/users/1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn missing_user_is_404_for_targeted_operations() {
    let app = app().await;

    let (status, _) = send(&app, "DELETE", "/api/users/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "PUT",
        "/api/users/42",
        Some(json!({"username": "x", "email": "y@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_field_is_400_and_not_persisted() {
    let app = app().await;

    let (status, body) = send(&app, "POST", "/api/users", Some(json!({"username": "bob"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (_, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(body, json!([]));
}

async fn send_raw(
    app: &Router,
    uri: &str,
    content_type: Option<&str>,
    body: &'static str,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method("POST").uri(uri);
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    let response = app
        .clone()
        .oneshot(builder.body(Body::from(body)).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).expect("JSON error body"))
}

#[tokio::test]
async fn numeric_username_is_accepted() {
    let app = app().await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({"username": 123, "email": "n@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, user) = send(&app, "GET", &format!("/api/users/{}", body["id"]), None).await;
    assert_eq!(user["username"], "123");
}

#[tokio::test]
async fn body_without_json_content_type_binds_nulls() {
    let app = app().await;

    let (status, body) = send_raw(&app, "/api/users", None, r#"{"username":"x"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = send_raw(&app, "/api/users", Some("text/plain"), "hello").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");

    let (_, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn malformed_json_is_400_with_error_body() {
    let app = app().await;

    let (status, body) = send_raw(&app, "/api/users", Some("application/json"), "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
    assert!(body["message"].as_str().unwrap().contains("malformed JSON"));
}

#[tokio::test]
async fn json_array_body_carries_no_fields() {
    let app = app().await;
    let (status, body) = send_raw(&app, "/api/users", Some("application/json"), "[1,2]").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_input");
}

#[tokio::test]
async fn test_db_reports_solution() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/test-db", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "success", "data": 2}));
}

#[tokio::test]
async fn health_includes_pool_status() {
    let app = app().await;
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["pool"]["waiting"], 0);
}

/// Executor whose store is always out of reach.
struct Unreachable;

#[async_trait]
impl StatementExecutor for Unreachable {
    async fn execute(&self, _: &str, _: &[SqlValue]) -> Result<ExecOutcome, StoreError> {
        Err(StoreError::unavailable("pool timed out while waiting for an open connection"))
    }
}

#[tokio::test]
async fn unreachable_store_is_503_and_test_db_fails() {
    let app = build_router(AppState::new(UserHandler::new(Arc::new(Unreachable))), &config());

    let (status, body) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "store_unavailable");

    let (status, body) = send(&app, "GET", "/test-db", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Database connection failed"}));

    let (_, body) = send(&app, "GET", "/health", None).await;
    assert!(body.get("pool").is_none());
}

#[tokio::test]
async fn static_files_are_the_fallback() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>users</h1>").unwrap();

    let config = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let app = build_router(
        AppState::new(UserHandler::new(sqlite_store().await)),
        &config,
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/index.html")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"<h1>users</h1>");
}
