//! Health and store connectivity endpoints

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};

use userdb_core::{PoolStatus, SqlValue, StatementExecutor};

use crate::http::server::AppState;

pub const PROBE_QUERY: &str = "SELECT 1 + 1 AS solution";

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolStatus>,
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        pool: state.users.store().status(),
    })
}

/// Run the probe query; `Ok` carries the computed solution.
pub async fn probe(store: &dyn StatementExecutor) -> Result<SqlValue, String> {
    let rows = store
        .execute(PROBE_QUERY, &[])
        .await
        .map_err(|e| e.to_string())?
        .rows()
        .ok_or_else(|| "probe returned no result set".to_string())?;

    rows.first()
        .and_then(|row| row.get("solution"))
        .cloned()
        .ok_or_else(|| "probe returned no rows".to_string())
}

/// GET /test-db
async fn test_db(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    match probe(state.users.store().as_ref()).await {
        Ok(solution) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "data": solution })),
        ),
        Err(e) => {
            tracing::error!("Database probe failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Database connection failed" })),
            )
        }
    }
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/test-db", get(test_db))
}
