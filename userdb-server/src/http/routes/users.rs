//! User endpoints

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Path, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use userdb_core::{CreatedUser, User, UserInput};

use crate::http::error::ApiError;
use crate::http::server::AppState;

/// Confirmation body for update and delete
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            message: message.to_owned(),
        })
    }
}

/// Request body for create and update.
///
/// Only `application/json` bodies are parsed. A missing body, another content
/// type, or a JSON value that is not an object all yield no fields, which bind
/// as NULL and are left to the store to reject. Malformed JSON is a 400.
pub struct UserBody(pub UserInput);

impl<S> FromRequest<S> for UserBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Ok(Self(UserInput::default()));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::InvalidInput {
                message: e.body_text(),
            })?;
        if bytes.is_empty() {
            return Ok(Self(UserInput::default()));
        }
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| ApiError::InvalidInput {
                message: format!("malformed JSON body: {}", e),
            })?;
        Ok(Self(UserInput::from_json(body)))
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}

/// GET /api/users
async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

/// GET /api/users/{id}
async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get(&id).await?))
}

/// POST /api/users
async fn create_user(
    State(state): State<Arc<AppState>>,
    UserBody(input): UserBody,
) -> Result<(StatusCode, Json<CreatedUser>), ApiError> {
    let created = state.users.create(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/users/{id}
async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    UserBody(input): UserBody,
) -> Result<Json<MessageResponse>, ApiError> {
    state.users.update(&id, input).await?;
    Ok(MessageResponse::new("user updated"))
}

/// DELETE /api/users/{id}
async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.users.delete(&id).await?;
    Ok(MessageResponse::new("user deleted"))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route(
            "/api/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(content_type: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers
    }

    #[test]
    fn json_content_type_detection() {
        assert!(is_json(&headers("application/json")));
        assert!(is_json(&headers("Application/JSON; charset=utf-8")));
        assert!(!is_json(&headers("text/plain")));
        assert!(!is_json(&HeaderMap::new()));
    }
}
