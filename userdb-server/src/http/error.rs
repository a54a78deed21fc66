//! API error types with IntoResponse
//!
//! Caller errors (404, 400) and system errors (503, 500) stay distinct so
//! clients can tell "you asked for something wrong" from "we are broken".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use userdb_core::AccessError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// No such user (404)
    NotFound { id: String },

    /// Store rejected the submitted values (400)
    InvalidInput { message: String },

    /// Pool exhausted or store unreachable (503, logged)
    Unavailable { message: String },

    /// Any other store failure (500, logged); the store's text is passed through
    Statement { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Statement { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::NotFound { id } => json!({
                "error": "not_found",
                "message": format!("user '{}' not found", id)
            }),
            Self::InvalidInput { message } => json!({
                "error": "invalid_input",
                "message": message
            }),
            Self::Unavailable { message } => {
                tracing::error!("Store unavailable: {}", message);
                json!({
                    "error": "store_unavailable",
                    "message": message
                })
            }
            Self::Statement { message } => {
                tracing::error!("Statement error: {}", message);
                json!({
                    "error": "statement_error",
                    "message": message
                })
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NotFound { id } => Self::NotFound { id },
            AccessError::InvalidInput { message } => Self::InvalidInput { message },
            AccessError::StoreUnavailable { message } => Self::Unavailable { message },
            AccessError::StatementError { message } => Self::Statement { message },
        }
    }
}
