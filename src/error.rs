//! Error taxonomy surfaced to API callers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Error returned from API handlers.
///
/// Every variant maps to one HTTP status and is rendered as a JSON object
/// with an `error` field (upstream errors additionally carry `detail`).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// Unknown resource id (404).
    #[error("{0}")]
    NotFound(String),

    /// Policy violation, e.g. a sensitive settings key (403).
    #[error("{0}")]
    Forbidden(String),

    /// External API unreachable or returned non-2xx (502).
    #[error("{message}")]
    Upstream {
        message: String,
        detail: Option<String>,
    },

    /// Anything else (500).
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn missing_field(field: &str) -> Self {
        ApiError::Validation(format!("{} is required", field))
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        ApiError::Validation(format!("invalid {}: {}", field, reason))
    }

    pub fn todo_not_found() -> Self {
        ApiError::NotFound("Not found".to_string())
    }

    pub fn parent_not_found() -> Self {
        ApiError::NotFound("Parent not found".to_string())
    }

    pub fn sensitive_key() -> Self {
        ApiError::Forbidden("Forbidden".to_string())
    }

    pub fn unreachable_upstream(service: &str) -> Self {
        ApiError::Upstream {
            message: format!("Failed to reach {} API", service),
            detail: None,
        }
    }

    pub fn upstream_status(service: &str, status: u16, body: String) -> Self {
        ApiError::Upstream {
            message: format!("{} API error: {}", service, status),
            detail: Some(body),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {:#}", self);
        }
        let body = match &self {
            ApiError::Upstream {
                message,
                detail: Some(detail),
            } => json!({ "error": message, "detail": detail }),
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
