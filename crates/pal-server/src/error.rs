//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the unified error type for all API endpoints. It implements
//! `axum::response::IntoResponse` to produce structured JSON error responses
//! with appropriate HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use pal_floor::FloorError;

/// Structured error detail in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "NOT_HOLDER").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional structured details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// API errors with HTTP status code mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Entity not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid request (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or malformed participant identity (401).
    #[error("participant required: {0}")]
    ParticipantRequired(String),

    /// Caller may not act on another participant (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Floor operation rejected (409 / 404).
    #[error(transparent)]
    Floor(#[from] FloorError),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, details) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", None),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None),
            ApiError::ParticipantRequired(_) => {
                (StatusCode::UNAUTHORIZED, "PARTICIPANT_REQUIRED", None)
            }
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN", None),
            ApiError::Floor(FloorError::NotHolder { holder, .. }) => (
                StatusCode::CONFLICT,
                "NOT_HOLDER",
                Some(serde_json::json!({ "holder": holder })),
            ),
            ApiError::Floor(FloorError::NotQueued { .. }) => {
                (StatusCode::NOT_FOUND, "NOT_QUEUED", None)
            }
            ApiError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", None)
            }
        };

        let detail = ApiErrorDetail {
            code: code.to_string(),
            message: self.to_string(),
            details,
        };

        let body = serde_json::json!({
            "success": false,
            "error": detail,
        });

        (status, axum::Json(body)).into_response()
    }
}
