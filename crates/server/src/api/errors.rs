//! API error types mapped to HTTP status codes.
//!
//! Each [`ApiError`] variant maps to a specific HTTP status code and produces
//! a JSON response body `{"detail": "message"}`.

use crate::search::SearchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type that implements `IntoResponse`.
///
/// - `BadRequest` → 400
/// - `ServiceUnavailable` → 503
/// - `Internal` → 500
#[derive(Debug)]
pub enum ApiError {
    /// Invalid request parameters (400).
    BadRequest(String),
    /// A dependency is not reachable (503).
    ServiceUnavailable(String),
    /// Unexpected server error (500).
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        let body = axum::Json(json!({ "detail": message }));
        (status, body).into_response()
    }
}

impl From<SearchError> for ApiError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Validation(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(format!("Search failed: {other}")),
        }
    }
}
