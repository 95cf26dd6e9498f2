//! API error types and JSON error response formatting.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use medbook_dialog::DialogError;
use serde::Serialize;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code (e.g., "bad_request", "not_found").
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    BadRequest(String),
    /// 404 Not Found - resource does not exist.
    NotFound(String),
    /// 409 Conflict - the session is in the middle of a turn.
    Conflict(String),
    /// 413 Payload Too Large - utterance over the configured limit.
    PayloadTooLarge(String),
    /// 500 Internal Server Error - unexpected server error.
    Internal(String),
    /// 502 Bad Gateway - a collaborator returned something unusable.
    BadGateway(String),
    /// 503 Service Unavailable - classifier not reachable.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg),
            ApiError::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<DialogError> for ApiError {
    fn from(err: DialogError) -> Self {
        let message = err.to_string();
        match err {
            DialogError::EmptyMessage => ApiError::BadRequest(message),
            DialogError::MessageTooLong(_) => ApiError::PayloadTooLarge(message),
            DialogError::Classifier(_) => ApiError::ServiceUnavailable(message),
            DialogError::MalformedEntity(_) => ApiError::BadGateway(message),
            DialogError::SessionBusy(_) => ApiError::Conflict(message),
            DialogError::Transport(_)
            | DialogError::Backend(_)
            | DialogError::SessionLock(_)
            | DialogError::Config(_) => ApiError::Internal(message),
        }
    }
}
