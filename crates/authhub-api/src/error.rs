//! Maps domain `AppError` to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use authhub_core::error::{AppError, ErrorKind};

/// Message returned for every server-side fault.
const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Always `false`.
    pub success: bool,
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Status code and wire code for an error kind.
pub fn status_for(kind: ErrorKind) -> (StatusCode, &'static str) {
    match kind {
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
        ErrorKind::Session => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::License => (StatusCode::UNAUTHORIZED, "LICENSE_EXPIRED"),
        ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::RateLimit => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Internal
        | ErrorKind::Database
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::ExternalService => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl From<AppError> for ApiErrorResponse {
    fn from(err: AppError) -> Self {
        let (_, code) = status_for(err.kind);
        let message = if err.kind.is_server_fault() {
            INTERNAL_MESSAGE.to_string()
        } else {
            err.message
        };
        Self {
            success: false,
            error: code.to_string(),
            message,
        }
    }
}

/// Wrapper so `AppError` can be returned from handlers.
///
/// Axum needs a local type to implement `IntoResponse` on; handlers return
/// `Result<_, ApiError>` and `?` converts any `AppError`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let (status, _) = status_for(err.kind);
        if err.kind.is_server_fault() {
            tracing::error!(kind = %err.kind, error = %err, "Request failed");
        }
        (status, Json(ApiErrorResponse::from(err))).into_response()
    }
}
