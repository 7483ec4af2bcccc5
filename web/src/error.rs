//! HTTP mapping for the domain error taxonomy.
//!
//! Handlers return `Result<_, ApiError>`; the single `From<Error>` impl is
//! the only place status codes are chosen, so the REST surface stays
//! consistent with the propagation policy: business errors pass through
//! essentially unchanged, infrastructure failures become 503, and anything
//! internal is logged and replaced with a generic 500 body.

use arcana_core::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    /// Internal detail, logged but never sent to the client.
    detail: Option<String>,
}

impl ApiError {
    /// Create an error with an explicit status.
    #[must_use]
    pub const fn new(status: StatusCode, code: &'static str, message: String) -> Self {
        Self {
            status,
            code,
            message,
            detail: None,
        }
    }

    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message.into())
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.into())
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            Error::Conflict(_) => Self::new(StatusCode::CONFLICT, "CONFLICT", err.to_string()),
            Error::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, "FORBIDDEN", err.to_string()),
            Error::Validation(_) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                err.to_string(),
            ),
            Error::Unauthenticated(_) => {
                Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", err.to_string())
            }
            Error::ServiceUnavailable { ref service, .. } => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "SERVICE_UNAVAILABLE",
                message: format!("dependency '{service}' is unavailable"),
                detail: Some(err.to_string()),
            },
            Error::Storage(_) | Error::Broker(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_SERVER_ERROR",
                message: "an internal error occurred".to_string(),
                detail: Some(err.to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                detail = self.detail.as_deref().unwrap_or(&self.message),
                "request failed"
            );
        }

        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
