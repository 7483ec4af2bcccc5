//! Client error classification.

use arcana_core::Error;
use thiserror::Error as ThisError;

/// Outcome classification for an internal synchronous call.
///
/// The split drives every downstream policy decision: business errors are
/// final answers from the callee and must reach the caller unchanged, while
/// infrastructure errors are transient transport trouble that retry and
/// circuit-breaking are allowed to act on.
#[derive(Debug, ThisError)]
pub enum ClientError {
    /// The callee understood the request and rejected it.
    #[error(transparent)]
    Business(Error),
    /// The callee could not be reached or gave no usable answer.
    #[error("infrastructure failure: {detail}")]
    Infrastructure {
        /// What went wrong at the transport level.
        detail: String,
    },
}

impl ClientError {
    /// True when the callee itself produced this answer.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(self, Self::Business(_))
    }

    /// Collapse into a domain error, attributing infrastructure failures
    /// to the named service.
    #[must_use]
    pub fn into_domain(self, service: &'static str) -> Error {
        match self {
            Self::Business(err) => err,
            Self::Infrastructure { detail } => Error::unavailable(service, detail),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            err.to_string()
        };
        Self::Infrastructure { detail }
    }
}

/// Map a non-success response to a [`ClientError`].
///
/// 4xx statuses are explicit answers from the callee and map onto the
/// domain taxonomy; everything else is infrastructure.
pub(crate) fn from_status(
    status: reqwest::StatusCode,
    entity: &'static str,
    id: &str,
    body: &str,
) -> ClientError {
    use reqwest::StatusCode;

    let message = if body.is_empty() {
        format!("{entity} {id}: status {status}")
    } else {
        body.to_string()
    };

    match status {
        StatusCode::NOT_FOUND => ClientError::Business(Error::not_found(entity, id)),
        StatusCode::CONFLICT => ClientError::Business(Error::Conflict(message)),
        StatusCode::FORBIDDEN => ClientError::Business(Error::Forbidden(message)),
        StatusCode::UNAUTHORIZED => ClientError::Business(Error::Unauthenticated(message)),
        status if status.is_client_error() => ClientError::Business(Error::Validation(message)),
        status => ClientError::Infrastructure {
            detail: format!("unexpected status {status}: {message}"),
        },
    }
}
