//! Shared error taxonomy for the platform.
//!
//! Business errors (`NotFound`, `Conflict`, `Forbidden`, `Validation`) are
//! generated close to the violated invariant and returned to the caller
//! unchanged; they are never retried. Infrastructure failures on the
//! internal synchronous client are converted to [`Error::ServiceUnavailable`]
//! at the client boundary so no transport type ever leaks across services.

use thiserror::Error;

/// Result type alias for domain operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Platform-wide error taxonomy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of entity, e.g. "spread".
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: String,
    },

    /// A uniqueness invariant was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is neither the author nor privileged.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request payload failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The caller presented no usable identity.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// An internal dependency could not be reached.
    ///
    /// Carries the logical name of the failed service and the transport
    /// cause. Retryable at the caller's discretion.
    #[error("service '{service}' unavailable: {cause}")]
    ServiceUnavailable {
        /// Logical name of the unreachable service.
        service: String,
        /// Underlying cause, already stringified.
        cause: String,
    },

    /// A storage operation failed for non-business reasons.
    #[error("storage error: {0}")]
    Storage(String),

    /// A broker publish or subscribe failed.
    #[error("broker error: {0}")]
    Broker(String),
}

impl Error {
    /// Build a `NotFound` for an entity kind and id.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Build a `ServiceUnavailable` naming the failed service.
    pub fn unavailable(service: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            service: service.into(),
            cause: cause.into(),
        }
    }

    /// Returns `true` for errors the callee produced deliberately.
    ///
    /// Business errors are caller-actionable and must propagate unchanged;
    /// everything else is an infrastructure failure and may be retried.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Conflict(_)
                | Self::Forbidden(_)
                | Self::Validation(_)
                | Self::Unauthenticated(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_classification() {
        assert!(Error::not_found("spread", "abc").is_business());
        assert!(Error::Conflict("duplicate".into()).is_business());
        assert!(Error::Forbidden("not the author".into()).is_business());
        assert!(!Error::unavailable("users", "timeout").is_business());
        assert!(!Error::Storage("pool exhausted".into()).is_business());
    }

    #[test]
    fn unavailable_names_the_service() {
        let err = Error::unavailable("users", "connection refused");
        assert_eq!(
            err.to_string(),
            "service 'users' unavailable: connection refused"
        );
    }
}
