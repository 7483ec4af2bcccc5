//! Custom Axum extractors.
//!
//! The gateway terminates authentication and forwards the verified caller
//! identity as plain headers; [`Caller`] turns those headers into the
//! explicit [`AuthContext`] value the services take as a parameter. Internal
//! routes (service-to-service) carry no caller headers and simply do not use
//! the extractor.

use crate::error::ApiError;
use arcana_core::{AuthContext, Role, model::UserId};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

/// Header carrying the gateway-authenticated user id.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Header carrying the gateway-resolved role (`reader` or `oracle`).
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Extractor producing the request's [`AuthContext`].
///
/// Rejects with 401 when the user-id header is missing or not a UUID. A
/// missing or unknown role header degrades to [`Role::Reader`].
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub AuthContext);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(UserId)
            .ok_or_else(|| ApiError::unauthorized("missing or invalid X-User-Id header"))?;

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map_or(Role::Reader, Role::parse);

        Ok(Self(AuthContext { user_id, role }))
    }
}

/// Correlation ID for request tracing.
///
/// Read from `X-Correlation-ID`, or a fresh UUID v4 when absent.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let correlation_id = parts
            .headers
            .get("X-Correlation-ID")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}
