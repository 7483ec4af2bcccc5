//! # Arcana Web
//!
//! Axum glue shared by the identity and spreads services:
//!
//! - [`error::ApiError`]: maps the domain [`Error`](arcana_core::Error)
//!   taxonomy onto HTTP statuses (403/404/409/422/503) with a JSON body,
//!   replacing server-error details with a generic message so raw storage
//!   or transport text never reaches a caller.
//! - [`extractors`]: the [`AuthContext`](arcana_core::AuthContext)
//!   extractor (explicit request-scoped identity from trusted gateway
//!   headers) and a correlation-id extractor.
//! - [`middleware`]: the request tracing layer both binaries install.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod middleware;

pub use error::ApiError;
pub use extractors::{Caller, CorrelationId, USER_ID_HEADER, USER_ROLE_HEADER};
