//! # Arcana Client
//!
//! Internal synchronous clients for service-to-service calls.
//!
//! Two async traits define the cross-service questions: [`UsersApi`] (does
//! this user exist?) asked by the spreads service, and
//! [`SpreadsInternalApi`] (who owns this spread? purge this user's data
//! now) asked by the identity service. The reqwest transport adapters talk
//! directly to the peer service with an explicit per-request timeout.
//!
//! Production wiring always goes through the fallback decorators
//! ([`UsersApiFallback`], [`SpreadsInternalFallback`]): they add a circuit
//! breaker and collapse every infrastructure failure into
//! [`arcana_core::Error::ServiceUnavailable`] naming the callee, so
//! transport detail never leaks past this crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod fallback;
pub mod spreads;
pub mod users;

pub use error::ClientError;
pub use fallback::{SpreadsInternalFallback, UsersApiFallback};
pub use spreads::{HttpSpreadsClient, SpreadsInternalApi};
pub use users::{HttpUsersClient, UsersApi};
