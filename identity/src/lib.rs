//! # Arcana Identity
//!
//! The identity service: user accounts with unique usernames, and the
//! origin of the cascade-deletion pipeline. `DELETE /users/{id}` commits
//! the local delete first, then publishes a keyed `UserDeleted` fact that
//! the spreads service consumes to purge the user's content.
//!
//! The internal existence endpoint (`GET /internal/users/{id}`) is the
//! synchronous counterpart the spreads service calls before accepting a new
//! spread.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod mocks;
pub mod publisher;
pub mod service;
pub mod store;

pub use api::{AppState, router};
pub use config::Config;
pub use publisher::DeletionPublisher;
pub use service::UserService;
pub use store::{PostgresUserStore, User, UserStore};
