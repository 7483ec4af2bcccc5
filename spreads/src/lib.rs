//! # Arcana Spreads
//!
//! The spreads service: tarot spreads and their interpretations, plus the
//! consuming end of the cross-service deletion pipeline.
//!
//! - [`service::SpreadService`]: spread creation (author check, layout
//!   resolution, card draw, one-transaction persist), cascade deletion and
//!   the purge shared by the consumer and the internal endpoint.
//! - [`service::InterpretationService`]: the one-interpretation-per-
//!   (author, spread) invariant and author-or-oracle authorization.
//! - [`consumer::PurgeConsumer`]: applies `UserDeleted` facts with bounded
//!   retries and a dead-letter exit.
//! - [`api`]: the axum surface, including keyset scrolling with an
//!   `X-After` cursor header and the internal owner/purge endpoints.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod consumer;
pub mod directory;
pub mod mocks;
pub mod service;
pub mod state;

pub use api::router;
pub use config::Config;
pub use consumer::PurgeConsumer;
pub use directory::RemoteUserDirectory;
pub use service::{InterpretationService, SpreadService};
pub use state::AppState;
