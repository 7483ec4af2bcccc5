//! # Arcana Core
//!
//! Domain model and service contracts for the Arcana tarot platform.
//!
//! The platform splits ownership across two independently deployable
//! services: an **identity service** owning users, and a **spreads service**
//! owning spreads and interpretations. There is no shared database
//! transaction between them, so referential integrity across the boundary is
//! maintained by an eventually-consistent deletion pipeline (see the
//! `arcana-broker` crate) plus a synchronous internal client for the few
//! paths that need an immediate answer (see `arcana-client`).
//!
//! This crate holds everything both sides agree on:
//!
//! - [`model`]: entities and id newtypes
//! - [`error`]: the shared error taxonomy ([`Error`])
//! - [`context`]: the request-scoped caller identity ([`AuthContext`])
//! - [`event`]: the `UserDeleted` fact and its wire envelope
//! - [`event_bus`]: the broker abstraction
//! - [`draw`]: the pure card-draw engine
//! - [`stores`]: async storage and catalog traits the services are
//!   generic over
//!
//! No I/O happens here; implementations live in `arcana-store`,
//! `arcana-broker` and the service crates.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod draw;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod model;
pub mod stores;

pub use context::{AuthContext, Role};
pub use error::{Error, Result};
