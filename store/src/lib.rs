//! # Arcana Store
//!
//! `PostgreSQL` implementations of the storage traits in
//! [`arcana_core::stores`], plus the dead-letter store for the deletion
//! pipeline and the migrations that create the schema and seed the card and
//! layout catalogs.
//!
//! Queries are runtime-checked (`sqlx::query` with binds) so the crate
//! builds without a live database. Two error translations matter:
//!
//! - any sqlx failure becomes [`arcana_core::Error::Storage`] with the raw
//!   text kept server-side;
//! - a unique violation on `interpretations (author_id, spread_id)` becomes
//!   [`arcana_core::Error::Conflict`], because the constraint is the real
//!   enforcement of interpretation uniqueness under concurrent writers.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod catalog;
mod dead_letter;
mod interpretations;
mod spreads;

pub use catalog::PostgresCatalog;
pub use dead_letter::{DeadLetterStore, FailedEvent};
pub use interpretations::PostgresInterpretationStore;
pub use spreads::PostgresSpreadStore;

use arcana_core::{Error, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

/// Connect a pool with the platform's defaults.
///
/// # Errors
///
/// Returns [`Error::Storage`] if the pool cannot be established.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(url)
        .await
        .map_err(|e| Error::Storage(format!("failed to connect to postgres: {e}")))
}

/// Run the spreads-service migrations.
///
/// # Errors
///
/// Returns [`Error::Storage`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Storage(format!("migration failed: {e}")))?;
    Ok(())
}

/// Map a sqlx error to the domain taxonomy.
pub(crate) fn storage_err(context: &str, err: &sqlx::Error) -> Error {
    Error::Storage(format!("{context}: {err}"))
}
