//! User storage.

use arcana_core::model::UserId;
use arcana_core::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// A user account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Account id.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Persistence seam for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. `Conflict` when the username is taken.
    async fn insert(&self, user: &User) -> Result<()>;

    /// Load a user by id.
    async fn get(&self, id: UserId) -> Result<Option<User>>;

    /// Delete a user. Returns `false` when the user did not exist.
    async fn delete(&self, id: UserId) -> Result<bool>;

    /// Verify the store is reachable, for readiness checks.
    async fn ping(&self) -> Result<()>;
}

/// Connect to the identity database.
///
/// # Errors
///
/// Returns [`Error::Storage`] if the pool cannot be established.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| Error::Storage(format!("failed to connect to identity database: {e}")))
}

/// Run the identity schema migrations.
///
/// # Errors
///
/// Returns [`Error::Storage`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Storage(format!("identity migration failed: {e}")))
}

fn storage_err(context: &str, err: &sqlx::Error) -> Error {
    Error::Storage(format!("{context}: {err}"))
}

/// `PostgreSQL`-backed [`UserStore`].
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, user: &User) -> Result<()> {
        sqlx::query("INSERT INTO users (id, username, created_at) VALUES ($1, $2, $3)")
            .bind(user.id.0)
            .bind(&user.username)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Error::Conflict(format!(
                            "username '{}' is already taken",
                            user.username
                        ));
                    }
                }
                storage_err("failed to insert user", &e)
            })?;
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, created_at FROM users WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to load user", &e))?;
        Ok(row.map(|row| User {
            id: UserId(row.get::<Uuid, _>("id")),
            username: row.get("username"),
            created_at: row.get("created_at"),
        }))
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to delete user", &e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("database unreachable", &e))?;
        Ok(())
    }
}
