//! Interpretation storage.

use crate::storage_err;
use arcana_core::model::{Interpretation, InterpretationId, SpreadId, UserId};
use arcana_core::stores::InterpretationStore;
use arcana_core::{Error, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

/// `PostgreSQL`-backed [`InterpretationStore`].
#[derive(Clone)]
pub struct PostgresInterpretationStore {
    pool: PgPool,
}

impl PostgresInterpretationStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_interpretation(row: &PgRow) -> Interpretation {
        Interpretation {
            id: InterpretationId(row.get::<Uuid, _>("id")),
            spread_id: SpreadId(row.get::<Uuid, _>("spread_id")),
            author_id: UserId(row.get::<Uuid, _>("author_id")),
            body: row.get("body"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl InterpretationStore for PostgresInterpretationStore {
    async fn insert(&self, interpretation: &Interpretation) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO interpretations (id, spread_id, author_id, body, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(interpretation.id.0)
        .bind(interpretation.spread_id.0)
        .bind(interpretation.author_id.0)
        .bind(&interpretation.body)
        .bind(interpretation.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            // Under a race the second writer lands here, not in the
            // service-level existence check.
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return Error::Conflict(format!(
                        "author {} already interpreted spread {}",
                        interpretation.author_id, interpretation.spread_id
                    ));
                }
            }
            storage_err("failed to insert interpretation", &e)
        })?;
        Ok(())
    }

    async fn exists(&self, author: UserId, spread: SpreadId) -> Result<bool> {
        let found: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM interpretations WHERE author_id = $1 AND spread_id = $2",
        )
        .bind(author.0)
        .bind(spread.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to check interpretation existence", &e))?;
        Ok(found.is_some())
    }

    async fn get(&self, id: InterpretationId) -> Result<Option<Interpretation>> {
        let row = sqlx::query(
            "SELECT id, spread_id, author_id, body, created_at FROM interpretations WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to load interpretation", &e))?;
        Ok(row.as_ref().map(Self::row_to_interpretation))
    }

    async fn update_body(
        &self,
        id: InterpretationId,
        body: &str,
    ) -> Result<Option<Interpretation>> {
        let row = sqlx::query(
            r"
            UPDATE interpretations
            SET body = $2
            WHERE id = $1
            RETURNING id, spread_id, author_id, body, created_at
            ",
        )
        .bind(id.0)
        .bind(body)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to update interpretation", &e))?;
        Ok(row.as_ref().map(Self::row_to_interpretation))
    }

    async fn delete(&self, id: InterpretationId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM interpretations WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(|e| storage_err("failed to delete interpretation", &e))?;
        Ok(result.rows_affected() > 0)
    }
}
