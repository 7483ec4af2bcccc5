//! Read-only card and layout catalogs.

use crate::storage_err;
use arcana_core::Result;
use arcana_core::model::{Arcana, Card, Layout, LayoutId};
use arcana_core::stores::{CardCatalog, LayoutCatalog};
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// `PostgreSQL`-backed catalog, serving both cards and layouts.
///
/// Both tables are seeded by migration and never written at runtime.
#[derive(Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    /// Create a catalog over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardCatalog for PostgresCatalog {
    async fn all(&self) -> Result<Vec<Card>> {
        let rows = sqlx::query("SELECT id, name, arcana FROM cards ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_err("failed to load card catalog", &e))?;

        Ok(rows
            .iter()
            .map(|row| Card {
                id: row.get::<Uuid, _>("id").into(),
                name: row.get("name"),
                arcana: Arcana::parse(&row.get::<String, _>("arcana")).unwrap_or(Arcana::Minor),
            })
            .collect())
    }
}

#[async_trait]
impl LayoutCatalog for PostgresCatalog {
    async fn get(&self, id: LayoutId) -> Result<Option<Layout>> {
        let row = sqlx::query("SELECT id, name, cards_count FROM layouts WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to load layout", &e))?;

        Ok(row.map(|row| Layout {
            id: row.get::<Uuid, _>("id").into(),
            name: row.get("name"),
            cards_count: row.get("cards_count"),
        }))
    }
}
