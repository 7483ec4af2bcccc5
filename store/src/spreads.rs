//! Spread storage.

use crate::storage_err;
use arcana_core::draw::DrawnCard;
use arcana_core::model::{Page, Spread, SpreadCard, SpreadId, UserId};
use arcana_core::stores::{NewSpread, SpreadStore};
use arcana_core::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, postgres::PgRow};
use std::collections::HashMap;
use uuid::Uuid;

/// `PostgreSQL`-backed [`SpreadStore`].
#[derive(Clone)]
pub struct PostgresSpreadStore {
    pool: PgPool,
}

impl PostgresSpreadStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_spread(row: &PgRow) -> Spread {
        Spread {
            id: SpreadId(row.get::<Uuid, _>("id")),
            question: row.get("question"),
            author_id: UserId(row.get::<Uuid, _>("author_id")),
            layout_id: row.get::<Uuid, _>("layout_id").into(),
            created_at: row.get("created_at"),
            cards: Vec::new(),
        }
    }

    /// Load the cards of the given spreads in one query and attach them.
    async fn attach_cards(&self, spreads: &mut [Spread]) -> Result<()> {
        if spreads.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = spreads.iter().map(|s| s.id.0).collect();
        let rows = sqlx::query(
            r"
            SELECT sc.spread_id, sc.card_id, c.name AS card_name, sc.position, sc.reversed
            FROM spread_cards sc
            JOIN cards c ON c.id = sc.card_id
            WHERE sc.spread_id = ANY($1)
            ORDER BY sc.spread_id, sc.position
            ",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("failed to load spread cards", &e))?;

        let mut by_spread: HashMap<Uuid, Vec<SpreadCard>> = HashMap::new();
        for row in rows {
            by_spread
                .entry(row.get("spread_id"))
                .or_default()
                .push(SpreadCard {
                    card_id: row.get::<Uuid, _>("card_id").into(),
                    card_name: row.get("card_name"),
                    position: row.get("position"),
                    reversed: row.get("reversed"),
                });
        }
        for spread in spreads {
            spread.cards = by_spread.remove(&spread.id.0).unwrap_or_default();
        }
        Ok(())
    }

    /// Cascade-delete one spread inside an open transaction.
    ///
    /// Interpretations and cards go first, then the spread row; the whole
    /// cascade is invisible to readers until the transaction commits.
    async fn delete_in_tx(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        id: SpreadId,
    ) -> Result<bool> {
        sqlx::query("DELETE FROM interpretations WHERE spread_id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_err("failed to delete interpretations", &e))?;
        sqlx::query("DELETE FROM spread_cards WHERE spread_id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_err("failed to delete spread cards", &e))?;
        let result = sqlx::query("DELETE FROM spreads WHERE id = $1")
            .bind(id.0)
            .execute(&mut **tx)
            .await
            .map_err(|e| storage_err("failed to delete spread", &e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl SpreadStore for PostgresSpreadStore {
    async fn insert(&self, spread: NewSpread, cards: &[DrawnCard]) -> Result<Spread> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin transaction", &e))?;

        let created_at: DateTime<Utc> = sqlx::query_scalar(
            r"
            INSERT INTO spreads (id, question, author_id, layout_id)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            ",
        )
        .bind(spread.id.0)
        .bind(&spread.question)
        .bind(spread.author_id.0)
        .bind(spread.layout_id.0)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| storage_err("failed to insert spread", &e))?;

        let mut spread_cards = Vec::with_capacity(cards.len());
        for (index, drawn) in cards.iter().enumerate() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let position = index as i32 + 1;
            sqlx::query(
                r"
                INSERT INTO spread_cards (id, spread_id, card_id, position, reversed)
                VALUES ($1, $2, $3, $4, $5)
                ",
            )
            .bind(Uuid::new_v4())
            .bind(spread.id.0)
            .bind(drawn.card.id.0)
            .bind(position)
            .bind(drawn.reversed)
            .execute(&mut *tx)
            .await
            .map_err(|e| storage_err("failed to insert spread card", &e))?;

            spread_cards.push(SpreadCard {
                card_id: drawn.card.id,
                card_name: drawn.card.name.clone(),
                position,
                reversed: drawn.reversed,
            });
        }

        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit spread", &e))?;

        tracing::debug!(
            spread_id = %spread.id,
            author_id = %spread.author_id,
            cards = spread_cards.len(),
            "spread persisted"
        );

        Ok(Spread {
            id: spread.id,
            question: spread.question,
            author_id: spread.author_id,
            layout_id: spread.layout_id,
            created_at,
            cards: spread_cards,
        })
    }

    async fn get(&self, id: SpreadId) -> Result<Option<Spread>> {
        let row = sqlx::query(
            "SELECT id, question, author_id, layout_id, created_at FROM spreads WHERE id = $1",
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_err("failed to load spread", &e))?;

        let Some(row) = row else { return Ok(None) };
        let mut spreads = vec![Self::row_to_spread(&row)];
        self.attach_cards(&mut spreads).await?;
        Ok(spreads.pop())
    }

    async fn owner(&self, id: SpreadId) -> Result<Option<UserId>> {
        let author: Option<Uuid> = sqlx::query_scalar("SELECT author_id FROM spreads WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| storage_err("failed to load spread owner", &e))?;
        Ok(author.map(UserId))
    }

    async fn delete_cascade(&self, id: SpreadId) -> Result<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_err("failed to begin transaction", &e))?;
        let deleted = Self::delete_in_tx(&mut tx, id).await?;
        tx.commit()
            .await
            .map_err(|e| storage_err("failed to commit cascade delete", &e))?;
        Ok(deleted)
    }

    async fn ids_by_author(&self, author: UserId) -> Result<Vec<SpreadId>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM spreads WHERE author_id = $1")
            .bind(author.0)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_err("failed to list spreads by author", &e))?;
        Ok(ids.into_iter().map(SpreadId).collect())
    }

    async fn list_page(&self, page: u32, size: u32) -> Result<Page<Spread>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM spreads")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| storage_err("failed to count spreads", &e))?;

        let rows = sqlx::query(
            r"
            SELECT id, question, author_id, layout_id, created_at
            FROM spreads
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(size))
        .bind(i64::from(page) * i64::from(size))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| storage_err("failed to list spreads", &e))?;

        let mut items: Vec<Spread> = rows.iter().map(Self::row_to_spread).collect();
        self.attach_cards(&mut items).await?;

        #[allow(clippy::cast_sign_loss)]
        Ok(Page {
            items,
            page,
            size,
            total: total as u64,
        })
    }

    async fn list_after(&self, after: Option<SpreadId>, size: u32) -> Result<Vec<Spread>> {
        let rows = match after {
            None => sqlx::query(
                r"
                SELECT id, question, author_id, layout_id, created_at
                FROM spreads
                ORDER BY created_at DESC, id DESC
                LIMIT $1
                ",
            )
            .bind(i64::from(size))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| storage_err("failed to scroll spreads", &e))?,
            Some(anchor) => {
                let anchor_created: Option<DateTime<Utc>> =
                    sqlx::query_scalar("SELECT created_at FROM spreads WHERE id = $1")
                        .bind(anchor.0)
                        .fetch_optional(&self.pool)
                        .await
                        .map_err(|e| storage_err("failed to resolve scroll anchor", &e))?;
                let anchor_created =
                    anchor_created.ok_or_else(|| Error::not_found("spread", anchor))?;

                // Row-value comparison gives "strictly older under
                // (created_at DESC, id DESC)" in one index-friendly predicate.
                sqlx::query(
                    r"
                    SELECT id, question, author_id, layout_id, created_at
                    FROM spreads
                    WHERE (created_at, id) < ($1, $2)
                    ORDER BY created_at DESC, id DESC
                    LIMIT $3
                    ",
                )
                .bind(anchor_created)
                .bind(anchor.0)
                .bind(i64::from(size))
                .fetch_all(&self.pool)
                .await
                .map_err(|e| storage_err("failed to scroll spreads", &e))?
            }
        };

        let mut items: Vec<Spread> = rows.iter().map(Self::row_to_spread).collect();
        self.attach_cards(&mut items).await?;
        Ok(items)
    }
}
