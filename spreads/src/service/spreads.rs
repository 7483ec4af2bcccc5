//! Spread aggregate operations.

use arcana_core::context::AuthContext;
use arcana_core::draw::draw;
use arcana_core::model::{LayoutId, Page, Spread, SpreadId, UserId};
use arcana_core::stores::{CardCatalog, LayoutCatalog, NewSpread, SpreadStore, UserDirectory};
use arcana_core::{Error, Result};

/// Spread aggregate service.
///
/// Generic over its collaborators; production wires the Postgres stores and
/// the fallback-wrapped users client, tests wire in-memory fakes.
pub struct SpreadService<S, L, C, U> {
    store: S,
    layouts: L,
    cards: C,
    users: U,
}

impl<S, L, C, U> SpreadService<S, L, C, U>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
{
    /// Create a service over its collaborators.
    pub const fn new(store: S, layouts: L, cards: C, users: U) -> Self {
        Self {
            store,
            layouts,
            cards,
            users,
        }
    }

    /// Create a spread: verify the author exists, resolve the layout, draw
    /// the cards and persist everything in one transaction.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing author or layout, `ServiceUnavailable` when
    /// the identity service cannot answer the existence probe.
    pub async fn create(
        &self,
        ctx: AuthContext,
        question: Option<String>,
        layout_id: LayoutId,
    ) -> Result<Spread> {
        if !self.users.exists(ctx.user_id).await? {
            return Err(Error::not_found("user", ctx.user_id));
        }
        let layout = self
            .layouts
            .get(layout_id)
            .await?
            .ok_or_else(|| Error::not_found("layout", layout_id))?;

        let catalog = self.cards.all().await?;
        let count = usize::try_from(layout.cards_count).unwrap_or(0);
        let drawn = draw(&catalog, count);

        let spread = self
            .store
            .insert(
                NewSpread {
                    id: SpreadId::new(),
                    question,
                    author_id: ctx.user_id,
                    layout_id,
                },
                &drawn,
            )
            .await?;

        tracing::info!(
            spread_id = %spread.id,
            author_id = %ctx.user_id,
            layout = %layout.name,
            "spread created"
        );
        metrics::counter!("spreads.created").increment(1);
        Ok(spread)
    }

    /// Fetch one spread with its cards.
    ///
    /// # Errors
    ///
    /// `NotFound` when the spread does not exist.
    pub async fn get(&self, id: SpreadId) -> Result<Spread> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("spread", id))
    }

    /// Delete one spread and everything attached to it.
    ///
    /// # Errors
    ///
    /// `NotFound` when the spread does not exist, `Forbidden` unless the
    /// caller is the author or privileged.
    pub async fn delete(&self, ctx: AuthContext, id: SpreadId) -> Result<()> {
        let author = self
            .store
            .owner(id)
            .await?
            .ok_or_else(|| Error::not_found("spread", id))?;
        if !ctx.can_mutate(author) {
            return Err(Error::Forbidden(format!(
                "caller {} may not delete spread {id}",
                ctx.user_id
            )));
        }
        if !self.store.delete_cascade(id).await? {
            // Lost a race with another delete.
            return Err(Error::not_found("spread", id));
        }
        tracing::info!(spread_id = %id, caller = %ctx.user_id, "spread deleted");
        Ok(())
    }

    /// Resolve the author of a spread, for the internal owner endpoint.
    ///
    /// # Errors
    ///
    /// `NotFound` when the spread does not exist.
    pub async fn owner(&self, id: SpreadId) -> Result<UserId> {
        self.store
            .owner(id)
            .await?
            .ok_or_else(|| Error::not_found("spread", id))
    }

    /// Remove every spread (and transitively every card and interpretation)
    /// authored by `user_id`. Returns the number of spreads removed.
    ///
    /// Naturally idempotent: a replay finds no spreads and removes nothing.
    /// Shared by the purge consumer and the internal deletion endpoint.
    ///
    /// # Errors
    ///
    /// Storage errors only; a user with no content is `Ok(0)`.
    pub async fn purge_user_data(&self, user_id: UserId) -> Result<u64> {
        let ids = self.store.ids_by_author(user_id).await?;
        let mut removed = 0u64;
        for id in ids {
            if self.store.delete_cascade(id).await? {
                removed += 1;
            }
        }
        tracing::info!(%user_id, removed, "user data purged");
        metrics::counter!("purge.spreads_removed").increment(removed);
        Ok(removed)
    }

    /// Offset-paged listing.
    ///
    /// # Errors
    ///
    /// Storage errors only.
    pub async fn list_page(&self, page: u32, size: u32) -> Result<Page<Spread>> {
        self.store.list_page(page, clamp_size(size)).await
    }

    /// Keyset ("scroll") listing.
    ///
    /// Returns the page plus the cursor for the next one, `None` when
    /// nothing older remains. One extra row is fetched to decide, so an
    /// exactly full final page carries no cursor.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown anchor id.
    pub async fn list_after(
        &self,
        after: Option<SpreadId>,
        size: u32,
    ) -> Result<(Vec<Spread>, Option<SpreadId>)> {
        let limit = clamp_size(size);
        let mut items = self.store.list_after(after, limit + 1).await?;
        let next = if items.len() > limit as usize {
            items.truncate(limit as usize);
            items.last().map(|s| s.id)
        } else {
            None
        };
        Ok((items, next))
    }

    /// Readiness probe: the card catalog must be loadable.
    ///
    /// # Errors
    ///
    /// `Storage` when the backing store is unreachable.
    pub async fn ready(&self) -> Result<()> {
        self.cards.all().await.map(|_| ())
    }
}

/// Clamp a requested page size to 1..=100.
pub(crate) const fn clamp_size(size: u32) -> u32 {
    if size == 0 {
        1
    } else if size > 100 {
        100
    } else {
        size
    }
}
