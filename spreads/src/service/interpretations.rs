//! Interpretation operations and the one-per-(author, spread) invariant.

use arcana_core::context::AuthContext;
use arcana_core::model::{Interpretation, InterpretationId, SpreadId};
use arcana_core::stores::{InterpretationStore, SpreadStore, UserDirectory};
use arcana_core::{Error, Result};
use chrono::Utc;

/// Interpretation service.
///
/// The uniqueness invariant is enforced twice: a pre-check here for the
/// common case, and the database constraint for races. Both surface as the
/// same `Conflict`.
pub struct InterpretationService<S, I, U> {
    spreads: S,
    store: I,
    users: U,
}

impl<S, I, U> InterpretationService<S, I, U>
where
    S: SpreadStore,
    I: InterpretationStore,
    U: UserDirectory,
{
    /// Create a service over the spread and interpretation stores and the
    /// user directory.
    pub const fn new(spreads: S, store: I, users: U) -> Self {
        Self {
            spreads,
            store,
            users,
        }
    }

    /// Attach an interpretation to a spread.
    ///
    /// The author must still exist in the identity service; a just-deleted
    /// user cannot attach new content while their purge is in flight.
    ///
    /// # Errors
    ///
    /// `NotFound` when the author or the spread does not exist, `Validation`
    /// for an empty body, `Conflict` when the caller already interpreted
    /// this spread, `ServiceUnavailable` when the identity service cannot
    /// answer.
    pub async fn add(
        &self,
        ctx: AuthContext,
        spread_id: SpreadId,
        body: &str,
    ) -> Result<Interpretation> {
        let body = non_empty(body)?;
        if !self.users.exists(ctx.user_id).await? {
            return Err(Error::not_found("user", ctx.user_id));
        }
        if self.spreads.owner(spread_id).await?.is_none() {
            return Err(Error::not_found("spread", spread_id));
        }
        if self.store.exists(ctx.user_id, spread_id).await? {
            return Err(Error::Conflict(format!(
                "author {} already interpreted spread {spread_id}",
                ctx.user_id
            )));
        }

        let interpretation = Interpretation {
            id: InterpretationId::new(),
            spread_id,
            author_id: ctx.user_id,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        // The second writer of a race passes the pre-check and fails here,
        // where the store translates the unique violation into Conflict.
        self.store.insert(&interpretation).await?;

        tracing::info!(
            interpretation_id = %interpretation.id,
            spread_id = %spread_id,
            author_id = %ctx.user_id,
            "interpretation added"
        );
        Ok(interpretation)
    }

    /// Replace the body of an interpretation.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent or attached to a different spread,
    /// `Forbidden` unless the caller is the author or privileged,
    /// `Validation` for an empty body.
    pub async fn update(
        &self,
        ctx: AuthContext,
        spread_id: SpreadId,
        id: InterpretationId,
        body: &str,
    ) -> Result<Interpretation> {
        let body = non_empty(body)?;
        let existing = self.resolve(spread_id, id).await?;
        if !ctx.can_mutate(existing.author_id) {
            return Err(Error::Forbidden(format!(
                "caller {} may not edit interpretation {id}",
                ctx.user_id
            )));
        }
        self.store
            .update_body(id, body)
            .await?
            .ok_or_else(|| Error::not_found("interpretation", id))
    }

    /// Delete an interpretation.
    ///
    /// # Errors
    ///
    /// `NotFound` when absent or attached to a different spread,
    /// `Forbidden` unless the caller is the author or privileged.
    pub async fn delete(
        &self,
        ctx: AuthContext,
        spread_id: SpreadId,
        id: InterpretationId,
    ) -> Result<()> {
        let existing = self.resolve(spread_id, id).await?;
        if !ctx.can_mutate(existing.author_id) {
            return Err(Error::Forbidden(format!(
                "caller {} may not delete interpretation {id}",
                ctx.user_id
            )));
        }
        self.store.delete(id).await?;
        tracing::info!(interpretation_id = %id, caller = %ctx.user_id, "interpretation deleted");
        Ok(())
    }

    /// Load an interpretation and verify it belongs to `spread_id`.
    ///
    /// An id under the wrong spread is indistinguishable from a missing one.
    async fn resolve(&self, spread_id: SpreadId, id: InterpretationId) -> Result<Interpretation> {
        let found = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("interpretation", id))?;
        if found.spread_id != spread_id {
            return Err(Error::not_found("interpretation", id));
        }
        Ok(found)
    }
}

fn non_empty(body: &str) -> Result<&str> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Err(Error::Validation(
            "interpretation body must not be empty".to_string(),
        ));
    }
    Ok(trimmed)
}
