//! Async storage and collaborator traits.
//!
//! The services in `arcana-spreads` and `arcana-identity` are generic over
//! these traits; `arcana-store` provides the Postgres implementations and
//! the service crates ship in-memory mocks for tests. Implementations map
//! their own failures into the shared [`Error`] taxonomy. In particular, a
//! storage-level unique violation on (author, spread) must surface as
//! [`Error::Conflict`], because under concurrency the constraint, not the
//! pre-check, is the real enforcement of interpretation uniqueness.

use crate::draw::DrawnCard;
use crate::error::Result;
use crate::event::EventEnvelope;
use crate::model::{
    Card, Interpretation, InterpretationId, Layout, LayoutId, Page, Spread, SpreadId, UserId,
};
use async_trait::async_trait;

/// Fields of a spread known before persistence.
///
/// `created_at` is assigned by the store at insert time and immutable
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpread {
    /// Pre-generated spread id.
    pub id: SpreadId,
    /// Optional question text.
    pub question: Option<String>,
    /// Owning author.
    pub author_id: UserId,
    /// Layout the cards were drawn under.
    pub layout_id: LayoutId,
}

/// Storage for spreads and their cards.
#[async_trait]
pub trait SpreadStore: Send + Sync {
    /// Persist a spread and all of its drawn cards in one transaction.
    ///
    /// Card positions are the 1-based indexes of `cards` in draw order. A
    /// spread is never observable without its full card set.
    async fn insert(&self, spread: NewSpread, cards: &[DrawnCard]) -> Result<Spread>;

    /// Fetch a spread with its cards, ordered by position.
    async fn get(&self, id: SpreadId) -> Result<Option<Spread>>;

    /// Fetch just the author of a spread.
    async fn owner(&self, id: SpreadId) -> Result<Option<UserId>>;

    /// Delete a spread together with its cards and interpretations, in one
    /// transaction. Returns `false` if the spread did not exist.
    async fn delete_cascade(&self, id: SpreadId) -> Result<bool>;

    /// Ids of every spread authored by `author`, used by the user-deletion
    /// cascade. Returns an empty vector once the data is gone, which is what
    /// makes replaying a deletion fact a no-op.
    async fn ids_by_author(&self, author: UserId) -> Result<Vec<SpreadId>>;

    /// Offset-paged listing ordered by `created_at DESC, id DESC`, with a
    /// total count. Not stable under concurrent inserts.
    async fn list_page(&self, page: u32, size: u32) -> Result<Page<Spread>>;

    /// Keyset ("scroll") listing under the same order.
    ///
    /// With `after = None` returns the newest `size` spreads; otherwise the
    /// next `size` spreads strictly older than the anchor row. An unknown
    /// anchor id is a [`crate::Error::NotFound`].
    async fn list_after(&self, after: Option<SpreadId>, size: u32) -> Result<Vec<Spread>>;
}

/// Storage for interpretations.
#[async_trait]
pub trait InterpretationStore: Send + Sync {
    /// Persist a new interpretation.
    ///
    /// A unique violation on (author, spread) must be translated into
    /// [`crate::Error::Conflict`] rather than leaking as a storage error.
    async fn insert(&self, interpretation: &Interpretation) -> Result<()>;

    /// Whether an interpretation by `author` on `spread` already exists.
    async fn exists(&self, author: UserId, spread: SpreadId) -> Result<bool>;

    /// Fetch one interpretation.
    async fn get(&self, id: InterpretationId) -> Result<Option<Interpretation>>;

    /// Replace the body text. Returns the updated row, or `None` if absent.
    async fn update_body(&self, id: InterpretationId, body: &str)
    -> Result<Option<Interpretation>>;

    /// Delete one interpretation. Returns `false` if it did not exist.
    async fn delete(&self, id: InterpretationId) -> Result<bool>;
}

/// Read-only card catalog.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// The full 78-card catalog.
    async fn all(&self) -> Result<Vec<Card>>;
}

/// Read-only layout catalog.
#[async_trait]
pub trait LayoutCatalog: Send + Sync {
    /// Resolve one layout.
    async fn get(&self, id: LayoutId) -> Result<Option<Layout>>;
}

/// Existence probe for users, who live in the identity service.
///
/// The production implementation is the fallback-wrapped internal users
/// client; an `Err(ServiceUnavailable)` means the identity service could not
/// answer, which is distinct from `Ok(false)` (the user truly does not
/// exist).
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Whether the user exists right now.
    async fn exists(&self, user_id: UserId) -> Result<bool>;
}

#[async_trait]
impl<T: UserDirectory + ?Sized> UserDirectory for std::sync::Arc<T> {
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        (**self).exists(user_id).await
    }
}

/// Sink for events that exhausted their retry budget.
///
/// Routing a poison event here and committing its offset is what keeps one
/// broken key from blocking the rest of the topic.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Record a failed event together with its last error.
    async fn record(
        &self,
        envelope: &EventEnvelope,
        error_message: &str,
        retry_count: u32,
    ) -> Result<()>;
}
