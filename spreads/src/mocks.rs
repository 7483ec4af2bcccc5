//! In-memory fakes for tests.
//!
//! [`InMemoryStore`] backs both spread and interpretation storage from one
//! shared map, so cascade deletion and the (author, spread) uniqueness
//! constraint behave like the real schema, atomically under one lock.

use arcana_core::draw::DrawnCard;
use arcana_core::event::EventEnvelope;
use arcana_core::model::{
    Arcana, Card, CardId, Interpretation, InterpretationId, Layout, LayoutId, Page, Spread,
    SpreadCard, SpreadId, UserId,
};
use arcana_core::stores::{
    CardCatalog, DeadLetterSink, InterpretationStore, LayoutCatalog, NewSpread, SpreadStore,
    UserDirectory,
};
use arcana_core::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn poisoned() -> Error {
    Error::Storage("mock store lock poisoned".to_string())
}

#[derive(Default)]
struct StoreInner {
    spreads: HashMap<SpreadId, Spread>,
    interpretations: HashMap<InterpretationId, Interpretation>,
}

/// Shared in-memory storage implementing both store traits.
#[derive(Default, Clone)]
pub struct InMemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl InMemoryStore {
    fn lock(&self) -> Result<MutexGuard<'_, StoreInner>> {
        self.inner.lock().map_err(|_| poisoned())
    }

    /// Spreads ordered newest-first, ties broken by descending id.
    fn ordered(inner: &StoreInner) -> Vec<Spread> {
        let mut spreads: Vec<Spread> = inner.spreads.values().cloned().collect();
        spreads.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.id.0.cmp(&a.id.0))
        });
        spreads
    }

    /// Number of interpretations currently stored.
    ///
    /// # Errors
    ///
    /// `Storage` if the lock is poisoned.
    pub fn interpretation_count(&self) -> Result<usize> {
        Ok(self.lock()?.interpretations.len())
    }
}

#[async_trait]
impl SpreadStore for InMemoryStore {
    async fn insert(&self, spread: NewSpread, cards: &[DrawnCard]) -> Result<Spread> {
        let mut inner = self.lock()?;
        let cards = cards
            .iter()
            .enumerate()
            .map(|(index, drawn)| SpreadCard {
                card_id: drawn.card.id,
                card_name: drawn.card.name.clone(),
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                position: index as i32 + 1,
                reversed: drawn.reversed,
            })
            .collect();
        let spread = Spread {
            id: spread.id,
            question: spread.question,
            author_id: spread.author_id,
            layout_id: spread.layout_id,
            created_at: Utc::now(),
            cards,
        };
        inner.spreads.insert(spread.id, spread.clone());
        Ok(spread)
    }

    async fn get(&self, id: SpreadId) -> Result<Option<Spread>> {
        Ok(self.lock()?.spreads.get(&id).cloned())
    }

    async fn owner(&self, id: SpreadId) -> Result<Option<UserId>> {
        Ok(self.lock()?.spreads.get(&id).map(|s| s.author_id))
    }

    async fn delete_cascade(&self, id: SpreadId) -> Result<bool> {
        let mut inner = self.lock()?;
        let existed = inner.spreads.remove(&id).is_some();
        inner.interpretations.retain(|_, i| i.spread_id != id);
        Ok(existed)
    }

    async fn ids_by_author(&self, author: UserId) -> Result<Vec<SpreadId>> {
        Ok(self
            .lock()?
            .spreads
            .values()
            .filter(|s| s.author_id == author)
            .map(|s| s.id)
            .collect())
    }

    async fn list_page(&self, page: u32, size: u32) -> Result<Page<Spread>> {
        let inner = self.lock()?;
        let ordered = Self::ordered(&inner);
        let total = ordered.len() as u64;
        let items = ordered
            .into_iter()
            .skip(page as usize * size as usize)
            .take(size as usize)
            .collect();
        Ok(Page {
            items,
            page,
            size,
            total,
        })
    }

    async fn list_after(&self, after: Option<SpreadId>, size: u32) -> Result<Vec<Spread>> {
        let inner = self.lock()?;
        let ordered = Self::ordered(&inner);
        let start = match after {
            None => 0,
            Some(anchor) => {
                let position = ordered
                    .iter()
                    .position(|s| s.id == anchor)
                    .ok_or_else(|| Error::not_found("spread", anchor))?;
                position + 1
            }
        };
        Ok(ordered
            .into_iter()
            .skip(start)
            .take(size as usize)
            .collect())
    }
}

#[async_trait]
impl InterpretationStore for InMemoryStore {
    async fn insert(&self, interpretation: &Interpretation) -> Result<()> {
        let mut inner = self.lock()?;
        // Check and insert under one lock, like the DB constraint.
        let duplicate = inner.interpretations.values().any(|i| {
            i.author_id == interpretation.author_id && i.spread_id == interpretation.spread_id
        });
        if duplicate {
            return Err(Error::Conflict(format!(
                "author {} already interpreted spread {}",
                interpretation.author_id, interpretation.spread_id
            )));
        }
        inner
            .interpretations
            .insert(interpretation.id, interpretation.clone());
        Ok(())
    }

    async fn exists(&self, author: UserId, spread: SpreadId) -> Result<bool> {
        Ok(self
            .lock()?
            .interpretations
            .values()
            .any(|i| i.author_id == author && i.spread_id == spread))
    }

    async fn get(&self, id: InterpretationId) -> Result<Option<Interpretation>> {
        Ok(self.lock()?.interpretations.get(&id).cloned())
    }

    async fn update_body(
        &self,
        id: InterpretationId,
        body: &str,
    ) -> Result<Option<Interpretation>> {
        let mut inner = self.lock()?;
        Ok(inner.interpretations.get_mut(&id).map(|i| {
            i.body = body.to_string();
            i.clone()
        }))
    }

    async fn delete(&self, id: InterpretationId) -> Result<bool> {
        Ok(self.lock()?.interpretations.remove(&id).is_some())
    }
}

/// Build a deck of `n` distinct cards.
#[must_use]
pub fn deck(n: usize) -> Vec<Card> {
    (0..n)
        .map(|i| Card {
            id: CardId::new(),
            name: format!("Card {i}"),
            arcana: if i < 22 { Arcana::Major } else { Arcana::Minor },
        })
        .collect()
}

/// Static card and layout catalog.
#[derive(Default, Clone)]
pub struct StaticCatalog {
    cards: Vec<Card>,
    layouts: HashMap<LayoutId, Layout>,
}

impl StaticCatalog {
    /// Catalog with an `n`-card deck and no layouts.
    #[must_use]
    pub fn with_deck(n: usize) -> Self {
        Self {
            cards: deck(n),
            layouts: HashMap::new(),
        }
    }

    /// Register a layout drawing `cards_count` cards, returning its id.
    pub fn add_layout(&mut self, name: &str, cards_count: i32) -> LayoutId {
        let id = LayoutId::new();
        self.layouts.insert(
            id,
            Layout {
                id,
                name: name.to_string(),
                cards_count,
            },
        );
        id
    }
}

#[async_trait]
impl CardCatalog for StaticCatalog {
    async fn all(&self) -> Result<Vec<Card>> {
        Ok(self.cards.clone())
    }
}

#[async_trait]
impl LayoutCatalog for StaticCatalog {
    async fn get(&self, id: LayoutId) -> Result<Option<Layout>> {
        Ok(self.layouts.get(&id).cloned())
    }
}

/// [`UserDirectory`] backed by a fixed set of known users.
#[derive(Default, Clone)]
pub struct StaticDirectory {
    known: Arc<Mutex<HashSet<UserId>>>,
}

impl StaticDirectory {
    /// Mark a user as existing.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[allow(clippy::unwrap_used)]
    pub fn add(&self, user_id: UserId) {
        self.known.lock().unwrap().insert(user_id);
    }
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        Ok(self.known.lock().map_err(|_| poisoned())?.contains(&user_id))
    }
}

/// [`UserDirectory`] whose backing service is down.
#[derive(Default, Clone, Copy)]
pub struct UnavailableDirectory;

#[async_trait]
impl UserDirectory for UnavailableDirectory {
    async fn exists(&self, _user_id: UserId) -> Result<bool> {
        Err(Error::unavailable("identity", "connection refused"))
    }
}

/// [`DeadLetterSink`] recording every entry.
#[derive(Default, Clone)]
pub struct RecordingDeadLetters {
    entries: Arc<Mutex<Vec<(EventEnvelope, String, u32)>>>,
}

impl RecordingDeadLetters {
    /// Everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn entries(&self) -> Vec<(EventEnvelope, String, u32)> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterSink for RecordingDeadLetters {
    async fn record(
        &self,
        envelope: &EventEnvelope,
        error_message: &str,
        retry_count: u32,
    ) -> Result<()> {
        self.entries
            .lock()
            .map_err(|_| poisoned())?
            .push((envelope.clone(), error_message.to_string(), retry_count));
        Ok(())
    }
}

/// [`DeadLetterSink`] that always fails.
#[derive(Default, Clone, Copy)]
pub struct FailingDeadLetters;

#[async_trait]
impl DeadLetterSink for FailingDeadLetters {
    async fn record(&self, _: &EventEnvelope, _: &str, _: u32) -> Result<()> {
        Err(Error::Storage("dead letter store unavailable".to_string()))
    }
}

/// [`SpreadStore`] wrapper injecting a bounded number of failures into
/// `ids_by_author`, for retry-path tests.
#[derive(Clone)]
pub struct FlakyStore {
    inner: InMemoryStore,
    remaining_failures: Arc<AtomicUsize>,
}

impl FlakyStore {
    /// Fail the first `failures` calls to `ids_by_author`, then behave.
    #[must_use]
    pub fn new(inner: InMemoryStore, failures: usize) -> Self {
        Self {
            inner,
            remaining_failures: Arc::new(AtomicUsize::new(failures)),
        }
    }
}

#[async_trait]
impl SpreadStore for FlakyStore {
    async fn insert(&self, spread: NewSpread, cards: &[DrawnCard]) -> Result<Spread> {
        SpreadStore::insert(&self.inner, spread, cards).await
    }

    async fn get(&self, id: SpreadId) -> Result<Option<Spread>> {
        SpreadStore::get(&self.inner, id).await
    }

    async fn owner(&self, id: SpreadId) -> Result<Option<UserId>> {
        self.inner.owner(id).await
    }

    async fn delete_cascade(&self, id: SpreadId) -> Result<bool> {
        self.inner.delete_cascade(id).await
    }

    async fn ids_by_author(&self, author: UserId) -> Result<Vec<SpreadId>> {
        let remaining = self.remaining_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.remaining_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Storage("transient failure".to_string()));
        }
        self.inner.ids_by_author(author).await
    }

    async fn list_page(&self, page: u32, size: u32) -> Result<Page<Spread>> {
        self.inner.list_page(page, size).await
    }

    async fn list_after(&self, after: Option<SpreadId>, size: u32) -> Result<Vec<Spread>> {
        self.inner.list_after(after, size).await
    }
}
