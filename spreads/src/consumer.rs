//! Applies `UserDeleted` facts: the consuming end of the deletion pipeline.

use crate::service::SpreadService;
use arcana_broker::EnvelopeHandler;
use arcana_core::event::{EventEnvelope, UserDeleted};
use arcana_core::stores::{CardCatalog, DeadLetterSink, LayoutCatalog, SpreadStore, UserDirectory};
use arcana_core::{Error, Result};
use arcana_runtime::{RetryPolicy, retry_if};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

/// Handler for the `user-events` topic.
///
/// Every envelope ends in exactly one of three states before its offset is
/// committed: applied (possibly after retries), dead-lettered, or, when
/// even the dead-letter write fails, left uncommitted for redelivery.
/// `purge_user_data` is idempotent, so redelivery is always safe.
pub struct PurgeConsumer<S, L, C, U, D> {
    spreads: Arc<SpreadService<S, L, C, U>>,
    dead_letters: D,
    retry: RetryPolicy,
}

impl<S, L, C, U, D> PurgeConsumer<S, L, C, U, D>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    D: DeadLetterSink,
{
    /// Create a consumer over the spread service and a dead-letter sink.
    pub const fn new(
        spreads: Arc<SpreadService<S, L, C, U>>,
        dead_letters: D,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            spreads,
            dead_letters,
            retry,
        }
    }

    /// Route a hopeless envelope to the dead-letter store.
    ///
    /// `Ok` from here means the offset may be committed; `Err` means the
    /// event is neither applied nor recorded and must be redelivered.
    async fn dead_letter(
        &self,
        envelope: &EventEnvelope,
        error: &Error,
        retry_count: u32,
    ) -> Result<()> {
        self.dead_letters
            .record(envelope, &error.to_string(), retry_count)
            .await
    }
}

#[async_trait]
impl<S, L, C, U, D> EnvelopeHandler for PurgeConsumer<S, L, C, U, D>
where
    S: SpreadStore,
    L: LayoutCatalog,
    C: CardCatalog,
    U: UserDirectory,
    D: DeadLetterSink,
{
    async fn handle(&self, envelope: EventEnvelope) -> Result<()> {
        let fact = match UserDeleted::from_envelope(&envelope) {
            Ok(fact) => fact,
            Err(err) => {
                // A malformed fact can never be applied; record and move on.
                tracing::error!(
                    event_type = %envelope.event_type,
                    error = %err,
                    "undecodable fact dead-lettered"
                );
                return self.dead_letter(&envelope, &err, 0).await;
            }
        };

        let result = retry_if(
            self.retry.clone(),
            || self.spreads.purge_user_data(fact.user_id),
            |err| !err.is_business(),
        )
        .await;

        match result {
            Ok(removed) => {
                tracing::info!(
                    user_id = %fact.user_id,
                    event_id = %fact.event_id,
                    removed,
                    "deletion fact applied"
                );
                metrics::counter!("purge.applied").increment(1);
                Ok(())
            }
            Err(err) => {
                tracing::error!(
                    user_id = %fact.user_id,
                    event_id = %fact.event_id,
                    error = %err,
                    "purge failed after retries, dead-lettering"
                );
                #[allow(clippy::cast_possible_truncation)]
                let attempts = self.retry.max_retries as u32 + 1;
                self.dead_letter(&envelope, &err, attempts).await
            }
        }
    }

    async fn handle_undecodable(&self, payload: &[u8], error: &Error) -> Result<()> {
        tracing::error!(
            bytes = payload.len(),
            error = %error,
            "undecodable payload dead-lettered"
        );
        // No envelope could be decoded; wrap the raw bytes so the original
        // payload survives in the dead-letter store.
        let envelope = EventEnvelope {
            event_type: "undecodable".to_string(),
            event_version: 0,
            key: Vec::new(),
            data: payload.to_vec(),
            occurred_at: Utc::now(),
        };
        self.dead_letter(&envelope, error, 0).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::mocks::{
        FailingDeadLetters, FlakyStore, InMemoryStore, RecordingDeadLetters, StaticCatalog,
        StaticDirectory,
    };
    use crate::service::SpreadService;
    use arcana_core::context::AuthContext;
    use arcana_core::model::UserId;
    use chrono::Utc;
    use std::time::Duration;

    fn fast_retry() -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(2)
            .initial_delay(Duration::from_millis(1))
            .build()
    }

    type TestService<S> = Arc<SpreadService<S, StaticCatalog, StaticCatalog, StaticDirectory>>;

    fn service_over<S: SpreadStore>(
        store: S,
    ) -> (TestService<S>, StaticDirectory, arcana_core::model::LayoutId) {
        let mut catalog = StaticCatalog::with_deck(78);
        let layout_id = catalog.add_layout("three-card", 3);
        let directory = StaticDirectory::default();
        let service = Arc::new(SpreadService::new(
            store,
            catalog.clone(),
            catalog,
            directory.clone(),
        ));
        (service, directory, layout_id)
    }

    #[tokio::test]
    async fn applies_a_deletion_fact_and_purges_everything() {
        let store = InMemoryStore::default();
        let (service, directory, layout_id) = service_over(store.clone());
        let author = UserId::new();
        directory.add(author);

        let ctx = AuthContext::reader(author);
        service.create(ctx, None, layout_id).await.unwrap();
        service.create(ctx, None, layout_id).await.unwrap();

        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());
        let envelope = UserDeleted::now(author).to_envelope().unwrap();

        consumer.handle(envelope).await.unwrap();

        assert!(store.ids_by_author(author).await.unwrap().is_empty());
        assert!(dlq.entries().is_empty());
    }

    #[tokio::test]
    async fn replaying_a_fact_is_a_noop() {
        let store = InMemoryStore::default();
        let (service, _, _) = service_over(store);
        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());

        let envelope = UserDeleted::now(UserId::new()).to_envelope().unwrap();
        consumer.handle(envelope.clone()).await.unwrap();
        consumer.handle(envelope).await.unwrap();
        assert!(dlq.entries().is_empty());
    }

    #[tokio::test]
    async fn undecodable_fact_is_dead_lettered_and_committed() {
        let (service, _, _) = service_over(InMemoryStore::default());
        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());

        let envelope = EventEnvelope {
            event_type: "SomethingElse.v1".to_string(),
            event_version: 1,
            key: vec![1, 2, 3],
            data: vec![0xff; 4],
            occurred_at: Utc::now(),
        };
        // Ok means the offset would be committed.
        consumer.handle(envelope).await.unwrap();

        let entries = dlq.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].2, 0);
    }

    #[tokio::test]
    async fn undecodable_payload_is_dead_lettered_with_its_bytes() {
        let (service, _, _) = service_over(InMemoryStore::default());
        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());

        let payload = [0x00, 0xde, 0xad];
        let error = Error::Broker("undecodable envelope: trailing bytes".to_string());
        consumer.handle_undecodable(&payload, &error).await.unwrap();

        let entries = dlq.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.data, payload.to_vec());
        assert_eq!(entries[0].2, 0);
    }

    #[tokio::test]
    async fn transient_failure_is_retried_to_success() {
        let store = InMemoryStore::default();
        let flaky = FlakyStore::new(store, 2);
        let (service, _, _) = service_over(flaky);
        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());

        let envelope = UserDeleted::now(UserId::new()).to_envelope().unwrap();
        consumer.handle(envelope).await.unwrap();
        assert!(dlq.entries().is_empty());
    }

    #[tokio::test]
    async fn exhausted_retries_route_to_the_dead_letter_store() {
        let store = InMemoryStore::default();
        // More failures than the retry budget (initial + 2 retries).
        let flaky = FlakyStore::new(store, 10);
        let (service, _, _) = service_over(flaky);
        let dlq = RecordingDeadLetters::default();
        let consumer = PurgeConsumer::new(service, dlq.clone(), fast_retry());

        let user_id = UserId::new();
        let envelope = UserDeleted::now(user_id).to_envelope().unwrap();
        consumer.handle(envelope).await.unwrap();

        let entries = dlq.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.key, user_id.0.as_bytes().to_vec());
        assert_eq!(entries[0].2, 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn failing_dead_letter_store_forces_redelivery() {
        let store = InMemoryStore::default();
        let flaky = FlakyStore::new(store, 10);
        let (service, _, _) = service_over(flaky);
        let consumer = PurgeConsumer::new(service, FailingDeadLetters, fast_retry());

        let envelope = UserDeleted::now(UserId::new()).to_envelope().unwrap();
        // Err means the offset stays uncommitted.
        assert!(consumer.handle(envelope).await.is_err());
    }
}
