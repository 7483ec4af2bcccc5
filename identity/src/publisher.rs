//! Publishes `UserDeleted` facts after a local delete commits.

use arcana_core::event::UserDeleted;
use arcana_core::event_bus::EventBus;
use arcana_core::model::UserId;
use arcana_core::{Error, Result};
use arcana_runtime::{RetryPolicy, retry_if};
use std::sync::Arc;

/// Deletion fact publisher.
///
/// Publish happens strictly after the local delete has committed, so the
/// worst failure mode is a deleted user whose content purge is delayed,
/// never a purge for a user who still exists. Broker errors are retried
/// with backoff before the publisher gives up.
pub struct DeletionPublisher {
    bus: Arc<dyn EventBus>,
    topic: String,
    retry: RetryPolicy,
}

impl DeletionPublisher {
    /// Create a publisher for the given topic.
    pub fn new(bus: Arc<dyn EventBus>, topic: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            bus,
            topic: topic.into(),
            retry,
        }
    }

    /// Publish one `UserDeleted` fact, keyed by the user id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Broker`] once the retry budget is spent.
    pub async fn publish_deleted(&self, user_id: UserId) -> Result<()> {
        let fact = UserDeleted::now(user_id);
        let envelope = fact.to_envelope()?;

        retry_if(
            self.retry.clone(),
            || self.bus.publish(&self.topic, &envelope),
            |_| true, // every broker error is transient from here
        )
        .await
        .map_err(|e| Error::Broker(e.to_string()))?;

        tracing::info!(
            %user_id,
            event_id = %fact.event_id,
            topic = %self.topic,
            "UserDeleted published"
        );
        metrics::counter!("identity.user_deleted_published").increment(1);
        Ok(())
    }
}
