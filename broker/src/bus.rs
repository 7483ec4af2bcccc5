//! Producer side: keyed publishing over rdkafka.

use arcana_core::event::EventEnvelope;
use arcana_core::event_bus::{EventBus, EventBusError};
use rdkafka::config::ClientConfig;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Kafka-compatible event bus.
///
/// Publishes bincode-encoded [`EventEnvelope`]s keyed by the envelope's
/// partition key. Acks default to `all` so a publish only resolves once the
/// fact is durable; the deletion pipeline depends on "publisher returned
/// success ⇒ the fact will eventually be delivered".
pub struct RedpandaEventBus {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
}

impl RedpandaEventBus {
    /// Create a bus with default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if the producer cannot be
    /// created from the given broker list.
    pub fn new(brokers: &str) -> Result<Self, EventBusError> {
        Self::builder().brokers(brokers).build()
    }

    /// Create a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RedpandaEventBusBuilder {
        RedpandaEventBusBuilder::default()
    }

    /// The configured broker list.
    #[must_use]
    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

/// Builder for [`RedpandaEventBus`].
#[derive(Default)]
pub struct RedpandaEventBusBuilder {
    brokers: Option<String>,
    acks: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaEventBusBuilder {
    /// Set the comma-separated broker addresses.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Set the producer acknowledgment mode ("0", "1" or "all").
    ///
    /// Default: "all".
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Set the producer send timeout. Default: 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the bus.
    ///
    /// # Errors
    ///
    /// Returns [`EventBusError::ConnectionFailed`] if brokers are not set or
    /// the producer cannot be created.
    pub fn build(self) -> Result<RedpandaEventBus, EventBusError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::ConnectionFailed("brokers not configured".to_string()))?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.acks.as_deref().unwrap_or("all"))
            .create()
            .map_err(|e| {
                EventBusError::ConnectionFailed(format!("failed to create producer: {e}"))
            })?;

        tracing::info!(brokers = %brokers, "event bus producer created");

        Ok(RedpandaEventBus {
            producer,
            brokers,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}

impl EventBus for RedpandaEventBus {
    fn publish(
        &self,
        topic: &str,
        envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let envelope = envelope.clone();
        let timeout = self.timeout;

        Box::pin(async move {
            let payload =
                bincode::serialize(&envelope).map_err(|e| EventBusError::PublishFailed {
                    topic: topic.clone(),
                    reason: format!("failed to serialize envelope: {e}"),
                })?;

            // The envelope key selects the partition: per-entity ordering.
            let record = FutureRecord::to(&topic).payload(&payload).key(&envelope.key);

            match self.producer.send(record, Timeout::After(timeout)).await {
                Ok((partition, offset)) => {
                    tracing::debug!(
                        topic = %topic,
                        partition,
                        offset,
                        event_type = %envelope.event_type,
                        "event published"
                    );
                    Ok(())
                }
                Err((kafka_error, _)) => {
                    tracing::error!(topic = %topic, error = %kafka_error, "publish failed");
                    Err(EventBusError::PublishFailed {
                        topic,
                        reason: kafka_error.to_string(),
                    })
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_bus_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<RedpandaEventBus>();
        assert_sync::<RedpandaEventBus>();
    }

    #[test]
    fn build_without_brokers_fails() {
        assert!(RedpandaEventBus::builder().build().is_err());
    }
}
