//! Consumer side: subscribe-process-reconnect loop with manual commits.

use arcana_core::error::Error;
use arcana_core::event::EventEnvelope;
use async_trait::async_trait;
use futures::StreamExt;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Handler invoked once per received envelope.
///
/// The handler owns the whole fate of a message: apply it, or dead-letter
/// it after its own retry budget. Returning `Ok` commits the offset.
/// Returning `Err` means the message could not even be dead-lettered; the
/// offset is *not* committed and the broker will redeliver, so
/// implementations must be idempotent.
#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    /// Process one envelope to completion.
    async fn handle(&self, envelope: EventEnvelope) -> Result<(), Error>;

    /// Take custody of raw bytes that failed envelope deserialization.
    ///
    /// Such a payload can never be applied, but it must not be silently
    /// dropped either; implementations record it (typically in the
    /// dead-letter store) and return `Ok` to commit, or `Err` to leave the
    /// offset uncommitted for redelivery.
    async fn handle_undecodable(&self, payload: &[u8], error: &Error) -> Result<(), Error>;
}

/// Subscribe-process-reconnect consumer loop.
///
/// Within a partition, messages are handled strictly in order and the next
/// message is not touched until the previous one is committed; this is the
/// per-user ordering guarantee of the deletion pipeline. Cross-partition
/// concurrency comes from running more consumer instances in the same
/// group, not from reordering within one.
///
/// # Lifecycle
///
/// Runs until the shutdown signal fires. Connection failures are retried
/// after `retry_delay`; handler failures stall only the affected partition
/// until redelivery succeeds or the handler dead-letters the message.
pub struct BrokerConsumer {
    name: String,
    brokers: String,
    group_id: String,
    topic: String,
    handler: Arc<dyn EnvelopeHandler>,
    shutdown: broadcast::Receiver<()>,
    retry_delay: Duration,
}

impl BrokerConsumer {
    /// Create a consumer.
    ///
    /// * `name`: human-readable name for logs (e.g. "purge").
    /// * `brokers`: comma-separated broker addresses.
    /// * `group_id`: consumer group; instances sharing it split partitions.
    /// * `topic`: topic to subscribe to.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        brokers: impl Into<String>,
        group_id: impl Into<String>,
        topic: impl Into<String>,
        handler: Arc<dyn EnvelopeHandler>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            name: name.into(),
            brokers: brokers.into(),
            group_id: group_id.into(),
            topic: topic.into(),
            handler,
            shutdown,
            retry_delay: Duration::from_secs(5),
        }
    }

    /// Override the reconnect delay.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Spawn the consumer as a background task.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run the consumer until shutdown.
    pub async fn run(mut self) {
        tracing::info!(
            consumer = %self.name,
            topic = %self.topic,
            group = %self.group_id,
            "consumer starting"
        );

        loop {
            tokio::select! {
                _ = self.shutdown.recv() => {
                    tracing::info!(consumer = %self.name, "shutdown signal received");
                    return;
                }
                () = Self::consume_until_error(
                    &self.name,
                    &self.brokers,
                    &self.group_id,
                    &self.topic,
                    self.handler.as_ref(),
                ) => {
                    tracing::warn!(
                        consumer = %self.name,
                        delay_s = self.retry_delay.as_secs(),
                        "consumer stream ended, reconnecting"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
            }
        }
    }

    /// One subscribe-and-process cycle. Returns when the stream errors out
    /// or ends, after which the caller reconnects.
    async fn consume_until_error(
        name: &str,
        brokers: &str,
        group_id: &str,
        topic: &str,
        handler: &dyn EnvelopeHandler,
    ) {
        let consumer: StreamConsumer = match ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .create()
        {
            Ok(consumer) => consumer,
            Err(e) => {
                tracing::error!(consumer = %name, error = %e, "failed to create consumer");
                return;
            }
        };

        if let Err(e) = consumer.subscribe(&[topic]) {
            tracing::error!(consumer = %name, topic = %topic, error = %e, "failed to subscribe");
            return;
        }

        let mut stream = consumer.stream();
        while let Some(message) = stream.next().await {
            let message = match message {
                Ok(message) => message,
                Err(e) => {
                    tracing::error!(consumer = %name, error = %e, "stream error");
                    return;
                }
            };

            let Some(payload) = message.payload() else {
                // Nothing to process; commit so the empty message does not
                // wedge the partition.
                tracing::warn!(consumer = %name, offset = message.offset(), "empty payload");
                Self::commit(name, &consumer, &message);
                continue;
            };

            match bincode::deserialize::<EventEnvelope>(payload) {
                Ok(envelope) => {
                    let event_type = envelope.event_type.clone();
                    match handler.handle(envelope).await {
                        Ok(()) => Self::commit(name, &consumer, &message),
                        Err(e) => {
                            // Not applied and not dead-lettered. Leave the
                            // offset uncommitted and force redelivery.
                            tracing::error!(
                                consumer = %name,
                                event_type = %event_type,
                                offset = message.offset(),
                                error = %e,
                                "handler failed, message will be redelivered"
                            );
                            return;
                        }
                    }
                }
                Err(e) => {
                    // Hand the raw bytes to the handler so they end up in
                    // the dead-letter store before the offset moves.
                    let error = Error::Broker(format!("undecodable envelope: {e}"));
                    match handler.handle_undecodable(payload, &error).await {
                        Ok(()) => Self::commit(name, &consumer, &message),
                        Err(e) => {
                            tracing::error!(
                                consumer = %name,
                                offset = message.offset(),
                                error = %e,
                                "undecodable payload not recorded, will be redelivered"
                            );
                            return;
                        }
                    }
                }
            }
        }
    }

    fn commit(
        name: &str,
        consumer: &StreamConsumer,
        message: &rdkafka::message::BorrowedMessage<'_>,
    ) {
        if let Err(e) = consumer.commit_message(message, CommitMode::Async) {
            tracing::warn!(
                consumer = %name,
                offset = message.offset(),
                error = %e,
                "offset commit failed, message may be redelivered"
            );
        }
    }
}
