//! Broker abstraction for publishing keyed facts.
//!
//! Production uses the Kafka-compatible implementation in `arcana-broker`;
//! tests use in-process fakes. Delivery is at-least-once and ordered within
//! a partition, so facts sharing a key (see
//! [`EventEnvelope::key`](crate::event::EventEnvelope)) are applied in
//! publish order even across redeliveries.

use crate::event::EventEnvelope;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors from broker operations.
#[derive(Debug, Error, Clone)]
pub enum EventBusError {
    /// Failed to reach or configure the broker.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Failed to publish to a topic.
    #[error("publish failed for topic '{topic}': {reason}")]
    PublishFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// Failed to subscribe to a topic.
    #[error("subscription failed for topic '{topic}': {reason}")]
    SubscriptionFailed {
        /// The topic that failed.
        topic: String,
        /// The reason for failure.
        reason: String,
    },

    /// A received message could not be decoded into an envelope.
    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),
}

/// Publisher side of the broker.
///
/// Object-safe so services can hold `Arc<dyn EventBus>` and tests can swap
/// in fakes.
pub trait EventBus: Send + Sync {
    /// Publish one envelope to `topic`, partitioned by the envelope's key.
    ///
    /// Resolves once the broker has acknowledged the write.
    fn publish(
        &self,
        topic: &str,
        envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = Result<(), EventBusError>> + Send + '_>>;
}
