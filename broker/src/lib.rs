//! # Arcana Broker
//!
//! Redpanda/Kafka transport for the deletion-consistency pipeline.
//!
//! The identity service publishes `UserDeleted` facts through
//! [`RedpandaEventBus`]; the spreads service consumes them through
//! [`BrokerConsumer`]. Two properties of the pipeline live here:
//!
//! - **Per-key ordering**: every envelope is produced with an explicit
//!   partition key (the user id), so all facts about one user land on one
//!   partition and are consumed in publish order even across retries and
//!   redeliveries. Facts for *different* users spread over partitions and
//!   impose no mutual ordering.
//! - **Commit after apply**: the consumer commits an offset only after the
//!   handler has finished with the message (applied it or dead-lettered
//!   it). A crash before commit causes redelivery, which is why handlers
//!   must be idempotent, since delivery is at-least-once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bus;
mod consumer;

pub use bus::{RedpandaEventBus, RedpandaEventBusBuilder};
pub use consumer::{BrokerConsumer, EnvelopeHandler};
