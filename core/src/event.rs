//! Cross-service facts and their wire envelope.
//!
//! The only fact crossing the service boundary today is [`UserDeleted`],
//! published by the identity service after a local user delete commits and
//! consumed by the spreads service's purge consumer. Facts are immutable and
//! replayable; consumers must be idempotent because delivery is
//! at-least-once.

use crate::error::Error;
use crate::model::{EventId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Wire envelope carrying one serialized fact.
///
/// The `key` selects the broker partition; all facts about the same entity
/// share a key so redeliveries and retries preserve per-entity order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Fact type identifier, e.g. `"UserDeleted.v1"`.
    pub event_type: String,
    /// Schema version of the payload.
    pub event_version: u16,
    /// Partition key (entity id bytes).
    pub key: Vec<u8>,
    /// Bincode-serialized fact payload.
    pub data: Vec<u8>,
    /// When the fact occurred at its source.
    pub occurred_at: DateTime<Utc>,
}

/// Fact: a user was deleted in the identity service.
///
/// Every spread (and transitively every spread card and interpretation)
/// authored by `user_id` must eventually be removed once this fact is
/// applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDeleted {
    /// The deleted user.
    pub user_id: UserId,
    /// Unique id of this fact, stable across redeliveries.
    pub event_id: EventId,
    /// When the local delete committed.
    pub occurred_at: DateTime<Utc>,
}

impl UserDeleted {
    /// Fact type identifier on the wire.
    pub const EVENT_TYPE: &'static str = "UserDeleted.v1";

    /// Build a fresh fact for a just-deleted user.
    #[must_use]
    pub fn now(user_id: UserId) -> Self {
        Self {
            user_id,
            event_id: EventId::new(),
            occurred_at: Utc::now(),
        }
    }

    /// Serialize into a keyed envelope.
    ///
    /// The key is the user id, so all deletion facts for one user land on
    /// the same partition.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Broker`] if bincode serialization fails.
    pub fn to_envelope(&self) -> Result<EventEnvelope, Error> {
        let data = bincode::serialize(self)
            .map_err(|e| Error::Broker(format!("failed to serialize {}: {e}", Self::EVENT_TYPE)))?;
        Ok(EventEnvelope {
            event_type: Self::EVENT_TYPE.to_string(),
            event_version: 1,
            key: self.user_id.0.as_bytes().to_vec(),
            data,
            occurred_at: self.occurred_at,
        })
    }

    /// Decode from an envelope previously built by [`Self::to_envelope`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Broker`] if the envelope carries a different fact
    /// type or the payload does not decode.
    pub fn from_envelope(envelope: &EventEnvelope) -> Result<Self, Error> {
        if envelope.event_type != Self::EVENT_TYPE {
            return Err(Error::Broker(format!(
                "expected {} but got {}",
                Self::EVENT_TYPE,
                envelope.event_type
            )));
        }
        bincode::deserialize(&envelope.data)
            .map_err(|e| Error::Broker(format!("failed to decode {}: {e}", Self::EVENT_TYPE)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;

    #[test]
    fn envelope_roundtrip() {
        let fact = UserDeleted::now(UserId::new());
        let envelope = fact.to_envelope().unwrap();
        assert_eq!(envelope.event_type, UserDeleted::EVENT_TYPE);
        assert_eq!(envelope.key, fact.user_id.0.as_bytes().to_vec());
        let decoded = UserDeleted::from_envelope(&envelope).unwrap();
        assert_eq!(decoded, fact);
    }

    #[test]
    fn wrong_event_type_is_rejected() {
        let fact = UserDeleted::now(UserId::new());
        let mut envelope = fact.to_envelope().unwrap();
        envelope.event_type = "SpreadCreated.v1".to_string();
        assert!(UserDeleted::from_envelope(&envelope).is_err());
    }

    #[test]
    fn garbage_payload_is_rejected() {
        let fact = UserDeleted::now(UserId::new());
        let mut envelope = fact.to_envelope().unwrap();
        envelope.data = vec![0xff; 3];
        assert!(UserDeleted::from_envelope(&envelope).is_err());
    }
}
