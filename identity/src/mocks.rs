//! In-memory fakes for tests.

use crate::store::{User, UserStore};
use arcana_core::event::EventEnvelope;
use arcana_core::event_bus::{EventBus, EventBusError};
use arcana_core::model::UserId;
use arcana_core::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory [`UserStore`] enforcing username uniqueness.
#[derive(Default)]
pub struct InMemoryUsers {
    users: Mutex<HashMap<UserId, User>>,
}

#[async_trait]
impl UserStore for InMemoryUsers {
    async fn insert(&self, user: &User) -> Result<()> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        if users.values().any(|u| u.username == user.username) {
            return Err(Error::Conflict(format!(
                "username '{}' is already taken",
                user.username
            )));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>> {
        let users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.get(&id).cloned())
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut users = self.users.lock().map_err(|_| poisoned())?;
        Ok(users.remove(&id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn poisoned() -> Error {
    Error::Storage("user store lock poisoned".to_string())
}

/// [`EventBus`] fake that records every publish.
#[derive(Default)]
pub struct RecordingBus {
    published: Mutex<Vec<(String, EventEnvelope)>>,
}

impl RecordingBus {
    /// Everything published so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn published(&self) -> Vec<(String, EventEnvelope)> {
        self.published.lock().unwrap().clone()
    }
}

impl EventBus for RecordingBus {
    fn publish(
        &self,
        topic: &str,
        envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        let envelope = envelope.clone();
        Box::pin(async move {
            self.published
                .lock()
                .map_err(|_| EventBusError::ConnectionFailed("lock poisoned".to_string()))?
                .push((topic, envelope));
            Ok(())
        })
    }
}

/// [`EventBus`] fake that fails every publish and counts attempts.
#[derive(Default)]
pub struct FailingBus {
    attempts: AtomicUsize,
}

impl FailingBus {
    /// Number of publish attempts observed.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl EventBus for FailingBus {
    fn publish(
        &self,
        topic: &str,
        _envelope: &EventEnvelope,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<(), EventBusError>> + Send + '_>> {
        let topic = topic.to_string();
        Box::pin(async move {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(EventBusError::PublishFailed {
                topic,
                reason: "broker down".to_string(),
            })
        })
    }
}
