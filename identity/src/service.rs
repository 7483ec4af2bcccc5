//! User account operations.

use crate::publisher::DeletionPublisher;
use crate::store::{User, UserStore};
use arcana_core::model::UserId;
use arcana_core::{Error, Result};
use chrono::Utc;

/// User account service.
pub struct UserService<S> {
    store: S,
    publisher: DeletionPublisher,
}

impl<S: UserStore> UserService<S> {
    /// Create a service over a store and a deletion publisher.
    pub const fn new(store: S, publisher: DeletionPublisher) -> Self {
        Self { store, publisher }
    }

    /// Create a user with a unique username.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty username, `Conflict` when the username is
    /// taken.
    pub async fn create(&self, username: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }
        let user = User {
            id: UserId::new(),
            username: username.to_string(),
            created_at: Utc::now(),
        };
        self.store.insert(&user).await?;
        tracing::info!(user_id = %user.id, "user created");
        Ok(user)
    }

    /// Load a user.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn get(&self, id: UserId) -> Result<User> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::not_found("user", id))
    }

    /// Existence probe for the internal endpoint.
    ///
    /// # Errors
    ///
    /// Storage errors only; a missing user is `Ok(false)`.
    pub async fn exists(&self, id: UserId) -> Result<bool> {
        Ok(self.store.get(id).await?.is_some())
    }

    /// Delete a user, then publish the `UserDeleted` fact.
    ///
    /// The local delete is the source of truth: once it commits the
    /// operation reports success even if the publish fails after retries.
    /// A failed publish is logged and counted; the content purge stays
    /// reachable through the synchronous internal endpoint until the fact
    /// is replayed.
    ///
    /// # Errors
    ///
    /// `NotFound` when the user does not exist.
    pub async fn delete(&self, id: UserId) -> Result<()> {
        if !self.store.delete(id).await? {
            return Err(Error::not_found("user", id));
        }
        tracing::info!(user_id = %id, "user deleted");

        if let Err(err) = self.publisher.publish_deleted(id).await {
            tracing::error!(
                user_id = %id,
                error = %err,
                "UserDeleted publish failed after retries; purge is deferred"
            );
            metrics::counter!("identity.publish_failed").increment(1);
        }
        Ok(())
    }

    /// Readiness probe.
    ///
    /// # Errors
    ///
    /// `Storage` when the backing store is unreachable.
    pub async fn ready(&self) -> Result<()> {
        self.store.ping().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::mocks::{FailingBus, InMemoryUsers, RecordingBus};
    use arcana_runtime::RetryPolicy;
    use std::sync::Arc;

    fn service_with_bus(bus: Arc<dyn arcana_core::event_bus::EventBus>) -> UserService<InMemoryUsers> {
        let publisher = DeletionPublisher::new(bus, "user-events", RetryPolicy::none());
        UserService::new(InMemoryUsers::default(), publisher)
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let service = service_with_bus(Arc::new(RecordingBus::default()));
        service.create("morgana").await.unwrap();
        let err = service.create("morgana").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn empty_username_is_rejected() {
        let service = service_with_bus(Arc::new(RecordingBus::default()));
        let err = service.create("   ").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn delete_publishes_exactly_one_keyed_fact() {
        let bus = Arc::new(RecordingBus::default());
        let service = service_with_bus(Arc::clone(&bus) as _);

        let user = service.create("morgana").await.unwrap();
        service.delete(user.id).await.unwrap();

        let published = bus.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].1.key, user.id.0.as_bytes().to_vec());
    }

    #[tokio::test]
    async fn deleting_a_missing_user_is_not_found_and_publishes_nothing() {
        let bus = Arc::new(RecordingBus::default());
        let service = service_with_bus(Arc::clone(&bus) as _);

        let err = service.delete(UserId::new()).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(bus.published().is_empty());
    }

    #[tokio::test]
    async fn publish_failure_does_not_undo_the_delete() {
        let service = service_with_bus(Arc::new(FailingBus::default()));

        let user = service.create("morgana").await.unwrap();
        // The delete still succeeds even though the broker is down.
        service.delete(user.id).await.unwrap();
        assert!(!service.exists(user.id).await.unwrap());
    }
}
