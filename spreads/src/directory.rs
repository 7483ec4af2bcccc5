//! [`UserDirectory`] over the internal users client.

use arcana_client::{ClientError, UsersApi};
use arcana_core::model::UserId;
use arcana_core::stores::UserDirectory;
use arcana_core::{Error, Result};
use async_trait::async_trait;

/// Users live in the identity service; this adapter answers existence
/// probes through the (fallback-wrapped) internal client.
///
/// A business `NotFound` from the callee is the definitive "no"; anything
/// else the client could not classify surfaces as `ServiceUnavailable`, so
/// callers can tell "user is gone" apart from "identity is down".
pub struct RemoteUserDirectory<C> {
    client: C,
}

impl<C: UsersApi> RemoteUserDirectory<C> {
    /// Wrap a users client.
    pub const fn new(client: C) -> Self {
        Self { client }
    }
}

#[async_trait]
impl<C: UsersApi> UserDirectory for RemoteUserDirectory<C> {
    async fn exists(&self, user_id: UserId) -> Result<bool> {
        match self.client.exists(user_id).await {
            Ok(()) => Ok(true),
            Err(ClientError::Business(Error::NotFound { .. })) => Ok(false),
            Err(err) => Err(err.into_domain("identity")),
        }
    }
}
