//! Internal users client.

use crate::error::{ClientError, from_status};
use arcana_core::model::UserId;
use async_trait::async_trait;
use std::time::Duration;

/// Synchronous questions the spreads service asks the identity service.
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Confirm that a user exists.
    ///
    /// # Errors
    ///
    /// [`ClientError::Business`] with `NotFound` when the user does not
    /// exist, [`ClientError::Infrastructure`] when the identity service
    /// could not answer.
    async fn exists(&self, user_id: UserId) -> Result<(), ClientError>;
}

/// reqwest-backed [`UsersApi`] talking straight to the identity service.
#[derive(Debug, Clone)]
pub struct HttpUsersClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpUsersClient {
    /// Create a client builder.
    #[must_use]
    pub const fn builder() -> HttpUsersClientBuilder {
        HttpUsersClientBuilder {
            base_url: None,
            timeout: None,
        }
    }
}

/// Builder for [`HttpUsersClient`].
#[derive(Debug, Clone)]
pub struct HttpUsersClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpUsersClientBuilder {
    /// Set the identity service base URL, e.g. `http://identity:8080`.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the per-request timeout. Defaults to two seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// [`ClientError::Infrastructure`] when no base URL was given or the
    /// underlying HTTP client fails to initialize.
    pub fn build(self) -> Result<HttpUsersClient, ClientError> {
        let base_url = self.base_url.ok_or_else(|| ClientError::Infrastructure {
            detail: "users client requires a base URL".to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(2)))
            .build()
            .map_err(ClientError::from)?;
        Ok(HttpUsersClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UsersApi for HttpUsersClient {
    async fn exists(&self, user_id: UserId) -> Result<(), ClientError> {
        let url = format!("{}/internal/users/{user_id}", self.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!(%user_id, %status, "users existence check rejected");
        Err(from_status(status, "user", &user_id.to_string(), &body))
    }
}
