//! Internal spreads client.

use crate::error::{ClientError, from_status};
use arcana_core::model::{SpreadId, UserId};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Synchronous questions the identity service asks the spreads service.
///
/// `owner` serves the immediate-answer path; `purge_user_data` is the
/// synchronous fallback for the event-driven cascade when an operator needs
/// a user's content gone *now*.
#[async_trait]
pub trait SpreadsInternalApi: Send + Sync {
    /// Resolve the author of a spread.
    ///
    /// # Errors
    ///
    /// [`ClientError::Business`] with `NotFound` when the spread does not
    /// exist, [`ClientError::Infrastructure`] when the spreads service could
    /// not answer.
    async fn owner(&self, spread_id: SpreadId) -> Result<UserId, ClientError>;

    /// Delete every spread and interpretation authored by a user.
    ///
    /// Idempotent: purging a user with no remaining content succeeds.
    ///
    /// # Errors
    ///
    /// [`ClientError::Infrastructure`] when the spreads service could not
    /// answer or did not complete the purge.
    async fn purge_user_data(&self, user_id: UserId) -> Result<(), ClientError>;
}

#[derive(Debug, Deserialize)]
struct OwnerResponse {
    author_id: UserId,
}

/// reqwest-backed [`SpreadsInternalApi`].
#[derive(Debug, Clone)]
pub struct HttpSpreadsClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSpreadsClient {
    /// Create a client builder.
    #[must_use]
    pub const fn builder() -> HttpSpreadsClientBuilder {
        HttpSpreadsClientBuilder {
            base_url: None,
            timeout: None,
        }
    }
}

/// Builder for [`HttpSpreadsClient`].
#[derive(Debug, Clone)]
pub struct HttpSpreadsClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl HttpSpreadsClientBuilder {
    /// Set the spreads service base URL.
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
    pub fn build(self) -> Result<HttpSpreadsClient, ClientError> {
        let base_url = self.base_url.ok_or_else(|| ClientError::Infrastructure {
            detail: "spreads client requires a base URL".to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(2)))
            .build()
            .map_err(ClientError::from)?;
        Ok(HttpSpreadsClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SpreadsInternalApi for HttpSpreadsClient {
    async fn owner(&self, spread_id: SpreadId) -> Result<UserId, ClientError> {
        let url = format!("{}/internal/spreads/{spread_id}/owner", self.base_url);
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            let body: OwnerResponse = response.json().await?;
            return Ok(body.author_id);
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, "spread", &spread_id.to_string(), &body))
    }

    async fn purge_user_data(&self, user_id: UserId) -> Result<(), ClientError> {
        let url = format!("{}/internal/users/{user_id}/data", self.base_url);
        let response = self.http.delete(&url).send().await?;
        let status = response.status();
        if status.is_success() {
            tracing::info!(%user_id, "synchronous purge completed");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(from_status(status, "user", &user_id.to_string(), &body))
    }
}
