//! Fallback decorators for the internal clients.
//!
//! Each decorator implements the same trait as the client it wraps and adds
//! two behaviors:
//!
//! - business errors pass through unchanged and never count against the
//!   circuit breaker;
//! - infrastructure failures (and an open circuit) are converted to
//!   [`Error::ServiceUnavailable`] naming the callee, so callers see a
//!   domain error instead of transport detail.

use crate::error::ClientError;
use crate::spreads::SpreadsInternalApi;
use crate::users::UsersApi;
use arcana_core::Error;
use arcana_core::model::{SpreadId, UserId};
use arcana_runtime::{CircuitBreaker, CircuitBreakerError};
use async_trait::async_trait;
use std::future::Future;

/// Run one call through the breaker.
///
/// Business errors ride the `Ok` channel of the breaker call so only
/// infrastructure failures advance it toward open.
async fn guarded<T, F, Fut>(
    breaker: &CircuitBreaker,
    service: &'static str,
    operation: F,
) -> Result<T, ClientError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let outcome = breaker
        .call(|| async {
            match operation().await {
                Ok(value) => Ok(Ok(value)),
                Err(ClientError::Business(err)) => Ok(Err(err)),
                Err(ClientError::Infrastructure { detail }) => Err(detail),
            }
        })
        .await;

    match outcome {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ClientError::Business(err)),
        Err(CircuitBreakerError::Open) => {
            tracing::warn!(service, "call rejected, circuit open");
            Err(ClientError::Business(Error::unavailable(
                service,
                "circuit breaker open",
            )))
        }
        Err(CircuitBreakerError::Inner(detail)) => {
            tracing::warn!(service, %detail, "call failed");
            Err(ClientError::Business(Error::unavailable(service, detail)))
        }
    }
}

/// Circuit-breaking decorator for any [`UsersApi`].
#[derive(Debug, Clone)]
pub struct UsersApiFallback<C> {
    inner: C,
    breaker: CircuitBreaker,
    service: &'static str,
}

impl<C: UsersApi> UsersApiFallback<C> {
    /// Wrap a users client with a circuit breaker.
    #[must_use]
    pub const fn new(inner: C, breaker: CircuitBreaker) -> Self {
        Self {
            inner,
            breaker,
            service: "identity",
        }
    }
}

#[async_trait]
impl<C: UsersApi> UsersApi for UsersApiFallback<C> {
    async fn exists(&self, user_id: UserId) -> Result<(), ClientError> {
        guarded(&self.breaker, self.service, || self.inner.exists(user_id)).await
    }
}

/// Circuit-breaking decorator for any [`SpreadsInternalApi`].
#[derive(Debug, Clone)]
pub struct SpreadsInternalFallback<C> {
    inner: C,
    breaker: CircuitBreaker,
    service: &'static str,
}

impl<C: SpreadsInternalApi> SpreadsInternalFallback<C> {
    /// Wrap a spreads client with a circuit breaker.
    #[must_use]
    pub const fn new(inner: C, breaker: CircuitBreaker) -> Self {
        Self {
            inner,
            breaker,
            service: "spreads",
        }
    }
}

#[async_trait]
impl<C: SpreadsInternalApi> SpreadsInternalApi for SpreadsInternalFallback<C> {
    async fn owner(&self, spread_id: SpreadId) -> Result<UserId, ClientError> {
        guarded(&self.breaker, self.service, || self.inner.owner(spread_id)).await
    }

    async fn purge_user_data(&self, user_id: UserId) -> Result<(), ClientError> {
        guarded(&self.breaker, self.service, || {
            self.inner.purge_user_data(user_id)
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)] // Test code can use unwrap and panic
mod tests {
    use super::*;
    use arcana_runtime::CircuitBreakerConfig;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted [`UsersApi`] replaying a fixed sequence of outcomes.
    struct ScriptedUsers {
        script: Mutex<VecDeque<Result<(), ClientError>>>,
        calls: AtomicUsize,
    }

    impl ScriptedUsers {
        fn new(script: Vec<Result<(), ClientError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl UsersApi for &ScriptedUsers {
        async fn exists(&self, _user_id: UserId) -> Result<(), ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ClientError::Infrastructure {
                    detail: "script exhausted".to_string(),
                }))
        }
    }

    fn infra() -> Result<(), ClientError> {
        Err(ClientError::Infrastructure {
            detail: "connection refused".to_string(),
        })
    }

    fn not_found() -> Result<(), ClientError> {
        Err(ClientError::Business(Error::not_found("user", "u1")))
    }

    fn breaker(failure_threshold: usize) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(failure_threshold)
                .timeout(Duration::from_secs(60))
                .build(),
        )
    }

    #[tokio::test]
    async fn success_passes_through() {
        let inner = ScriptedUsers::new(vec![Ok(())]);
        let client = UsersApiFallback::new(&inner, breaker(2));
        assert!(client.exists(UserId::new()).await.is_ok());
    }

    #[tokio::test]
    async fn business_errors_pass_unchanged_and_never_open_the_circuit() {
        let inner = ScriptedUsers::new(vec![not_found(), not_found(), not_found(), Ok(())]);
        let client = UsersApiFallback::new(&inner, breaker(2));

        for _ in 0..3 {
            let err = client.exists(UserId::new()).await.unwrap_err();
            match err {
                ClientError::Business(Error::NotFound { entity, .. }) => {
                    assert_eq!(entity, "user");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        // Three business failures exceeded the threshold of two, yet the
        // fourth call still reaches the inner client.
        assert!(client.exists(UserId::new()).await.is_ok());
        assert_eq!(inner.calls(), 4);
    }

    #[tokio::test]
    async fn infrastructure_failure_becomes_service_unavailable() {
        let inner = ScriptedUsers::new(vec![infra()]);
        let client = UsersApiFallback::new(&inner, breaker(5));

        let err = client.exists(UserId::new()).await.unwrap_err();
        match err {
            ClientError::Business(Error::ServiceUnavailable { service, cause }) => {
                assert_eq!(service, "identity");
                assert_eq!(cause, "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn open_circuit_short_circuits_without_calling_inner() {
        let inner = ScriptedUsers::new(vec![infra(), infra()]);
        let client = UsersApiFallback::new(&inner, breaker(2));

        for _ in 0..2 {
            let _ = client.exists(UserId::new()).await;
        }
        assert_eq!(inner.calls(), 2);

        let err = client.exists(UserId::new()).await.unwrap_err();
        match err {
            ClientError::Business(Error::ServiceUnavailable { service, cause }) => {
                assert_eq!(service, "identity");
                assert_eq!(cause, "circuit breaker open");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // The inner client was not touched by the rejected call.
        assert_eq!(inner.calls(), 2);
    }

    /// Scripted [`SpreadsInternalApi`] that always fails at the transport.
    struct DownSpreads;

    #[async_trait]
    impl SpreadsInternalApi for DownSpreads {
        async fn owner(&self, _spread_id: SpreadId) -> Result<UserId, ClientError> {
            Err(ClientError::Infrastructure {
                detail: "request timed out".to_string(),
            })
        }

        async fn purge_user_data(&self, _user_id: UserId) -> Result<(), ClientError> {
            Err(ClientError::Infrastructure {
                detail: "request timed out".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn spreads_fallback_names_the_spreads_service() {
        let client = SpreadsInternalFallback::new(DownSpreads, breaker(5));
        let err = client.owner(SpreadId::new()).await.unwrap_err();
        match err {
            ClientError::Business(Error::ServiceUnavailable { service, cause }) => {
                assert_eq!(service, "spreads");
                assert_eq!(cause, "request timed out");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
