//! Failure-threshold circuit breaker.
//!
//! Wrapped around the internal synchronous clients: once a dependency has
//! failed `failure_threshold` times in a row the circuit opens and calls
//! fail immediately for `timeout`, after which a limited number of probe
//! calls decide whether to close again.
//!
//! # States
//!
//! - **Closed**: requests pass through, consecutive failures are counted.
//! - **Open**: requests are rejected without touching the dependency.
//! - **HalfOpen**: after the timeout, probes are let through;
//!   `success_threshold` consecutive successes close the circuit, any
//!   failure reopens it.

use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::RwLock;

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: usize,
    /// How long the circuit stays open before probing.
    pub timeout: Duration,
    /// Consecutive half-open successes required to close.
    pub success_threshold: usize,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new configuration builder.
    #[must_use]
    pub const fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder {
            failure_threshold: None,
            timeout: None,
            success_threshold: None,
        }
    }
}

/// Builder for [`CircuitBreakerConfig`].
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfigBuilder {
    failure_threshold: Option<usize>,
    timeout: Option<Duration>,
    success_threshold: Option<usize>,
}

impl CircuitBreakerConfigBuilder {
    /// Set the consecutive-failure threshold.
    #[must_use]
    pub const fn failure_threshold(mut self, threshold: usize) -> Self {
        self.failure_threshold = Some(threshold);
        self
    }

    /// Set how long the circuit stays open before probing.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the half-open success threshold.
    #[must_use]
    pub const fn success_threshold(mut self, threshold: usize) -> Self {
        self.success_threshold = Some(threshold);
        self
    }

    /// Build the configuration, falling back to defaults for unset fields.
    #[must_use]
    pub fn build(self) -> CircuitBreakerConfig {
        let defaults = CircuitBreakerConfig::default();
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.unwrap_or(defaults.failure_threshold),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            success_threshold: self.success_threshold.unwrap_or(defaults.success_threshold),
        }
    }
}

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Requests pass through normally.
    Closed,
    /// Requests fail immediately.
    Open,
    /// Probing whether the dependency recovered.
    HalfOpen,
}

/// Errors from calls made through the breaker.
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the dependency was not called.
    #[error("circuit breaker is open")]
    Open,
    /// The dependency was called and failed.
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
struct BreakerState {
    state: State,
    failure_count: usize,
    success_count: usize,
    opened_at: Option<Instant>,
}

/// Failure-threshold circuit breaker.
///
/// Cheap to clone; clones share state so one breaker can guard every call
/// site of a client.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    config: Arc<CircuitBreakerConfig>,
    state: Arc<RwLock<BreakerState>>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    #[must_use]
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: Arc::new(config),
            state: Arc::new(RwLock::new(BreakerState {
                state: State::Closed,
                failure_count: 0,
                success_count: 0,
                opened_at: None,
            })),
        }
    }

    /// Current state.
    pub async fn state(&self) -> State {
        self.state.read().await.state
    }

    /// Call an operation through the breaker.
    ///
    /// # Errors
    ///
    /// [`CircuitBreakerError::Open`] if the circuit rejected the call,
    /// [`CircuitBreakerError::Inner`] if the operation itself failed.
    pub async fn call<F, Fut, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        if !self.try_acquire().await {
            tracing::warn!("circuit breaker is open, rejecting call");
            return Err(CircuitBreakerError::Open);
        }

        match operation().await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitBreakerError::Inner(err))
            }
        }
    }

    async fn try_acquire(&self) -> bool {
        let mut state = self.state.write().await;
        match state.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let expired = state
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.timeout);
                if expired {
                    tracing::info!("circuit breaker transitioning open -> half-open");
                    state.state = State::HalfOpen;
                    state.success_count = 0;
                }
                expired
            }
        }
    }

    async fn on_success(&self) {
        let mut state = self.state.write().await;
        match state.state {
            State::Closed | State::Open => {
                state.failure_count = 0;
            }
            State::HalfOpen => {
                state.success_count += 1;
                if state.success_count >= self.config.success_threshold {
                    tracing::info!("circuit breaker transitioning half-open -> closed");
                    state.state = State::Closed;
                    state.failure_count = 0;
                    state.success_count = 0;
                    state.opened_at = None;
                }
            }
        }
    }

    async fn on_failure(&self) {
        let mut state = self.state.write().await;
        match state.state {
            State::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    tracing::warn!(
                        failures = state.failure_count,
                        "circuit breaker transitioning closed -> open"
                    );
                    state.state = State::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            State::HalfOpen => {
                tracing::warn!("circuit breaker probe failed, reopening");
                state.state = State::Open;
                state.opened_at = Some(Instant::now());
                state.failure_count = 1;
                state.success_count = 0;
            }
            State::Open => {
                state.failure_count += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failures: usize, timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            CircuitBreakerConfig::builder()
                .failure_threshold(failures)
                .timeout(timeout)
                .success_threshold(1)
                .build(),
        )
    }

    #[tokio::test]
    async fn stays_closed_on_success() {
        let cb = breaker(3, Duration::from_secs(30));
        let result = cb.call(|| async { Ok::<_, String>(42) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state().await, State::Closed);
    }

    #[tokio::test]
    async fn opens_after_threshold_and_rejects() {
        let cb = breaker(2, Duration::from_secs(30));
        for _ in 0..2 {
            let _ = cb.call(|| async { Err::<i32, _>("down") }).await;
        }
        assert_eq!(cb.state().await, State::Open);

        let result = cb.call(|| async { Ok::<_, String>(42) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::Open)));
    }

    #[tokio::test]
    async fn successful_probe_closes_the_circuit() {
        let cb = breaker(1, Duration::from_millis(20));
        let _ = cb.call(|| async { Err::<i32, _>("down") }).await;
        assert_eq!(cb.state().await, State::Open);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let result = cb.call(|| async { Ok::<_, String>(42) }).await;
        assert!(result.is_ok());
        assert_eq!(cb.state().await, State::Closed);
    }

    #[tokio::test]
    async fn failed_probe_reopens() {
        let cb = breaker(1, Duration::from_millis(20));
        let _ = cb.call(|| async { Err::<i32, _>("down") }).await;

        tokio::time::sleep(Duration::from_millis(30)).await;
        let _ = cb.call(|| async { Err::<i32, _>("still down") }).await;
        assert_eq!(cb.state().await, State::Open);
    }

    #[tokio::test]
    async fn intermittent_failures_reset_in_closed_state() {
        let cb = breaker(3, Duration::from_secs(30));
        let _ = cb.call(|| async { Err::<i32, _>("blip") }).await;
        let _ = cb.call(|| async { Ok::<_, String>(1) }).await;
        let _ = cb.call(|| async { Err::<i32, _>("blip") }).await;
        let _ = cb.call(|| async { Err::<i32, _>("blip") }).await;
        // Two consecutive failures, threshold is three.
        assert_eq!(cb.state().await, State::Closed);
    }
}
