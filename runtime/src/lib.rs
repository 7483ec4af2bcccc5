//! # Arcana Runtime
//!
//! Resilience primitives shared by the services:
//!
//! - [`retry`]: bounded retry with exponential backoff, used by the purge
//!   consumer before an event is dead-lettered and by the deletion
//!   publisher before it gives up on the broker.
//! - [`circuit_breaker`]: failure-threshold circuit breaker wrapped around
//!   the internal synchronous clients so a dead dependency fails fast
//!   instead of eating a timeout per call.
//!
//! Both are policy-only: they never decide *what* is retryable. Callers
//! pass a predicate so business errors (not-found, conflict, forbidden) are
//! returned immediately and only infrastructure failures burn the budget.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod circuit_breaker;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};
pub use retry::{RetryPolicy, retry_if};
