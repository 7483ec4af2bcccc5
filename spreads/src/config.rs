//! Environment-driven configuration.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is missing.
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    /// A variable is present but unparseable.
    #[error("invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Spreads service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Spreads database connection string.
    pub database_url: String,
    /// Connection pool size.
    pub db_max_connections: u32,
    /// Comma-separated broker addresses.
    pub brokers: String,
    /// Topic carrying `UserDeleted` facts.
    pub user_events_topic: String,
    /// Consumer group of the purge consumer.
    pub consumer_group: String,
    /// Base URL of the identity service.
    pub users_service_url: String,
    /// Per-request timeout for internal client calls.
    pub client_timeout: Duration,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
        }),
    }
}

fn with_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `DATABASE_URL`, `REDPANDA_BROKERS` and `USERS_SERVICE_URL` are
    /// required; everything else has a default.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a required variable is missing or unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parsed(
                "SPREADS_BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 8082)),
            )?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            brokers: required("REDPANDA_BROKERS")?,
            user_events_topic: with_default("USER_EVENTS_TOPIC", "user-events"),
            consumer_group: with_default("PURGE_CONSUMER_GROUP", "spreads-purge"),
            users_service_url: required("USERS_SERVICE_URL")?,
            client_timeout: Duration::from_millis(parsed("CLIENT_TIMEOUT_MS", 2000u64)?),
        })
    }
}
