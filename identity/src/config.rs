//! Environment-driven configuration.

use std::net::SocketAddr;
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

/// Identity service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Socket the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// Identity database connection string.
    pub database_url: String,
    /// Connection pool size.
    pub db_max_connections: u32,
    /// Comma-separated broker addresses.
    pub brokers: String,
    /// Topic carrying `UserDeleted` facts.
    pub user_events_topic: String,
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

impl Config {
    /// Load configuration from the environment.
    ///
    /// `DATABASE_URL` and `REDPANDA_BROKERS` are required; everything else
    /// has a default.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a required variable is missing or unparseable.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: parsed(
                "IDENTITY_BIND_ADDR",
                SocketAddr::from(([0, 0, 0, 0], 8081)),
            )?,
            database_url: required("DATABASE_URL")?,
            db_max_connections: parsed("DB_MAX_CONNECTIONS", 5)?,
            brokers: required("REDPANDA_BROKERS")?,
            user_events_topic: std::env::var("USER_EVENTS_TOPIC")
                .unwrap_or_else(|_| "user-events".to_string()),
        })
    }
}
