//! Spreads service binary.

use arcana_broker::BrokerConsumer;
use arcana_client::{HttpUsersClient, UsersApiFallback};
use arcana_runtime::{CircuitBreaker, CircuitBreakerConfig, RetryPolicy};
use arcana_spreads::api::router;
use arcana_spreads::config::Config;
use arcana_spreads::consumer::PurgeConsumer;
use arcana_spreads::directory::RemoteUserDirectory;
use arcana_spreads::service::{InterpretationService, SpreadService};
use arcana_spreads::state::AppState;
use arcana_store::{
    DeadLetterStore, PostgresCatalog, PostgresInterpretationStore, PostgresSpreadStore,
};
use arcana_web::middleware::with_tracing;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let pool = arcana_store::connect(&config.database_url, config.db_max_connections).await?;
    arcana_store::migrate(&pool).await?;

    let users_client = HttpUsersClient::builder()
        .base_url(&config.users_service_url)
        .timeout(config.client_timeout)
        .build()
        .map_err(|e| anyhow::anyhow!("users client: {e}"))?;
    let users = Arc::new(RemoteUserDirectory::new(UsersApiFallback::new(
        users_client,
        CircuitBreaker::new(CircuitBreakerConfig::default()),
    )));

    let spreads = Arc::new(SpreadService::new(
        PostgresSpreadStore::new(pool.clone()),
        PostgresCatalog::new(pool.clone()),
        PostgresCatalog::new(pool.clone()),
        Arc::clone(&users),
    ));
    let interpretations = Arc::new(InterpretationService::new(
        PostgresSpreadStore::new(pool.clone()),
        PostgresInterpretationStore::new(pool.clone()),
        users,
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let purge = PurgeConsumer::new(
        Arc::clone(&spreads),
        DeadLetterStore::new(pool),
        RetryPolicy::default(),
    );
    let consumer = BrokerConsumer::new(
        "purge",
        &config.brokers,
        &config.consumer_group,
        &config.user_events_topic,
        Arc::new(purge),
        shutdown_rx,
    )
    .spawn();

    let app = with_tracing(router(AppState {
        spreads,
        interpretations,
    }));
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "spreads service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The server stopped; take the consumer down with it.
    shutdown_tx.send(()).ok();
    consumer.await.ok();
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
