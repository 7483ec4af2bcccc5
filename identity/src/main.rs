//! Identity service binary.

use arcana_broker::RedpandaEventBus;
use arcana_identity::api::{AppState, router};
use arcana_identity::config::Config;
use arcana_identity::publisher::DeletionPublisher;
use arcana_identity::service::UserService;
use arcana_identity::store::{self, PostgresUserStore};
use arcana_runtime::RetryPolicy;
use arcana_web::middleware::with_tracing;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;

    let pool = store::connect(&config.database_url, config.db_max_connections).await?;
    store::migrate(&pool).await?;

    let bus = RedpandaEventBus::new(&config.brokers)?;
    let publisher = DeletionPublisher::new(
        Arc::new(bus),
        config.user_events_topic.clone(),
        RetryPolicy::default(),
    );
    let service = UserService::new(PostgresUserStore::new(pool), publisher);
    let app = with_tracing(router(AppState {
        users: Arc::new(service),
    }));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "identity service listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutdown signal received");
    }
}
