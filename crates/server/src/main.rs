use std::sync::Arc;

use anyhow::Context;
use showscout_server::config::ServerConfig;
use showscout_sources::{HttpFetcher, SourceRegistry};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env();
    info!(db_path = %config.db_path, "connecting to database");

    let pool = showscout_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    let applied = showscout_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!(applied, "migrations complete");

    let fetcher = HttpFetcher::new(config.fetch_timeout, &config.user_agent)
        .context("failed to build HTTP client")?;
    let registry = SourceRegistry::with_defaults();
    info!(sources = ?registry.names(), "sources registered");

    let bind_addr = config.bind_addr.clone();
    let app_state = showscout_server::state::AppState {
        db: pool,
        registry: Arc::new(registry),
        fetcher: Arc::new(fetcher),
        config: Arc::new(config),
    };

    let app = showscout_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .context("failed to bind")?;
    info!(addr = %bind_addr, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
