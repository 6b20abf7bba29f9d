use std::sync::Arc;

use anyhow::Context;
use supermart_api::{
    app, config, is_development,
    database::{DatabaseManager, PgStore},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECURITY_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();

    let default_filter = if config.api.enable_request_logging {
        "supermart_api=debug,tower_http=debug"
    } else {
        "supermart_api=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .init();

    tracing::info!("Starting Supermart API in {:?} mode", config.environment);
    config.validate().context("invalid configuration")?;

    let state = match config.database.url.as_deref() {
        Some(url) => {
            let db = DatabaseManager::connect(url, &config.database).await?;
            db.bootstrap().await?;
            let store = Arc::new(PgStore::new(db));
            AppState::new(config.clone(), store.clone(), store.clone(), store)?
        }
        None => {
            if !is_development!() {
                anyhow::bail!("DATABASE_URL must be set outside development");
            }
            tracing::warn!("DATABASE_URL not set; using the in-memory store");
            AppState::in_memory(config.clone())?
        }
    };

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!(
        "Supermart API listening on http://{} (platform host: {})",
        bind_addr,
        config.api.base_domain
    );

    axum::serve(listener, app(state)).await?;
    Ok(())
}
