use anyhow::Context;
use tracing_subscriber::EnvFilter;

use hr_admin_api::{config, database, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    let config = config::config().clone();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .init();

    config.validate().map_err(anyhow::Error::msg).context("invalid configuration")?;
    tracing::info!("Starting HR Admin API in {:?} mode", config.environment);
    if hr_admin_api::is_production!() && config.security.cors_allow_all {
        tracing::warn!("CORS_ALLOW_ALL is enabled in production");
    }
    if hr_admin_api::is_development!() {
        tracing::debug!(store = ?config.database.engine, "development defaults in effect");
    }

    let store = database::open_store(&config.database).await.context("failed to open the store")?;
    let bind_addr = config.bind_addr();
    let state = AppState::new(config, store).context("failed to initialise token signing")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("HR Admin API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
