use std::sync::Arc;

use anyhow::Context;
use db::DBService;
use server::{AppState, routes};
use services::services::{chat_api::ChatApiClient, config::Config};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,server=debug,services=debug,db=debug")),
        )
        .init();

    let config = Config::from_env().context("invalid configuration")?;
    let db = DBService::new(&config.database_url)
        .await
        .with_context(|| format!("failed to open database at {}", config.database_url))?;
    let client = Arc::new(ChatApiClient::new(&config.ai).context("failed to build AI client")?);

    let address = config.bind_address();
    let app = routes::router(AppState::new(config, db, client));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    tracing::info!(address = %address, "Programming ephemeris server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
