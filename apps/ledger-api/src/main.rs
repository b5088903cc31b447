//! Ledger API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ledger_api::auth::StaticTokenStore;
use ledger_api::{routes, AppState, LedgerConfig, LedgerDb};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Caisse Ledger API...");

    let config = LedgerConfig::load()?;
    info!(
        port = config.port,
        db = %config.database_url,
        "Configuration loaded"
    );

    if config.api_tokens.is_empty() {
        warn!("LEDGER_API_TOKENS is empty; every authenticated route will refuse requests");
    }

    let db = LedgerDb::connect(&config.database_url).await?;

    let tokens = Arc::new(StaticTokenStore::new(config.api_tokens.clone()));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        db,
        config: Arc::new(config),
        tokens,
    };

    let app = routes::router(state);
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Ledger API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Ledger API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
}
