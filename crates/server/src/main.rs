//! Ratefeed - spot rate aggregation service
//!
//! Main entry point for the HTTP server

use std::time::Duration;

use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use ratefeed_core::ProviderCredentials;
use ratefeed_server::{load_config, HttpServerBuilder, RatesService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting Ratefeed v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    let credentials = ProviderCredentials::from_env()?;
    if credentials.coingecko_plan.requires_key() && credentials.coingecko_api_key.is_none() {
        // Not fatal: CoinGecko calls fail until the key is provided
        warn!("COINGECKO_PLAN requires COINGECKO_API_KEY, CoinGecko requests will fail");
    }

    let service = RatesService::from_config(&config, &credentials)?;

    let server = HttpServerBuilder::new()
        .host(config.host.clone())
        .port(config.port)
        .request_timeout(Duration::from_secs(config.request_timeout_secs))
        .build(service);

    // Setup shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    // Spawn shutdown signal handler
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    error!("Failed to install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received Ctrl+C");
            }
            _ = terminate => {
                info!("Received termination signal");
            }
        }

        let _ = shutdown_tx.send(());
    });

    info!("Listening on {}", server.address());
    info!("Press Ctrl+C to shutdown");

    if let Err(e) = server.start_with_shutdown(shutdown_rx).await {
        error!("Server error: {}", e);
        return Err(e);
    }

    server.service().aggregator().log_stats();
    info!("Server shutdown complete");
    Ok(())
}
