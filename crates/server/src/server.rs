//! HTTP server configuration and startup

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use ratefeed_core::DEFAULT_REQUEST_TIMEOUT_SECS;

use crate::service::RatesService;

/// Server configuration
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a rates request, including the upstream fan-out
    pub request_timeout: Duration,
    /// Allow browser clients on other origins
    pub cors: bool,
    pub stats_interval: Duration,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cors: true,
            stats_interval: Duration::from_secs(60),
        }
    }
}

/// HTTP server wrapper
pub struct HttpServer {
    config: HttpServerConfig,
    service: RatesService,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig, service: RatesService) -> Self {
        let service = service.with_request_timeout(config.request_timeout);
        Self { config, service }
    }

    /// Get reference to the service
    pub fn service(&self) -> &RatesService {
        &self.service
    }

    /// Router with tracing and optional CORS layers applied
    pub fn router(&self) -> Router {
        let router = self.service.router().layer(TraceLayer::new_for_http());

        if self.config.cors {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown: tokio::sync::oneshot::Receiver<()>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = self.address().parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("Starting HTTP server on {} (with graceful shutdown)", listener.local_addr()?);

        let stats = self.spawn_stats_reporter();

        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                shutdown.await.ok();
                info!("Shutdown signal received");
            })
            .await;

        stats.abort();
        result?;
        Ok(())
    }

    /// Periodically log cache statistics
    fn spawn_stats_reporter(&self) -> JoinHandle<()> {
        let aggregator = self.service.aggregator().clone();
        let period = self.config.stats_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick fires immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                aggregator.log_stats();
            }
        })
    }

    /// Get server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }
}

/// Builder for server configuration
pub struct HttpServerBuilder {
    config: HttpServerConfig,
}

impl HttpServerBuilder {
    pub fn new() -> Self {
        Self {
            config: HttpServerConfig::default(),
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn cors(mut self, cors: bool) -> Self {
        self.config.cors = cors;
        self
    }

    pub fn stats_interval(mut self, interval: Duration) -> Self {
        self.config.stats_interval = interval;
        self
    }

    pub fn build(self, service: RatesService) -> HttpServer {
        HttpServer::new(self.config, service)
    }
}

impl Default for HttpServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
