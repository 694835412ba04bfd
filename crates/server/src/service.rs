//! HTTP routes over the rate aggregator

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use tracing::{debug, info};

use ratefeed_core::{
    AggregateResponse, Instrument, ProviderCredentials, ServiceConfig, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use ratefeed_price_feed::{
    build_providers, Clock, HttpFetcher, RateAggregator, RateCache, SystemClock,
};

use crate::conversions::{ApiError, ApiResult, HealthResponse, ServiceInfo};

/// Shared handler state
#[derive(Clone)]
pub struct RatesService {
    aggregator: Arc<RateAggregator>,
    info: Arc<ServiceInfo>,
    request_timeout: Duration,
}

impl RatesService {
    pub fn new(aggregator: RateAggregator) -> Self {
        let info = ServiceInfo::new(&aggregator.provider_ids());
        Self {
            aggregator: Arc::new(aggregator),
            info: Arc::new(info),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Deadline for one rates request; on expiry the caller gets the generic 500
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Wire real upstream adapters from configuration
    pub fn from_config(
        config: &ServiceConfig,
        credentials: &ProviderCredentials,
    ) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let http = HttpFetcher::new(Duration::from_secs(config.http_timeout_secs), Arc::clone(&clock))?;
        let providers = build_providers(&config.providers, credentials, http);
        let cache = Arc::new(RateCache::new(clock));

        info!(
            "Configured providers: {}",
            config.providers.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );

        Ok(Self::new(RateAggregator::new(providers, cache))
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    pub fn aggregator(&self) -> &Arc<RateAggregator> {
        &self.aggregator
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index))
            .route("/btc", get(btc_rates))
            .route("/eth", get(eth_rates))
            .route("/health", get(health))
            .with_state(self.clone())
    }

    async fn rates(&self, instrument: Instrument) -> ApiResult<Json<AggregateResponse>> {
        debug!("Rates requested for {}", instrument);
        let response = tokio::time::timeout(self.request_timeout, self.aggregator.aggregate(instrument))
            .await
            .map_err(|_| ApiError::Timeout { instrument })??;
        Ok(Json(response))
    }
}

async fn index(State(service): State<RatesService>) -> Json<ServiceInfo> {
    Json(service.info.as_ref().clone())
}

async fn btc_rates(State(service): State<RatesService>) -> ApiResult<Json<AggregateResponse>> {
    service.rates(Instrument::Btc).await
}

async fn eth_rates(State(service): State<RatesService>) -> ApiResult<Json<AggregateResponse>> {
    service.rates(Instrument::Eth).await
}

async fn health(State(service): State<RatesService>) -> Json<HealthResponse> {
    Json(HealthResponse::from(service.aggregator.cache().stats()))
}
