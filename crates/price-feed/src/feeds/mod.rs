//! Upstream price provider adapters
//!
//! Each adapter turns one exchange API into `RateSnapshot`s. Adapters are
//! stateless between calls and never retry; retry policy belongs to the caller.

mod binance;
mod coinbase;
mod coingecko;
mod kucoin;
#[cfg(any(test, feature = "test-util"))]
mod mock;

pub use binance::BinanceProvider;
pub use coinbase::CoinbaseProvider;
pub use coingecko::CoinGeckoProvider;
pub use kucoin::KuCoinProvider;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockProvider;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use ratefeed_core::{
    Instrument, ProviderCredentials, ProviderError, ProviderId, ProviderResult, RateSnapshot,
};

use crate::clock::Clock;

/// Capability shared by every upstream price source
#[async_trait::async_trait]
pub trait RateProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetch the current USD spot price for `instrument`
    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot>;
}

/// HTTP plumbing shared by the concrete adapters
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    clock: Arc<dyn Clock>,
}

impl HttpFetcher {
    /// Build the shared client; every request it sends is bounded by `timeout`
    pub fn new(timeout: Duration, clock: Arc<dyn Clock>) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("ratefeed/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, clock })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn now_unix(&self) -> i64 {
        self.clock.now_unix()
    }

    /// Send `request` and decode a successful JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        provider: ProviderId,
        request: RequestBuilder,
    ) -> ProviderResult<T> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::unavailable(provider, "request timed out")
            } else {
                ProviderError::unavailable(provider, format!("request failed: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!("{} returned HTTP {}", provider, status);
            return Err(ProviderError::unavailable(provider, format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::unavailable(provider, format!("failed to read body: {}", e))
        })?;

        debug!("{} response: {} bytes", provider, body.len());

        serde_json::from_str(&body)
            .map_err(|e| ProviderError::malformed(provider, format!("invalid JSON: {}", e)))
    }
}

/// Largest accepted USD price; keeps `scale_price` well inside `i64`
pub(crate) const MAX_PRICE_USD: f64 = 1e12;

/// Parse an upstream price string, rejecting anything that is not a positive finite number
pub(crate) fn parse_price(provider: ProviderId, raw: &str) -> ProviderResult<f64> {
    let price: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ProviderError::malformed(provider, format!("non-numeric price {:?}", raw)))?;
    check_price(provider, price)
}

pub(crate) fn check_price(provider: ProviderId, price: f64) -> ProviderResult<f64> {
    if !price.is_finite() || price <= 0.0 || price > MAX_PRICE_USD {
        return Err(ProviderError::malformed(provider, format!("implausible price {}", price)));
    }
    Ok(price)
}

/// Build adapters for `ids`, preserving their order
pub fn build_providers(
    ids: &[ProviderId],
    credentials: &ProviderCredentials,
    http: HttpFetcher,
) -> Vec<Arc<dyn RateProvider>> {
    ids.iter()
        .map(|id| -> Arc<dyn RateProvider> {
            match id {
                ProviderId::CoinGecko => Arc::new(CoinGeckoProvider::new(http.clone(), credentials)),
                ProviderId::Coinbase => Arc::new(CoinbaseProvider::new(http.clone())),
                ProviderId::KuCoin => Arc::new(KuCoinProvider::new(http.clone())),
                ProviderId::Binance => Arc::new(BinanceProvider::new(http.clone())),
            }
        })
        .collect()
}
