//! Coinbase spot price adapter

use serde::Deserialize;
use tracing::debug;

use ratefeed_core::{Instrument, ProviderError, ProviderId, ProviderResult, RateSnapshot};

use super::{parse_price, HttpFetcher, RateProvider};

const BASE_URL: &str = "https://api.coinbase.com";

/// `{"data": {"amount": "67010.50", "base": "BTC", "currency": "USD"}}`
#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: Option<SpotData>,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: Option<String>,
}

pub struct CoinbaseProvider {
    http: HttpFetcher,
    base_url: String,
}

impl CoinbaseProvider {
    pub fn new(http: HttpFetcher) -> Self {
        Self {
            http,
            base_url: BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn extract_price(body: &SpotResponse) -> ProviderResult<f64> {
    let amount = body
        .data
        .as_ref()
        .and_then(|d| d.amount.as_deref())
        .ok_or_else(|| ProviderError::malformed(ProviderId::Coinbase, "missing data.amount"))?;
    parse_price(ProviderId::Coinbase, amount)
}

#[async_trait::async_trait]
impl RateProvider for CoinbaseProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Coinbase
    }

    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot> {
        let url = format!("{}/v2/prices/{}-USD/spot", self.base_url, instrument.symbol());
        debug!("Coinbase request: {}", url);

        let request = self.http.client().get(&url);
        let body: SpotResponse = self.http.get_json(ProviderId::Coinbase, request).await?;
        let price = extract_price(&body)?;

        Ok(RateSnapshot::new(ProviderId::Coinbase, instrument, price, self.http.now_unix()))
    }
}
