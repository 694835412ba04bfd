//! Binance ticker price adapter

use serde::Deserialize;
use tracing::debug;

use ratefeed_core::{Instrument, ProviderError, ProviderId, ProviderResult, RateSnapshot};

use super::{parse_price, HttpFetcher, RateProvider};

const BASE_URL: &str = "https://api.binance.com";

/// `{"symbol": "BTCUSDT", "price": "67005.12000000"}`
#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: Option<String>,
}

pub struct BinanceProvider {
    http: HttpFetcher,
    base_url: String,
}

impl BinanceProvider {
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

#[async_trait::async_trait]
impl RateProvider for BinanceProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Binance
    }

    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let symbol = format!("{}USDT", instrument.symbol());
        debug!("Binance request: {} symbol={}", url, symbol);

        let request = self.http.client().get(&url).query(&[("symbol", symbol.as_str())]);
        let body: TickerPrice = self.http.get_json(ProviderId::Binance, request).await?;
        let raw = body
            .price
            .ok_or_else(|| ProviderError::malformed(ProviderId::Binance, "missing price"))?;
        let price = parse_price(ProviderId::Binance, &raw)?;

        Ok(RateSnapshot::new(ProviderId::Binance, instrument, price, self.http.now_unix()))
    }
}
