//! KuCoin level-1 order book adapter

use serde::Deserialize;
use tracing::{debug, warn};

use ratefeed_core::{Instrument, ProviderError, ProviderId, ProviderResult, RateSnapshot};

use super::{parse_price, HttpFetcher, RateProvider};

const BASE_URL: &str = "https://api.kucoin.com";
/// KuCoin reports failures with HTTP 200 and a non-success code
const SUCCESS_CODE: &str = "200000";

#[derive(Debug, Deserialize)]
struct Level1Response {
    code: String,
    #[serde(default)]
    msg: Option<String>,
    data: Option<Level1Data>,
}

#[derive(Debug, Deserialize)]
struct Level1Data {
    price: Option<String>,
}

pub struct KuCoinProvider {
    http: HttpFetcher,
    base_url: String,
}

impl KuCoinProvider {
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

fn symbol(instrument: Instrument) -> String {
    format!("{}-USDT", instrument.symbol())
}

fn extract_price(body: &Level1Response) -> ProviderResult<f64> {
    if body.code != SUCCESS_CODE {
        let msg = body.msg.as_deref().unwrap_or("no message");
        warn!("KuCoin error code {}: {}", body.code, msg);
        return Err(ProviderError::unavailable(
            ProviderId::KuCoin,
            format!("code {}: {}", body.code, msg),
        ));
    }

    let price = body
        .data
        .as_ref()
        .and_then(|d| d.price.as_deref())
        .ok_or_else(|| ProviderError::malformed(ProviderId::KuCoin, "missing data.price"))?;
    parse_price(ProviderId::KuCoin, price)
}

#[async_trait::async_trait]
impl RateProvider for KuCoinProvider {
    fn id(&self) -> ProviderId {
        ProviderId::KuCoin
    }

    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot> {
        let url = format!("{}/api/v1/market/orderbook/level1", self.base_url);
        let symbol = symbol(instrument);
        debug!("KuCoin request: {} symbol={}", url, symbol);

        let request = self.http.client().get(&url).query(&[("symbol", symbol.as_str())]);
        let body: Level1Response = self.http.get_json(ProviderId::KuCoin, request).await?;
        let price = extract_price(&body)?;

        Ok(RateSnapshot::new(ProviderId::KuCoin, instrument, price, self.http.now_unix()))
    }
}
