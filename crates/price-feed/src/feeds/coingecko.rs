//! CoinGecko `/simple/price` adapter

use std::collections::HashMap;

use serde::Deserialize;
use tracing::debug;

use ratefeed_core::{
    CoinGeckoPlan, Instrument, ProviderCredentials, ProviderError, ProviderId, ProviderResult,
    RateSnapshot,
};

use super::{check_price, HttpFetcher, RateProvider};

const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";
const API_KEY_VAR: &str = "COINGECKO_API_KEY";

/// `{"bitcoin": {"usd": 67000.0}}`
type SimplePriceResponse = HashMap<String, CoinPrice>;

#[derive(Debug, Deserialize)]
struct CoinPrice {
    usd: Option<f64>,
}

pub struct CoinGeckoProvider {
    http: HttpFetcher,
    base_url: String,
    plan: CoinGeckoPlan,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(http: HttpFetcher, credentials: &ProviderCredentials) -> Self {
        let base_url = match credentials.coingecko_plan {
            CoinGeckoPlan::Pro => PRO_BASE_URL,
            CoinGeckoPlan::Public | CoinGeckoPlan::Demo => PUBLIC_BASE_URL,
        };

        Self {
            http,
            base_url: base_url.to_string(),
            plan: credentials.coingecko_plan,
            api_key: credentials.coingecko_api_key.clone(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn key_header(&self) -> ProviderResult<Option<(&'static str, &str)>> {
        let header = match self.plan {
            CoinGeckoPlan::Public => return Ok(None),
            CoinGeckoPlan::Demo => "x-cg-demo-api-key",
            CoinGeckoPlan::Pro => "x-cg-pro-api-key",
        };
        match self.api_key.as_deref() {
            Some(key) => Ok(Some((header, key))),
            None => Err(ProviderError::ConfigurationMissing {
                provider: ProviderId::CoinGecko,
                key: API_KEY_VAR,
            }),
        }
    }
}

fn extract_price(body: &SimplePriceResponse, instrument: Instrument) -> ProviderResult<f64> {
    let id = instrument.coingecko_id();
    let usd = body
        .get(id)
        .and_then(|coin| coin.usd)
        .ok_or_else(|| ProviderError::malformed(ProviderId::CoinGecko, format!("missing {}.usd", id)))?;
    check_price(ProviderId::CoinGecko, usd)
}

#[async_trait::async_trait]
impl RateProvider for CoinGeckoProvider {
    fn id(&self) -> ProviderId {
        ProviderId::CoinGecko
    }

    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot> {
        let key_header = self.key_header()?;

        let url = format!("{}/simple/price", self.base_url);
        let mut request = self
            .http
            .client()
            .get(&url)
            .query(&[("ids", instrument.coingecko_id()), ("vs_currencies", "usd")]);
        if let Some((name, key)) = key_header {
            request = request.header(name, key);
        }

        debug!("CoinGecko request: {} for {}", url, instrument);
        let body: SimplePriceResponse = self.http.get_json(ProviderId::CoinGecko, request).await?;
        let price = extract_price(&body, instrument)?;

        Ok(RateSnapshot::new(ProviderId::CoinGecko, instrument, price, self.http.now_unix()))
    }
}
