//! Core type definitions

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CoreError;

/// Supported instruments, all quoted in USD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Instrument {
    Btc,
    Eth,
}

impl Instrument {
    pub fn symbol(&self) -> &'static str {
        match self {
            Instrument::Btc => "BTC",
            Instrument::Eth => "ETH",
        }
    }

    /// CoinGecko coin id
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Instrument::Btc => "bitcoin",
            Instrument::Eth => "ethereum",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Instrument {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BTC" => Ok(Instrument::Btc),
            "ETH" => Ok(Instrument::Eth),
            _ => Err(CoreError::UnknownInstrument(s.to_string())),
        }
    }
}

/// Upstream price providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    CoinGecko,
    Coinbase,
    KuCoin,
    Binance,
}

impl ProviderId {
    /// Name reported as `dex` on the wire
    pub fn name(&self) -> &'static str {
        match self {
            ProviderId::CoinGecko => "CoinGecko",
            ProviderId::Coinbase => "Coinbase",
            ProviderId::KuCoin => "KuCoin",
            ProviderId::Binance => "Binance",
        }
    }

    /// Provider set served when nothing is configured
    pub fn defaults() -> Vec<ProviderId> {
        vec![ProviderId::CoinGecko, ProviderId::Coinbase, ProviderId::KuCoin]
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for ProviderId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "coingecko" => Ok(ProviderId::CoinGecko),
            "coinbase" => Ok(ProviderId::Coinbase),
            "kucoin" => Ok(ProviderId::KuCoin),
            "binance" => Ok(ProviderId::Binance),
            _ => Err(CoreError::UnknownProvider(s.to_string())),
        }
    }
}

/// Convert a USD price to the two-decimal fixed-point wire value
pub fn scale_price(price_usd: f64) -> i64 {
    (price_usd * 100.0).round() as i64
}

/// Result of one successful upstream fetch.
///
/// Fields are private so `scaled_price` can only ever be derived from
/// `price_usd`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateSnapshot {
    provider: ProviderId,
    instrument: Instrument,
    price_usd: f64,
    scaled_price: i64,
    fetched_at: i64,
}

impl RateSnapshot {
    pub fn new(provider: ProviderId, instrument: Instrument, price_usd: f64, fetched_at: i64) -> Self {
        Self {
            provider,
            instrument,
            price_usd,
            scaled_price: scale_price(price_usd),
            fetched_at,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    pub fn price_usd(&self) -> f64 {
        self.price_usd
    }

    pub fn scaled_price(&self) -> i64 {
        self.scaled_price
    }

    /// Unix seconds at which the upstream call completed
    pub fn fetched_at(&self) -> i64 {
        self.fetched_at
    }

    pub fn fetched_at_utc(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.fetched_at, 0).single()
    }

    pub fn age_secs(&self, now: i64) -> i64 {
        now.saturating_sub(self.fetched_at)
    }

    pub fn is_fresh(&self, now: i64, ttl_secs: i64) -> bool {
        self.age_secs(now) < ttl_secs
    }
}
