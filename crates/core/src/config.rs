//! Configuration types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{CoreError, ProviderId};

pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// CoinGecko API plan, which decides the base URL and key header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinGeckoPlan {
    #[default]
    Public,
    Demo,
    Pro,
}

impl CoinGeckoPlan {
    pub fn requires_key(&self) -> bool {
        !matches!(self, CoinGeckoPlan::Public)
    }
}

impl FromStr for CoinGeckoPlan {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "public" => Ok(CoinGeckoPlan::Public),
            "demo" => Ok(CoinGeckoPlan::Demo),
            "pro" => Ok(CoinGeckoPlan::Pro),
            other => Err(CoreError::InvalidConfig(format!("unknown CoinGecko plan: {}", other))),
        }
    }
}

/// Upstream credentials, read once at startup.
///
/// A missing key is not an error here; the adapter that needs it fails when called.
#[derive(Debug, Clone, Default)]
pub struct ProviderCredentials {
    pub coingecko_api_key: Option<String>,
    pub coingecko_plan: CoinGeckoPlan,
}

impl ProviderCredentials {
    pub fn from_env() -> Result<Self, CoreError> {
        let coingecko_api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let coingecko_plan = match std::env::var("COINGECKO_PLAN") {
            Ok(plan) => plan.parse()?,
            Err(_) => CoinGeckoPlan::default(),
        };

        Ok(Self {
            coingecko_api_key,
            coingecko_plan,
        })
    }
}

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// Providers in response order
    pub providers: Vec<ProviderId>,
    /// Per-request timeout for upstream calls
    pub http_timeout_secs: u64,
    /// Upper bound on one inbound request, fan-out included.
    ///
    /// Must exceed `http_timeout_secs` so upstream timeouts surface first.
    pub request_timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            providers: ProviderId::defaults(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.providers.is_empty() {
            return Err(CoreError::InvalidConfig("at least one provider must be configured".into()));
        }
        for (i, provider) in self.providers.iter().enumerate() {
            if self.providers[..i].contains(provider) {
                return Err(CoreError::InvalidConfig(format!("provider {} listed twice", provider)));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(CoreError::InvalidConfig("http_timeout_secs must be positive".into()));
        }
        if self.request_timeout_secs <= self.http_timeout_secs {
            return Err(CoreError::InvalidConfig(format!(
                "request_timeout_secs ({}) must be greater than http_timeout_secs ({})",
                self.request_timeout_secs, self.http_timeout_secs
            )));
        }
        Ok(())
    }
}
