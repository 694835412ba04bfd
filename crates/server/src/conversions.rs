//! Conversions between internal results and HTTP responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use ratefeed_core::{AggregateError, Instrument, ProviderId};
use ratefeed_price_feed::CacheStats;

/// Errors surfaced by route handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Aggregate(#[from] AggregateError),

    /// The fan-out outlived the request deadline
    #[error("Failed to fetch {instrument} rates")]
    Timeout { instrument: Instrument },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // The message names only the instrument; upstream detail stays in the logs
        match &self {
            ApiError::Timeout { .. } => error!("Request deadline exceeded: {}", self),
            ApiError::Aggregate(_) => error!("Request failed: {}", self),
        }
        let body = ErrorBody {
            error: self.to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointInfo {
    pub method: String,
    pub path: String,
    pub description: String,
}

/// Static description served at `/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<EndpointInfo>,
    pub providers: Vec<String>,
}

impl ServiceInfo {
    pub fn new(providers: &[ProviderId]) -> Self {
        let endpoint = |path: &str, description: &str| EndpointInfo {
            method: "GET".to_string(),
            path: path.to_string(),
            description: description.to_string(),
        };

        Self {
            name: "ratefeed".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Aggregated BTC and ETH spot prices in USD cents".to_string(),
            endpoints: vec![
                endpoint("/btc", "BTC price from every configured provider"),
                endpoint("/eth", "ETH price from every configured provider"),
                endpoint("/health", "Liveness and cache statistics"),
            ],
            providers: providers.iter().map(|p| p.name().to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache: CacheStats,
}

impl From<CacheStats> for HealthResponse {
    fn from(cache: CacheStats) -> Self {
        Self { status: "ok", cache }
    }
}
