//! Error types

use thiserror::Error;

use crate::{Instrument, ProviderId};

/// Core error types
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors raised by a single provider adapter
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("{provider} unavailable: {message}")]
    UpstreamUnavailable { provider: ProviderId, message: String },

    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse { provider: ProviderId, message: String },

    #[error("{provider} requires {key} to be set")]
    ConfigurationMissing { provider: ProviderId, key: &'static str },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderId {
        match self {
            ProviderError::UpstreamUnavailable { provider, .. }
            | ProviderError::MalformedResponse { provider, .. }
            | ProviderError::ConfigurationMissing { provider, .. } => *provider,
        }
    }

    pub fn unavailable(provider: ProviderId, message: impl Into<String>) -> Self {
        ProviderError::UpstreamUnavailable {
            provider,
            message: message.into(),
        }
    }

    pub fn malformed(provider: ProviderId, message: impl Into<String>) -> Self {
        ProviderError::MalformedResponse {
            provider,
            message: message.into(),
        }
    }
}

/// Aggregation errors
#[derive(Debug, Clone, Error)]
pub enum AggregateError {
    /// At least one provider branch failed. Which ones is deliberately not carried.
    #[error("Failed to fetch {instrument} rates")]
    PartialUpstreamFailure { instrument: Instrument },
}

/// Result type alias
pub type CoreResult<T> = Result<T, CoreError>;
pub type ProviderResult<T> = Result<T, ProviderError>;
pub type AggregateResult<T> = Result<T, AggregateError>;
