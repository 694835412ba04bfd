//! Spot rate aggregation core
//!
//! Features:
//! - One adapter per upstream exchange API
//! - Per (provider, instrument) cache with a 300s freshness window
//! - Concurrent, all-or-nothing fan-out with deterministic ordering

pub mod aggregator;
pub mod cache;
pub mod clock;
pub mod feeds;

pub use aggregator::{AggregatorStats, RateAggregator};
pub use cache::{CacheStats, RateCache, TTL_SECS};
pub use clock::{Clock, SystemClock};
pub use feeds::{build_providers, HttpFetcher, RateProvider};

#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
#[cfg(any(test, feature = "test-util"))]
pub use feeds::MockProvider;
