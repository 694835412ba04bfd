//! Rate aggregator - fans out to every configured provider through the cache

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use ratefeed_core::{
    AggregateError, AggregateResponse, AggregateResult, Instrument, PriceEntry, ProviderId,
};

use crate::cache::{CacheStats, RateCache};
use crate::feeds::RateProvider;

/// Main rate aggregator
pub struct RateAggregator {
    /// Response order follows this list
    providers: Vec<Arc<dyn RateProvider>>,
    cache: Arc<RateCache>,
}

impl RateAggregator {
    pub fn new(providers: Vec<Arc<dyn RateProvider>>, cache: Arc<RateCache>) -> Self {
        Self { providers, cache }
    }

    /// Get shared cache reference
    pub fn cache(&self) -> Arc<RateCache> {
        Arc::clone(&self.cache)
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.id().name()).collect()
    }

    /// Query every provider concurrently and return one entry per provider.
    ///
    /// All branches run to completion, so every successful fetch lands in the
    /// cache even when a sibling fails. Any failure fails the whole call.
    pub async fn aggregate(&self, instrument: Instrument) -> AggregateResult<AggregateResponse> {
        let start = Instant::now();

        let branches = self.providers.iter().map(|provider| {
            self.cache
                .get_or_refresh(provider.id(), instrument, move || provider.fetch(instrument))
        });
        let results = join_all(branches).await;

        let mut entries = Vec::with_capacity(results.len());
        let mut failed = 0usize;
        for result in results {
            match result {
                Ok(snapshot) => entries.push(PriceEntry::from(snapshot.as_ref())),
                Err(e) => {
                    warn!("{} branch failed for {}: {}", e.provider(), instrument, e);
                    failed += 1;
                }
            }
        }

        if failed > 0 {
            warn!(
                "Aggregation for {} failed: {}/{} providers unavailable",
                instrument,
                failed,
                self.providers.len()
            );
            return Err(AggregateError::PartialUpstreamFailure { instrument });
        }

        let response = AggregateResponse::new(entries);
        debug!(
            "Aggregated {} {} prices in {:?}",
            response.len(),
            instrument,
            start.elapsed()
        );

        Ok(response)
    }

    /// Get statistics
    pub fn stats(&self) -> AggregatorStats {
        AggregatorStats {
            provider_count: self.providers.len(),
            cache: self.cache.stats(),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "Rate cache: {} entries, {} hits, {} misses, {} failed refreshes",
            stats.cache.entries, stats.cache.hits, stats.cache.misses, stats.cache.refresh_failures
        );
    }
}

/// Aggregator statistics
#[derive(Debug, Clone)]
pub struct AggregatorStats {
    pub provider_count: usize,
    pub cache: CacheStats,
}
