//! Per-provider rate cache with a fixed freshness window
//!
//! Uses DashMap so refreshes of different (provider, instrument) pairs never
//! contend. Concurrent misses on the same pair both go upstream; whichever
//! finishes last is kept.

use dashmap::DashMap;
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

use ratefeed_core::{Instrument, ProviderId, ProviderResult, RateSnapshot};

use crate::clock::Clock;

/// Freshness window for every provider and instrument
pub const TTL_SECS: i64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    provider: ProviderId,
    instrument: Instrument,
}

impl CacheKey {
    fn new(provider: ProviderId, instrument: Instrument) -> Self {
        Self { provider, instrument }
    }
}

pub struct RateCache {
    /// Last successful snapshot per (provider, instrument)
    entries: DashMap<CacheKey, Arc<RateSnapshot>>,
    clock: Arc<dyn Clock>,

    hits: AtomicU64,
    misses: AtomicU64,
    refresh_failures: AtomicU64,
}

impl RateCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
        }
    }

    /// Return the cached snapshot if fresh, otherwise call `fetch` and store its result.
    ///
    /// A failed fetch leaves any existing entry in place and is returned as-is;
    /// the stale entry is never served instead.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        provider: ProviderId,
        instrument: Instrument,
        fetch: F,
    ) -> ProviderResult<Arc<RateSnapshot>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<RateSnapshot>>,
    {
        let key = CacheKey::new(provider, instrument);

        if let Some(snapshot) = self.fresh(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for {} {}", provider, instrument);
            return Ok(snapshot);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for {} {}, refreshing", provider, instrument);

        match fetch().await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.entries.insert(key, Arc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(e) => {
                self.refresh_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Refresh failed for {} {}: {}", provider, instrument, e);
                Err(e)
            }
        }
    }

    fn fresh(&self, key: &CacheKey) -> Option<Arc<RateSnapshot>> {
        let now = self.clock.now_unix();
        self.entries
            .get(key)
            .filter(|entry| entry.value().is_fresh(now, TTL_SECS))
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Stored snapshot regardless of freshness
    pub fn peek(&self, provider: ProviderId, instrument: Instrument) -> Option<Arc<RateSnapshot>> {
        self.entries
            .get(&CacheKey::new(provider, instrument))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub refresh_failures: u64,
}
