//! Wire-format price entries and aggregate responses

use serde::{Deserialize, Serialize};

use crate::RateSnapshot;

/// One element of the JSON array served for an instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub dex: String,
    /// Scaled price, two implied decimals
    pub price: i64,
    /// Unix seconds of the upstream fetch
    pub timestamp: i64,
}

impl From<&RateSnapshot> for PriceEntry {
    fn from(snapshot: &RateSnapshot) -> Self {
        Self {
            dex: snapshot.provider().name().to_string(),
            price: snapshot.scaled_price(),
            timestamp: snapshot.fetched_at(),
        }
    }
}

/// Prices for one instrument, one entry per configured provider in configuration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AggregateResponse {
    entries: Vec<PriceEntry>,
}

impl AggregateResponse {
    pub fn new(entries: Vec<PriceEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PriceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
