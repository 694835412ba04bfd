//! Scripted provider for tests

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use ratefeed_core::{Instrument, ProviderError, ProviderId, ProviderResult, RateSnapshot};

use crate::clock::Clock;

use super::RateProvider;

#[derive(Debug, Clone)]
enum Scripted {
    Price(f64),
    Fail(ProviderError),
}

/// Provider whose answers are set by the test, counting every call
pub struct MockProvider {
    id: ProviderId,
    clock: Arc<dyn Clock>,
    responses: Mutex<HashMap<Instrument, Scripted>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: ProviderId, clock: Arc<dyn Clock>) -> Self {
        Self {
            id,
            clock,
            responses: Mutex::new(HashMap::new()),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_price(self, instrument: Instrument, price_usd: f64) -> Self {
        self.set_price(instrument, price_usd);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock() = Some(delay);
        self
    }

    pub fn set_price(&self, instrument: Instrument, price_usd: f64) {
        self.responses.lock().insert(instrument, Scripted::Price(price_usd));
    }

    pub fn set_error(&self, instrument: Instrument, error: ProviderError) {
        self.responses.lock().insert(instrument, Scripted::Fail(error));
    }

    /// Script an upstream timeout
    pub fn set_timeout(&self, instrument: Instrument) {
        self.set_error(instrument, ProviderError::unavailable(self.id, "request timed out"));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RateProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn fetch(&self, instrument: Instrument) -> ProviderResult<RateSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self.responses.lock().get(&instrument).cloned();
        match scripted {
            Some(Scripted::Price(price)) => {
                Ok(RateSnapshot::new(self.id, instrument, price, self.clock.now_unix()))
            }
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(ProviderError::unavailable(self.id, format!("no {} price scripted", instrument))),
        }
    }
}
