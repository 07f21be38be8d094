//! Token bucket throttling for sources.
//!
//! [`Throttled`] wraps a source and waits for a token before every call, so bursts
//! (a hot-set preload, a wide batch request) are smoothed to the backend's rate.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::Value;
use tokio::time::Instant;

use crate::errors::MarketDataError;
use crate::models::{FetchScope, PriceRecord, Symbol};

use super::traits::{AnalysisSource, PriceSource};

/// Default rate limit: 120 requests per minute.
const DEFAULT_REQUESTS_PER_MINUTE: u32 = 120;

/// Default bucket capacity (allows bursting).
const DEFAULT_BURST_CAPACITY: f64 = 20.0;

/// Throttle configuration.
#[derive(Clone, Debug)]
pub struct ThrottleConfig {
    /// Maximum sustained requests per minute.
    pub requests_per_minute: u32,
    /// Maximum burst capacity.
    pub burst_capacity: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
            burst_capacity: DEFAULT_BURST_CAPACITY,
        }
    }
}

impl ThrottleConfig {
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_minute,
            ..Self::default()
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
    /// Tokens per second.
    rate: f64,
    capacity: f64,
}

impl TokenBucket {
    fn new(config: &ThrottleConfig) -> Self {
        let capacity = config.burst_capacity.max(1.0);
        Self {
            tokens: capacity,
            last_update: Instant::now(),
            rate: f64::from(config.requests_per_minute.max(1)) / 60.0,
            capacity,
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.rate).min(self.capacity);
        self.last_update = now;
    }

    /// Take a token if one is available, otherwise return how long to wait.
    fn take(&mut self) -> Result<(), Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else {
            let seconds_needed = (1.0 - self.tokens) / self.rate;
            Err(Duration::from_secs_f64(seconds_needed))
        }
    }
}

/// A source decorated with a token bucket.
pub struct Throttled<S> {
    inner: S,
    bucket: Mutex<TokenBucket>,
}

impl<S> Throttled<S> {
    pub fn new(inner: S, config: ThrottleConfig) -> Self {
        Self {
            bucket: Mutex::new(TokenBucket::new(&config)),
            inner,
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Lock the bucket, recovering from poison if necessary.
    fn lock_bucket(&self) -> MutexGuard<'_, TokenBucket> {
        self.bucket.lock().unwrap_or_else(|poisoned| {
            warn!("Throttle bucket mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Wait (asynchronously) until a token is available.
    async fn acquire(&self, source_id: &str) {
        loop {
            let wait_time = match self.lock_bucket().take() {
                Ok(()) => return,
                Err(wait_time) => wait_time,
            };

            debug!("Throttle: waiting {:?} for source '{}'", wait_time, source_id);
            tokio::time::sleep(wait_time).await;
        }
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for Throttled<S> {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        scope: FetchScope,
    ) -> Result<PriceRecord, MarketDataError> {
        self.acquire(self.inner.id()).await;
        self.inner.fetch(symbol, scope).await
    }
}

#[async_trait]
impl<S: AnalysisSource> AnalysisSource for Throttled<S> {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn analyze(&self, symbol: &Symbol) -> Result<Value, MarketDataError> {
        self.acquire(self.inner.id()).await;
        self.inner.analyze(symbol).await
    }
}
