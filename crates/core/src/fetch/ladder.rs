//! Degradation ladder.
//!
//! Wraps one symbol's fetch in three thresholds measured from the start of the call:
//!
//! ```text
//!  0 ────────── fast ────────── cache ────────── total
//!  │  full fetch  │ + price-only  │ cache row?     │
//!  │              │   (first wins)│ yes → serve it │
//!  │              │               │ no  → keep     │
//!  │              │               │ waiting on live│ → SourceTimeout
//! ```
//!
//! A failed live fetch counts as reaching its threshold early. Live fetches are
//! spawned tasks: a caller that moves on leaves them running, and whatever they
//! return is still written to the cache. Every task holds a permit from a shared
//! semaphore, which caps how many can pile up behind slow sources.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use quotecache_market_data::{FetchScope, MarketDataError, PriceRecord, PriceSource, Symbol};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use super::model::{PriceResponse, ServedFrom};
use crate::cache::{CacheRecord, TtlCache};
use crate::errors::{Error, Result};

/// Ladder tier, reported in terminal errors.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LadderTier {
    Full,
    Partial,
    Cache,
    Total,
}

impl fmt::Display for LadderTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Partial => write!(f, "partial"),
            Self::Cache => write!(f, "cache"),
            Self::Total => write!(f, "total"),
        }
    }
}

/// Ladder thresholds, all measured from the start of the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LadderConfig {
    /// Switch to a price-only request.
    pub fast: Duration,
    /// Stop preferring live data; serve any cache row.
    pub cache: Duration,
    /// Hard ceiling.
    pub total: Duration,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            fast: Duration::from_secs(5),
            cache: Duration::from_secs(10),
            total: Duration::from_secs(20),
        }
    }
}

impl LadderConfig {
    /// Thresholds must be strictly increasing and non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.fast.is_zero() || self.fast >= self.cache || self.cache >= self.total {
            return Err(Error::InvalidConfigValue(format!(
                "ladder thresholds must satisfy 0 < fast < cache < total (got {:?} / {:?} / {:?})",
                self.fast, self.cache, self.total
            )));
        }
        Ok(())
    }

    /// Replace the hard ceiling. A ceiling below the configured one scales all
    /// three thresholds down proportionally.
    pub fn with_total(&self, total: Duration) -> Result<Self> {
        if total.is_zero() {
            return Err(Error::InvalidConfigValue("timeout must be positive".to_string()));
        }
        if total >= self.total {
            return Ok(Self { total, ..*self });
        }
        let ratio = total.as_secs_f64() / self.total.as_secs_f64();
        Ok(Self {
            fast: self.fast.mul_f64(ratio),
            cache: self.cache.mul_f64(ratio),
            total,
        })
    }
}

type FetchHandle = JoinHandle<std::result::Result<PriceRecord, MarketDataError>>;

type LiveOutcome = (FetchScope, std::result::Result<PriceRecord, String>);

/// The live fetches a single ladder call is waiting on.
#[derive(Default)]
struct LiveFetches {
    full: Option<FetchHandle>,
    partial: Option<FetchHandle>,
    last_error: Option<String>,
}

impl LiveFetches {
    fn is_idle(&self) -> bool {
        self.full.is_none() && self.partial.is_none()
    }

    /// Wait for the next live fetch to finish, preferring the full one when both are ready.
    /// Never resolves when idle.
    async fn next(&mut self) -> LiveOutcome {
        let outcome = tokio::select! {
            biased;
            result = wait(self.full.as_mut()) => (FetchScope::Full, result),
            result = wait(self.partial.as_mut()) => (FetchScope::PriceOnly, result),
        };

        match outcome.0 {
            FetchScope::Full => self.full = None,
            FetchScope::PriceOnly => self.partial = None,
        }
        if let Err(message) = &outcome.1 {
            self.last_error = Some(message.clone());
        }
        outcome
    }

    /// Next live outcome before `deadline`. `None` on deadline or when nothing is in flight.
    async fn next_before(&mut self, deadline: Instant) -> Option<LiveOutcome> {
        if self.is_idle() {
            return None;
        }
        tokio::select! {
            outcome = self.next() => Some(outcome),
            _ = sleep_until(deadline) => None,
        }
    }
}

async fn wait(handle: Option<&mut FetchHandle>) -> std::result::Result<PriceRecord, String> {
    match handle {
        Some(handle) => match handle.await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(err)) => Err(err.to_string()),
            Err(join_err) => Err(format!("fetch task failed: {}", join_err)),
        },
        None => std::future::pending().await,
    }
}

/// Runs the degradation ladder for single symbols.
#[derive(Clone)]
pub struct DegradationLadder {
    source: Arc<dyn PriceSource>,
    cache: TtlCache<CacheRecord>,
    price_ttl: Duration,
    permits: Arc<Semaphore>,
}

impl DegradationLadder {
    pub fn new(
        source: Arc<dyn PriceSource>,
        cache: TtlCache<CacheRecord>,
        price_ttl: Duration,
        max_in_flight: usize,
    ) -> Self {
        Self {
            source,
            cache,
            price_ttl,
            permits: Arc::new(Semaphore::new(max_in_flight)),
        }
    }

    /// Number of live fetches that may still be started.
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Best available answer for `symbol` within `config.total`.
    ///
    /// Prefers fresh-full over fresh-partial over any cache row, and fails only when
    /// there is neither a live answer nor a cache row.
    pub async fn run(&self, symbol: &Symbol, config: &LadderConfig) -> Result<PriceResponse> {
        let start = Instant::now();
        let mut live = LiveFetches {
            full: self.spawn_fetch(symbol, FetchScope::Full),
            ..LiveFetches::default()
        };

        // Tier 1: full fetch only.
        if let Some(response) = self.take_success(symbol, &mut live, start + config.fast).await {
            return Ok(response);
        }

        // Tier 2: add a price-only fetch; first success wins.
        debug!(
            "{}: no full result after {:?}, requesting price only",
            symbol,
            start.elapsed()
        );
        live.partial = self.spawn_fetch(symbol, FetchScope::PriceOnly);
        if let Some(response) = self.take_success(symbol, &mut live, start + config.cache).await {
            return Ok(response);
        }

        // Tier 3: any cache row, valid or not.
        debug!(
            "{}: no live result after {:?}, falling back to cache",
            symbol,
            start.elapsed()
        );
        match self.cache.get(symbol.as_str()).await {
            Ok(Some(entry)) => return Ok(PriceResponse::from_cache(entry, self.cache.now())),
            Ok(None) => {}
            Err(err) => warn!("Cache read for {} failed, treating as miss: {}", symbol, err),
        }

        // Tier 4: nothing cached; keep waiting on live fetches up to the ceiling.
        if let Some(response) = self.take_success(symbol, &mut live, start + config.total).await {
            return Ok(response);
        }

        if live.is_idle() {
            Err(Error::SourceFailure {
                symbol: symbol.to_string(),
                tier: LadderTier::Cache,
                message: live
                    .last_error
                    .unwrap_or_else(|| "no fetch capacity available".to_string()),
            })
        } else {
            debug!("{}: giving up after {:?}", symbol, start.elapsed());
            Err(Error::SourceTimeout {
                symbol: symbol.to_string(),
                tier: LadderTier::Total,
            })
        }
    }

    /// Wait for the first successful live result before `deadline`.
    async fn take_success(
        &self,
        symbol: &Symbol,
        live: &mut LiveFetches,
        deadline: Instant,
    ) -> Option<PriceResponse> {
        while let Some((scope, outcome)) = live.next_before(deadline).await {
            match outcome {
                Ok(record) => {
                    let served_from = match scope {
                        FetchScope::Full => ServedFrom::Fresh,
                        FetchScope::PriceOnly => ServedFrom::Partial,
                    };
                    return Some(PriceResponse::live(record, served_from, self.cache.now()));
                }
                Err(message) => debug!("{}: {} fetch failed: {}", symbol, scope, message),
            }
        }
        None
    }

    /// Spawn a live fetch that writes its own result back to the cache.
    ///
    /// Returns `None` when every permit is taken.
    fn spawn_fetch(&self, symbol: &Symbol, scope: FetchScope) -> Option<FetchHandle> {
        let permit = match Arc::clone(&self.permits).try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    "Fetch capacity exhausted, not starting {} fetch for {}",
                    scope, symbol
                );
                return None;
            }
        };

        let source = Arc::clone(&self.source);
        let cache = self.cache.clone();
        let ttl = self.price_ttl;
        let symbol = symbol.clone();

        Some(tokio::spawn(async move {
            let _permit = permit;
            let result = source.fetch(&symbol, scope).await.map(|mut record| {
                record.symbol = symbol.as_str().to_string();
                record
            });
            if let Ok(record) = &result {
                if let Err(err) = cache.set(symbol.as_str(), record.clone(), ttl).await {
                    warn!("Failed to cache {} result for {}: {}", scope, symbol, err);
                }
            }
            result
        }))
    }
}
