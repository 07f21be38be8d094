//! Parallel fetch orchestrator.
//!
//! Normalizes caller symbols, drops duplicates, and runs one future per symbol
//! concurrently. Results are collected as each completes and keyed by canonical
//! symbol, so the returned map is deterministic whatever the completion order.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, warn};
use quotecache_market_data::{FetchScope, PriceRecord, PriceSource, Symbol};

use super::ladder::LadderTier;
use crate::errors::{Error, Result};

/// Per-symbol outcomes keyed by canonical symbol.
pub type SymbolResults<T> = BTreeMap<String, Result<T>>;

/// Normalize one caller-supplied symbol.
pub fn normalize_symbol(raw: &str) -> Result<Symbol> {
    Symbol::parse(raw).map_err(|_| Error::InvalidSymbol(raw.trim().to_string()))
}

/// Split raw input into distinct canonical symbols (first-seen order) and
/// `InvalidSymbol` entries keyed by the trimmed, upper-cased input.
pub fn partition_symbols<S: AsRef<str>>(raw: &[S]) -> (Vec<Symbol>, SymbolResults<()>) {
    let mut symbols: Vec<Symbol> = Vec::with_capacity(raw.len());
    let mut invalid = BTreeMap::new();

    for input in raw {
        match normalize_symbol(input.as_ref()) {
            Ok(symbol) => {
                if !symbols.contains(&symbol) {
                    symbols.push(symbol);
                }
            }
            Err(err) => {
                debug!("Rejecting symbol {:?}: {}", input.as_ref(), err);
                invalid.insert(input.as_ref().trim().to_ascii_uppercase(), Err(err));
            }
        }
    }

    (symbols, invalid)
}

/// Run `task` for every symbol concurrently and collect results as they complete.
///
/// One symbol's failure never affects the others.
pub async fn run_concurrent<T, F, Fut>(symbols: Vec<Symbol>, task: F) -> SymbolResults<T>
where
    F: Fn(Symbol) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut pending: FuturesUnordered<_> = symbols
        .into_iter()
        .map(|symbol| {
            let key = symbol.to_string();
            let fut = task(symbol);
            async move { (key, fut.await) }
        })
        .collect();

    let mut results = BTreeMap::new();
    while let Some((key, result)) = pending.next().await {
        if let Err(err) = &result {
            debug!("Fetch for {} failed: {}", key, err);
        }
        results.insert(key, result);
    }
    results
}

/// Merge `InvalidSymbol` entries from [`partition_symbols`] into a result map.
pub(crate) fn with_invalid<T>(
    mut results: SymbolResults<T>,
    invalid: SymbolResults<()>,
) -> SymbolResults<T> {
    for (key, entry) in invalid {
        if let Err(err) = entry {
            results.entry(key).or_insert(Err(err));
        }
    }
    results
}

/// Fans out full-scope fetches against a source with a flat per-symbol timeout.
///
/// Used where the degradation ladder is not wanted (startup preload, refresh).
#[derive(Clone)]
pub struct FetchOrchestrator {
    source: Arc<dyn PriceSource>,
}

impl FetchOrchestrator {
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &Arc<dyn PriceSource> {
        &self.source
    }

    /// Fetch every symbol concurrently, each bounded by `timeout`.
    pub async fn fetch_all<S: AsRef<str>>(
        &self,
        symbols: &[S],
        timeout: Duration,
    ) -> SymbolResults<PriceRecord> {
        let (symbols, invalid) = partition_symbols(symbols);
        let results = run_concurrent(symbols, |symbol| self.fetch_one(symbol, timeout)).await;
        with_invalid(results, invalid)
    }

    async fn fetch_one(&self, symbol: Symbol, timeout: Duration) -> Result<PriceRecord> {
        match tokio::time::timeout(timeout, self.source.fetch(&symbol, FetchScope::Full)).await {
            Ok(Ok(record)) => Ok(record),
            Ok(Err(err)) => {
                warn!("{} fetch for {} failed: {}", self.source.id(), symbol, err);
                Err(Error::SourceFailure {
                    symbol: symbol.to_string(),
                    tier: LadderTier::Full,
                    message: err.to_string(),
                })
            }
            Err(_) => {
                warn!("{} fetch for {} timed out after {:?}", self.source.id(), symbol, timeout);
                Err(Error::SourceTimeout {
                    symbol: symbol.to_string(),
                    tier: LadderTier::Full,
                })
            }
        }
    }
}
