//! The engine facade.
//!
//! Owns both cache tables, the live source, the orchestrator and the ladder.
//! Everything the API layer calls goes through [`Engine`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use quotecache_market_data::{AnalysisSource, PriceSource, Symbol};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::config::EngineConfig;
use super::janitor;
use super::model::{AnalysisResponse, CacheStatus, CacheStatusEntry, ClearReport, PreloadReport};
use super::preload;
use super::tasks::{spawn_periodic, BackgroundTasks};
use crate::cache::{AnalysisCacheRecord, CacheRecord, CacheStore, Clock, SystemClock, TtlCache};
use crate::errors::{Error, Result};
use crate::fetch::orchestrator::with_invalid;
use crate::fetch::{
    normalize_symbol, partition_symbols, run_concurrent, DegradationLadder, FetchOrchestrator,
    LadderConfig, LadderTier, PriceResponse, SymbolResults,
};

pub struct Engine {
    config: EngineConfig,
    prices: TtlCache<CacheRecord>,
    analyses: TtlCache<AnalysisCacheRecord>,
    orchestrator: FetchOrchestrator,
    ladder: DegradationLadder,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        source: Arc<dyn PriceSource>,
        price_store: Arc<dyn CacheStore<CacheRecord>>,
        analysis_store: Arc<dyn CacheStore<AnalysisCacheRecord>>,
    ) -> Result<Self> {
        Self::with_clock(
            config,
            source,
            price_store,
            analysis_store,
            Arc::new(SystemClock),
        )
    }

    /// Like [`Engine::new`] with an explicit clock for expiry decisions.
    pub fn with_clock(
        config: EngineConfig,
        source: Arc<dyn PriceSource>,
        price_store: Arc<dyn CacheStore<CacheRecord>>,
        analysis_store: Arc<dyn CacheStore<AnalysisCacheRecord>>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;

        let prices = TtlCache::new(price_store, Arc::clone(&clock));
        let analyses = TtlCache::new(analysis_store, clock);
        let ladder = DegradationLadder::new(
            Arc::clone(&source),
            prices.clone(),
            config.price_ttl,
            config.max_in_flight_fetches,
        );

        Ok(Self {
            orchestrator: FetchOrchestrator::new(source),
            prices,
            analyses,
            ladder,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn ladder_config(&self, timeout: Option<Duration>) -> Result<LadderConfig> {
        match timeout {
            Some(timeout) => self.config.ladder.with_total(timeout),
            None => Ok(self.config.ladder),
        }
    }

    // =========================================================================
    // Prices
    // =========================================================================

    /// Price for one symbol: a valid cache row, or the degradation ladder.
    ///
    /// `timeout` replaces the ladder's hard ceiling for this call.
    pub async fn get_price(
        &self,
        symbol: &str,
        timeout: Option<Duration>,
    ) -> Result<PriceResponse> {
        let symbol = normalize_symbol(symbol)?;
        let ladder = self.ladder_config(timeout)?;
        self.price_for(&symbol, &ladder).await
    }

    /// Prices for many symbols, each with its own ladder.
    ///
    /// Per-symbol failures (including malformed symbols) are entries in the map;
    /// only an invalid `timeout` fails the call.
    pub async fn get_prices<S: AsRef<str>>(
        &self,
        symbols: &[S],
        timeout: Option<Duration>,
    ) -> Result<SymbolResults<PriceResponse>> {
        let ladder = self.ladder_config(timeout)?;
        let (symbols, invalid) = partition_symbols(symbols);
        let results = run_concurrent(symbols, |symbol| async move {
            self.price_for(&symbol, &ladder).await
        })
        .await;
        Ok(with_invalid(results, invalid))
    }

    async fn price_for(&self, symbol: &Symbol, ladder: &LadderConfig) -> Result<PriceResponse> {
        match self.prices.get_valid(symbol.as_str()).await {
            Ok(Some(entry)) => {
                debug!("{}: cache hit", symbol);
                return Ok(PriceResponse::from_cache(entry, self.prices.now()));
            }
            Ok(None) => {}
            Err(err) => warn!("Cache read for {} failed, treating as miss: {}", symbol, err),
        }
        self.ladder.run(symbol, ladder).await
    }

    pub async fn cache_status(&self) -> Result<CacheStatus> {
        let mut entries: Vec<CacheStatusEntry> = self
            .prices
            .list_all_valid()
            .await?
            .into_iter()
            .map(|row| CacheStatusEntry {
                symbol: row.record.symbol,
                expires_at: row.expires_at,
            })
            .collect();
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let hot_set = self
            .config
            .hot_set
            .symbols()
            .iter()
            .map(|s| s.to_string())
            .collect();

        Ok(CacheStatus {
            valid_count: entries.len(),
            entries,
            hot_set,
        })
    }

    /// Fetch the whole hot set and cache what comes back.
    pub async fn preload_hot_set(&self) -> PreloadReport {
        preload::preload(
            &self.orchestrator,
            &self.prices,
            &self.config.hot_set,
            self.config.preload_timeout,
            self.config.price_ttl,
        )
        .await
    }

    /// Purge expired rows from both tables. Store errors are returned.
    pub async fn clear_expired(&self) -> Result<ClearReport> {
        janitor::sweep(&self.prices, &self.analyses)
            .await
            .into_report()
    }

    // =========================================================================
    // Analysis
    // =========================================================================

    /// Valid cached analysis, if any. Store errors read as a miss.
    pub async fn get_analysis(&self, symbol: &str) -> Result<Option<AnalysisCacheRecord>> {
        let symbol = normalize_symbol(symbol)?;
        match self.analyses.get_valid(symbol.as_str()).await {
            Ok(row) => Ok(row),
            Err(err) => {
                warn!("Analysis cache read for {} failed, treating as miss: {}", symbol, err);
                Ok(None)
            }
        }
    }

    pub async fn put_analysis(&self, symbol: &str, result: Value) -> Result<AnalysisCacheRecord> {
        let symbol = normalize_symbol(symbol)?;
        self.analyses
            .set(symbol.as_str(), result, self.config.analysis_ttl)
            .await
    }

    /// Cached analysis, or a fresh one computed by `source` within the analysis timeout.
    ///
    /// A failed or timed-out computation falls back to an expired analysis when one exists.
    pub async fn analyze(
        &self,
        symbol: &str,
        source: &dyn AnalysisSource,
    ) -> Result<AnalysisResponse> {
        let symbol = normalize_symbol(symbol)?;
        if let Some(row) = self.get_analysis(symbol.as_str()).await? {
            return Ok(AnalysisResponse {
                symbol: row.symbol,
                result: row.result,
                cached: true,
                stale: false,
                as_of: row.cached_at,
            });
        }

        let computation = source.analyze(&symbol);
        let failure = match tokio::time::timeout(self.config.analysis_timeout, computation).await {
            Ok(Ok(result)) => {
                let as_of = self.analyses.now();
                if let Err(err) = self
                    .analyses
                    .set(symbol.as_str(), result.clone(), self.config.analysis_ttl)
                    .await
                {
                    warn!("Failed to cache analysis for {}: {}", symbol, err);
                }
                return Ok(AnalysisResponse {
                    symbol: symbol.to_string(),
                    result,
                    cached: false,
                    stale: false,
                    as_of,
                });
            }
            Ok(Err(err)) => Error::SourceFailure {
                symbol: symbol.to_string(),
                tier: LadderTier::Full,
                message: err.to_string(),
            },
            Err(_) => Error::SourceTimeout {
                symbol: symbol.to_string(),
                tier: LadderTier::Full,
            },
        };
        warn!("{} analysis for {} failed: {}", source.id(), symbol, failure);

        match self.analyses.get(symbol.as_str()).await {
            Ok(Some(row)) => Ok(AnalysisResponse {
                symbol: row.symbol,
                result: row.result,
                cached: true,
                stale: true,
                as_of: row.cached_at,
            }),
            Ok(None) => Err(failure),
            Err(err) => {
                warn!("Analysis cache read for {} failed: {}", symbol, err);
                Err(failure)
            }
        }
    }

    // =========================================================================
    // Background work
    // =========================================================================

    /// One refresh of the hot set. Same as an on-demand preload.
    pub async fn run_refresh_cycle(&self) -> PreloadReport {
        self.preload_hot_set().await
    }

    /// One janitor pass. Errors are logged and swallowed.
    pub async fn run_janitor_sweep(&self) {
        janitor::sweep(&self.prices, &self.analyses).await.log();
    }

    /// Spawn the startup preload, the refresh timer and the janitor timer.
    pub fn start(self: &Arc<Self>) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new(CancellationToken::new());

        if self.config.preload_on_start {
            let engine = Arc::clone(self);
            let cancel = tasks.token();
            tasks.push(tokio::spawn(async move {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    report = engine.preload_hot_set() => {
                        info!("Startup preload cached {} symbols", report.preloaded_count);
                    }
                }
            }));
        }

        let engine = Arc::clone(self);
        tasks.push(spawn_periodic(
            "hot-set refresh",
            self.config.refresh_interval,
            tasks.token(),
            move || {
                let engine = Arc::clone(&engine);
                async move {
                    engine.run_refresh_cycle().await;
                }
            },
        ));

        let engine = Arc::clone(self);
        tasks.push(spawn_periodic(
            "cache janitor",
            self.config.janitor_interval,
            tasks.token(),
            move || {
                let engine = Arc::clone(&engine);
                async move { engine.run_janitor_sweep().await }
            },
        ));

        tasks
    }
}
