use std::{sync::Arc, time::Duration};

use crate::config::Config;
use quotecache_core::{AnalysisCacheRecord, CacheRecord, CacheStore, Engine};
use quotecache_market_data::{PriceSource, Throttled, YahooSource};
use quotecache_storage_sqlite::{db, AnalysisCacheRepository, PriceCacheRepository};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub engine: Arc<Engine>,
    /// Per-request `timeout` overrides must stay below this.
    pub request_timeout: Duration,
}

pub fn init_tracing() {
    let log_format = std::env::var("QC_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Wires the engine to Yahoo Finance behind the configured throttle.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let source = Throttled::new(YahooSource::new()?, config.throttle.clone());
    build_state_with_source(config, Arc::new(source)).await
}

/// Opens the database, runs migrations and builds the engine around `source`.
///
/// Background tasks are not started here; see [`Engine::start`].
pub async fn build_state_with_source(
    config: &Config,
    source: Arc<dyn PriceSource>,
) -> anyhow::Result<Arc<AppState>> {
    db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", config.db_path);

    let pool = db::create_pool(&config.db_path)?;
    db::run_migrations(&pool)?;
    let writer = db::spawn_writer(&pool)?;

    let price_store: Arc<dyn CacheStore<CacheRecord>> =
        Arc::new(PriceCacheRepository::new(pool.clone(), writer.clone()));
    let analysis_store: Arc<dyn CacheStore<AnalysisCacheRecord>> =
        Arc::new(AnalysisCacheRepository::new(pool, writer));

    let source_id = source.id();
    let engine = Engine::new(config.engine.clone(), source, price_store, analysis_store)?;
    tracing::info!(
        "Engine ready: source={}, hot set of {} symbols",
        source_id,
        engine.config().hot_set.len()
    );

    Ok(Arc::new(AppState {
        engine: Arc::new(engine),
        request_timeout: config.request_timeout,
    }))
}
