//! Quotecache Core - the caching and degradation engine.
//!
//! This crate is database-agnostic: it defines the `CacheStore` trait that the
//! `storage-sqlite` crate implements, and talks to live data only through the
//! source traits of the market-data crate.
//!
//! ```text
//! caller → Engine ─┬─ valid cache row? → answer
//!                  └─ DegradationLadder → PriceSource (full, then price-only)
//!                                      └→ any cache row → answer (stale)
//!
//! timers: hot-set refresh (preload), janitor (purge expired)
//! ```

pub mod cache;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod fetch;

#[cfg(test)]
mod test_support;

pub use cache::{AnalysisCacheRecord, CacheEntry, CacheRecord, CacheStore, TtlCache};
pub use engine::{
    AnalysisResponse, BackgroundTasks, CacheStatus, ClearReport, Engine, EngineConfig, HotSet,
    PreloadReport,
};
pub use fetch::{LadderConfig, LadderTier, PriceResponse, ServedFrom};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
