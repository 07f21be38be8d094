//! Engine report types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStatusEntry {
    pub symbol: String,
    pub expires_at: DateTime<Utc>,
}

/// Snapshot of the currently valid price cache rows, ordered by symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheStatus {
    pub valid_count: usize,
    pub entries: Vec<CacheStatusEntry>,
    /// Configured hot set, in configuration order.
    pub hot_set: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreloadReport {
    pub preloaded_count: usize,
    /// Symbols whose fetch or cache write failed, ordered by symbol.
    pub failures: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ClearReport {
    pub removed_count: usize,
    pub price_removed: usize,
    pub analysis_removed: usize,
}

/// An analysis read.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub symbol: String,
    pub result: Value,
    /// Served from the cache rather than computed for this call.
    pub cached: bool,
    /// An expired analysis substituted for a failed computation.
    pub stale: bool,
    pub as_of: DateTime<Utc>,
}
