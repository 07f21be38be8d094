//! Cache row models.

use chrono::{DateTime, Utc};
use quotecache_market_data::PriceRecord;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A row in one of the cache tables.
///
/// Rows are keyed by canonical symbol and always replaced whole.
pub trait CacheEntry: Clone + Send + Sync + 'static {
    /// What the caller supplies when writing; the cache adds the timestamps.
    type Payload: Send;

    /// Build a row from its payload and write timestamps.
    fn stamp(
        symbol: &str,
        payload: Self::Payload,
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self;

    fn symbol(&self) -> &str;

    fn cached_at(&self) -> DateTime<Utc>;

    fn expires_at(&self) -> DateTime<Utc>;

    /// Valid iff `now < expires_at`.
    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at()
    }
}

/// Price cache row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(flatten)]
    pub record: PriceRecord,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry for CacheRecord {
    type Payload = PriceRecord;

    fn stamp(
        symbol: &str,
        mut payload: PriceRecord,
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        payload.symbol = symbol.to_string();
        Self {
            record: payload,
            cached_at,
            expires_at,
        }
    }

    fn symbol(&self) -> &str {
        &self.record.symbol
    }

    fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Analysis cache row. The result document is opaque to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisCacheRecord {
    pub symbol: String,
    pub result: Value,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry for AnalysisCacheRecord {
    type Payload = Value;

    fn stamp(
        symbol: &str,
        payload: Value,
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            symbol: symbol.to_string(),
            result: payload,
            cached_at,
            expires_at,
        }
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
