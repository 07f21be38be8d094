use chrono::{DateTime, Utc};
use quotecache_market_data::PriceRecord;
use serde::{Deserialize, Serialize};

use crate::cache::CacheRecord;

/// Where a price answer came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServedFrom {
    /// A valid cache entry.
    Cache,
    /// A full live fetch.
    Fresh,
    /// A price-only live fetch.
    Partial,
    /// An expired cache entry substituted for a live answer.
    StaleCache,
}

/// A price read as returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceResponse {
    #[serde(flatten)]
    pub record: PriceRecord,
    /// When the record was produced (fetch time for live answers, `cached_at` for cache).
    pub as_of: DateTime<Utc>,
    pub stale: bool,
    pub served_from: ServedFrom,
}

impl PriceResponse {
    pub fn live(record: PriceRecord, served_from: ServedFrom, as_of: DateTime<Utc>) -> Self {
        Self {
            record,
            as_of,
            stale: false,
            served_from,
        }
    }

    /// Answer from a cache row. Stale iff the row has expired at `now`.
    pub fn from_cache(entry: CacheRecord, now: DateTime<Utc>) -> Self {
        let stale = now >= entry.expires_at;
        Self {
            record: entry.record,
            as_of: entry.cached_at,
            stale,
            served_from: if stale {
                ServedFrom::StaleCache
            } else {
                ServedFrom::Cache
            },
        }
    }
}
