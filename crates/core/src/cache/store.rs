//! Cache storage trait.
//!
//! This trait abstracts the persistence layer for both cache tables, allowing
//! SQLite or the in-memory store to be used interchangeably.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::CacheEntry;
use crate::errors::Result;

/// Storage interface for one cache table.
///
/// Every operation is a short, single-statement read or write. Implementations
/// must not hold locks across calls.
///
/// # Method Contract
///
/// - `get` returns the row regardless of expiry
/// - `upsert` replaces the whole row for its symbol (last writer wins)
/// - `purge_expired` deletes rows with `expires_at <= now` and returns the count
#[async_trait]
pub trait CacheStore<R: CacheEntry>: Send + Sync {
    /// Returns the row for a symbol, expired or not.
    async fn get(&self, symbol: &str) -> Result<Option<R>>;

    /// Returns the row for a symbol only if `now < expires_at`.
    async fn get_valid(&self, symbol: &str, now: DateTime<Utc>) -> Result<Option<R>> {
        Ok(self.get(symbol).await?.filter(|row| row.is_valid_at(now)))
    }

    /// Inserts or replaces the row keyed by `entry.symbol()`.
    async fn upsert(&self, entry: R) -> Result<R>;

    /// Snapshot of all rows valid at `now`, ordered by symbol.
    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<R>>;

    /// Deletes every row with `expires_at <= now`.
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize>;
}
