//! TTL cache service.
//!
//! [`TtlCache`] is the only way the engine touches a cache table: it stamps
//! `cached_at`/`expires_at` on writes and evaluates validity against its [`Clock`].

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;

use super::clock::{Clock, SystemClock};
use super::model::CacheEntry;
use super::store::CacheStore;
use crate::errors::{Error, Result};

pub struct TtlCache<R> {
    store: Arc<dyn CacheStore<R>>,
    clock: Arc<dyn Clock>,
}

impl<R> Clone for TtlCache<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R: CacheEntry> TtlCache<R> {
    pub fn new(store: Arc<dyn CacheStore<R>>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn with_system_clock(store: Arc<dyn CacheStore<R>>) -> Self {
        Self::new(store, Arc::new(SystemClock))
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Row for `symbol` regardless of validity.
    pub async fn get(&self, symbol: &str) -> Result<Option<R>> {
        self.store.get(symbol).await
    }

    /// Row for `symbol` only while `now < expires_at`.
    pub async fn get_valid(&self, symbol: &str) -> Result<Option<R>> {
        self.store.get_valid(symbol, self.now()).await
    }

    /// Write `payload` under `symbol` with `expires_at = now + ttl`.
    pub async fn set(&self, symbol: &str, payload: R::Payload, ttl: Duration) -> Result<R> {
        let ttl = chrono::Duration::from_std(ttl)
            .ok()
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| Error::InvalidConfigValue(format!("cache ttl {:?}", ttl)))?;

        let cached_at = self.now();
        let entry = R::stamp(symbol, payload, cached_at, cached_at + ttl);
        debug!("Caching {} until {}", symbol, entry.expires_at());
        self.store.upsert(entry).await
    }

    pub async fn list_all_valid(&self) -> Result<Vec<R>> {
        self.store.list_valid(self.now()).await
    }

    /// Delete rows with `expires_at <= now`. Returns the number removed.
    pub async fn purge_expired(&self) -> Result<usize> {
        self.store.purge_expired(self.now()).await
    }
}
