//! In-memory cache store.
//!
//! Non-durable. Useful for tests and for running the engine without a database.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::CacheEntry;
use super::store::CacheStore;
use crate::errors::Result;

pub struct MemoryCacheStore<R> {
    rows: RwLock<BTreeMap<String, R>>,
}

impl<R> MemoryCacheStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, R>> {
        self.rows.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, R>> {
        self.rows.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Number of rows, valid or not.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl<R> Default for MemoryCacheStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: CacheEntry> CacheStore<R> for MemoryCacheStore<R> {
    async fn get(&self, symbol: &str) -> Result<Option<R>> {
        Ok(self.read().get(symbol).cloned())
    }

    async fn upsert(&self, entry: R) -> Result<R> {
        self.write()
            .insert(entry.symbol().to_string(), entry.clone());
        Ok(entry)
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<R>> {
        Ok(self
            .read()
            .values()
            .filter(|row| row.is_valid_at(now))
            .cloned()
            .collect())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut rows = self.write();
        let before = rows.len();
        rows.retain(|_, row| row.is_valid_at(now));
        Ok(before - rows.len())
    }
}
