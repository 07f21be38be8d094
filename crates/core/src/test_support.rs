//! Shared test doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quotecache_market_data::{FetchScope, MarketDataError, PriceRecord, PriceSource, Symbol};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::cache::{CacheEntry, CacheStore, MemoryCacheStore};
use crate::errors::DatabaseError;

/// How the mock answers one (symbol, scope) pair.
#[derive(Clone, Debug)]
pub enum Behavior {
    Respond { price: Decimal, delay: Duration },
    Fail { message: String, delay: Duration },
    Hang,
}

impl Behavior {
    pub fn respond(price: Decimal) -> Self {
        Self::Respond {
            price,
            delay: Duration::ZERO,
        }
    }

    pub fn respond_after(price: Decimal, secs: f64) -> Self {
        Self::Respond {
            price,
            delay: Duration::from_secs_f64(secs),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self::Fail {
            message: message.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn fail_after(message: &str, secs: f64) -> Self {
        Self::Fail {
            message: message.to_string(),
            delay: Duration::from_secs_f64(secs),
        }
    }
}

/// Scriptable price source. Unscripted pairs use the default behavior.
pub struct MockSource {
    default: Behavior,
    scripted: Mutex<HashMap<(String, FetchScope), Behavior>>,
    calls: Arc<Mutex<Vec<(String, FetchScope)>>>,
}

impl MockSource {
    pub fn new(default: Behavior) -> Self {
        Self {
            default,
            scripted: Mutex::new(HashMap::new()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn always(price: Decimal) -> Self {
        Self::new(Behavior::respond(price))
    }

    pub fn script(self, symbol: &str, scope: FetchScope, behavior: Behavior) -> Self {
        self.scripted
            .lock()
            .unwrap()
            .insert((symbol.to_string(), scope), behavior);
        self
    }

    pub fn calls(&self) -> Vec<(String, FetchScope)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PriceSource for MockSource {
    fn id(&self) -> &'static str {
        "MOCK"
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        scope: FetchScope,
    ) -> Result<PriceRecord, MarketDataError> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), scope));

        let behavior = self
            .scripted
            .lock()
            .unwrap()
            .get(&(symbol.to_string(), scope))
            .cloned()
            .unwrap_or_else(|| self.default.clone());

        match behavior {
            Behavior::Respond { price, delay } => {
                tokio::time::sleep(delay).await;
                let mut record =
                    PriceRecord::new(symbol.as_str(), price, symbol.default_currency());
                if scope == FetchScope::Full {
                    record.volume = Some(dec!(1000));
                }
                Ok(record)
            }
            Behavior::Fail { message, delay } => {
                tokio::time::sleep(delay).await;
                Err(MarketDataError::provider("MOCK", message))
            }
            Behavior::Hang => std::future::pending().await,
        }
    }
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::parse(raw).unwrap()
}

/// Memory store whose reads and writes can be made to fail.
pub struct FlakyStore<R> {
    inner: MemoryCacheStore<R>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<R> FlakyStore<R> {
    pub fn new() -> Self {
        Self {
            inner: MemoryCacheStore::new(),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(&self, flag: &AtomicBool) -> crate::errors::Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(DatabaseError::ConnectionFailed("store offline".to_string()).into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl<R: CacheEntry> CacheStore<R> for FlakyStore<R> {
    async fn get(&self, symbol: &str) -> crate::errors::Result<Option<R>> {
        self.check(&self.fail_reads)?;
        self.inner.get(symbol).await
    }

    async fn upsert(&self, entry: R) -> crate::errors::Result<R> {
        self.check(&self.fail_writes)?;
        self.inner.upsert(entry).await
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> crate::errors::Result<Vec<R>> {
        self.check(&self.fail_reads)?;
        self.inner.list_valid(now).await
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> crate::errors::Result<usize> {
        self.check(&self.fail_writes)?;
        self.inner.purge_expired(now).await
    }
}
