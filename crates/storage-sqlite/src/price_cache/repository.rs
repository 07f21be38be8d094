use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use quotecache_core::cache::{CacheRecord, CacheStore};
use quotecache_core::Result;

use super::model::PriceCacheDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::price_cache;
use crate::utils::to_millis;

/// `CacheStore` for price rows backed by the `price_cache` table.
pub struct PriceCacheRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PriceCacheRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn find_impl(
        &self,
        key: &str,
        valid_at: Option<DateTime<Utc>>,
    ) -> Result<Option<CacheRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = price_cache::table
            .select(PriceCacheDB::as_select())
            .filter(price_cache::symbol.eq(key))
            .into_boxed();
        if let Some(now) = valid_at {
            query = query.filter(price_cache::expires_at.gt(to_millis(now)));
        }

        let row = query
            .first::<PriceCacheDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(CacheRecord::try_from).transpose()?)
    }

    fn list_valid_impl(&self, now: DateTime<Utc>) -> Result<Vec<CacheRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = price_cache::table
            .filter(price_cache::expires_at.gt(to_millis(now)))
            .order(price_cache::symbol.asc())
            .select(PriceCacheDB::as_select())
            .load::<PriceCacheDB>(&mut conn)
            .into_core()?;

        rows.into_iter()
            .map(|row| CacheRecord::try_from(row).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl CacheStore<CacheRecord> for PriceCacheRepository {
    async fn get(&self, symbol: &str) -> Result<Option<CacheRecord>> {
        self.find_impl(symbol, None)
    }

    async fn get_valid(&self, symbol: &str, now: DateTime<Utc>) -> Result<Option<CacheRecord>> {
        self.find_impl(symbol, Some(now))
    }

    async fn upsert(&self, entry: CacheRecord) -> Result<CacheRecord> {
        let row = PriceCacheDB::from(&entry);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(price_cache::table)
                    .values(&row)
                    .on_conflict(price_cache::symbol)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;

        Ok(entry)
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<CacheRecord>> {
        self.list_valid_impl(now)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = to_millis(now);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed =
                    diesel::delete(price_cache::table.filter(price_cache::expires_at.le(cutoff)))
                        .execute(conn)
                        .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_db;
    use chrono::{Duration, TimeZone};
    use quotecache_core::CacheEntry;
    use quotecache_market_data::PriceRecord;
    use rust_decimal_macros::dec;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn row(symbol: &str, price: rust_decimal::Decimal, ttl_minutes: i64) -> CacheRecord {
        CacheRecord::stamp(
            symbol,
            PriceRecord::new(symbol, price, "USD"),
            t0(),
            t0() + Duration::minutes(ttl_minutes),
        )
    }

    #[tokio::test]
    async fn test_upsert_replaces_whole_row() {
        let db = test_db::setup();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());

        let mut first = row("AAPL", dec!(190), 5);
        first.record.volume = Some(dec!(1000));
        repo.upsert(first).await.unwrap();
        repo.upsert(row("AAPL", dec!(191.5), 5)).await.unwrap();

        let stored = repo.get("AAPL").await.unwrap().unwrap();
        assert_eq!(stored.record.price, dec!(191.5));
        assert_eq!(stored.record.volume, None);
        assert_eq!(repo.list_valid(t0()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_valid_respects_expiry_boundary() {
        let db = test_db::setup();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());
        repo.upsert(row("MSFT", dec!(410), 5)).await.unwrap();

        let just_before = t0() + Duration::minutes(5) - Duration::milliseconds(1);
        assert!(repo.get_valid("MSFT", just_before).await.unwrap().is_some());
        assert!(repo
            .get_valid("MSFT", t0() + Duration::minutes(5))
            .await
            .unwrap()
            .is_none());

        // Expired rows are still returned by `get`.
        assert!(repo.get("MSFT").await.unwrap().is_some());
        assert!(repo.get("NVDA").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_removes_only_expired_rows() {
        let db = test_db::setup();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());
        repo.upsert(row("AAPL", dec!(190), 1)).await.unwrap();
        repo.upsert(row("BTC-USD", dec!(64000), 1)).await.unwrap();
        repo.upsert(row("TSLA", dec!(180), 10)).await.unwrap();

        let now = t0() + Duration::minutes(2);
        assert_eq!(repo.purge_expired(now).await.unwrap(), 2);
        assert_eq!(repo.purge_expired(now).await.unwrap(), 0);

        let valid = repo.list_valid(now).await.unwrap();
        let symbols: Vec<&str> = valid.iter().map(|r| r.symbol()).collect();
        assert_eq!(symbols, vec!["TSLA"]);
    }

    #[tokio::test]
    async fn test_list_valid_is_ordered_by_symbol() {
        let db = test_db::setup();
        let repo = PriceCacheRepository::new(db.pool.clone(), db.writer.clone());
        for symbol in ["TSLA", "0700.HK", "AAPL"] {
            repo.upsert(row(symbol, dec!(1), 5)).await.unwrap();
        }

        let symbols: Vec<String> = repo
            .list_valid(t0())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.record.symbol)
            .collect();
        assert_eq!(symbols, vec!["0700.HK", "AAPL", "TSLA"]);
    }
}
