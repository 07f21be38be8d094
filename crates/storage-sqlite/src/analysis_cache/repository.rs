use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use std::sync::Arc;

use quotecache_core::cache::{AnalysisCacheRecord, CacheStore};
use quotecache_core::Result;

use super::model::AnalysisCacheDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::analysis_cache;
use crate::utils::to_millis;

/// `CacheStore` for analysis documents backed by the `analysis_cache` table.
pub struct AnalysisCacheRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl AnalysisCacheRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn get_impl(&self, key: &str) -> Result<Option<AnalysisCacheRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let row = analysis_cache::table
            .find(key)
            .select(AnalysisCacheDB::as_select())
            .first::<AnalysisCacheDB>(&mut conn)
            .optional()
            .into_core()?;

        Ok(row.map(AnalysisCacheRecord::try_from).transpose()?)
    }

    fn list_valid_impl(&self, now: DateTime<Utc>) -> Result<Vec<AnalysisCacheRecord>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = analysis_cache::table
            .filter(analysis_cache::expires_at.gt(to_millis(now)))
            .order(analysis_cache::symbol.asc())
            .select(AnalysisCacheDB::as_select())
            .load::<AnalysisCacheDB>(&mut conn)
            .into_core()?;

        rows.into_iter()
            .map(|row| AnalysisCacheRecord::try_from(row).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl CacheStore<AnalysisCacheRecord> for AnalysisCacheRepository {
    async fn get(&self, symbol: &str) -> Result<Option<AnalysisCacheRecord>> {
        self.get_impl(symbol)
    }

    async fn upsert(&self, entry: AnalysisCacheRecord) -> Result<AnalysisCacheRecord> {
        let row = AnalysisCacheDB::try_from(&entry)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(analysis_cache::table)
                    .values(&row)
                    .on_conflict(analysis_cache::symbol)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;

        Ok(entry)
    }

    async fn list_valid(&self, now: DateTime<Utc>) -> Result<Vec<AnalysisCacheRecord>> {
        self.list_valid_impl(now)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = to_millis(now);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let removed = diesel::delete(
                    analysis_cache::table.filter(analysis_cache::expires_at.le(cutoff)),
                )
                .execute(conn)
                .map_err(StorageError::from)?;
                Ok(removed)
            })
            .await
    }
}
