//! Database model for cached analysis documents.

use diesel::prelude::*;
use quotecache_core::cache::AnalysisCacheRecord;

use crate::errors::StorageError;
use crate::utils::{from_millis, to_millis};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::analysis_cache)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AnalysisCacheDB {
    pub symbol: String,
    pub result_json: String,
    pub cached_at: i64,
    pub expires_at: i64,
}

impl TryFrom<&AnalysisCacheRecord> for AnalysisCacheDB {
    type Error = StorageError;

    fn try_from(row: &AnalysisCacheRecord) -> Result<Self, Self::Error> {
        let result_json = serde_json::to_string(&row.result)
            .map_err(|e| StorageError::CorruptRow(format!("result_json: {}", e)))?;
        Ok(Self {
            symbol: row.symbol.clone(),
            result_json,
            cached_at: to_millis(row.cached_at),
            expires_at: to_millis(row.expires_at),
        })
    }
}

impl TryFrom<AnalysisCacheDB> for AnalysisCacheRecord {
    type Error = StorageError;

    fn try_from(db: AnalysisCacheDB) -> Result<Self, Self::Error> {
        let result = serde_json::from_str(&db.result_json)
            .map_err(|e| StorageError::CorruptRow(format!("result_json: {}", e)))?;
        Ok(Self {
            result,
            cached_at: from_millis("cached_at", db.cached_at)?,
            expires_at: from_millis("expires_at", db.expires_at)?,
            symbol: db.symbol,
        })
    }
}
