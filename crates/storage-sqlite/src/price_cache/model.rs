//! Database model for the price cache.

use std::str::FromStr;

use diesel::prelude::*;
use quotecache_core::cache::CacheRecord;
use quotecache_market_data::PriceRecord;
use rust_decimal::Decimal;

use crate::errors::StorageError;
use crate::utils::{from_millis, to_millis};

/// One row of `price_cache`. Decimals are stored as text to keep full precision.
#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::price_cache)]
#[diesel(primary_key(symbol))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct PriceCacheDB {
    pub symbol: String,
    pub price: String,
    pub change: String,
    pub change_pct: String,
    pub currency: String,
    pub market_cap: Option<String>,
    pub pe_ratio: Option<String>,
    pub volume: Option<String>,
    pub cached_at: i64,
    pub expires_at: i64,
}

fn parse_decimal(column: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .map_err(|e| StorageError::CorruptRow(format!("{}: '{}' ({})", column, value, e)))
}

fn parse_optional(column: &str, value: Option<&str>) -> Result<Option<Decimal>, StorageError> {
    value.map(|v| parse_decimal(column, v)).transpose()
}

impl From<&CacheRecord> for PriceCacheDB {
    fn from(row: &CacheRecord) -> Self {
        let record = &row.record;
        Self {
            symbol: record.symbol.clone(),
            price: record.price.to_string(),
            change: record.change.to_string(),
            change_pct: record.change_pct.to_string(),
            currency: record.currency.clone(),
            market_cap: record.market_cap.map(|d| d.to_string()),
            pe_ratio: record.pe_ratio.map(|d| d.to_string()),
            volume: record.volume.map(|d| d.to_string()),
            cached_at: to_millis(row.cached_at),
            expires_at: to_millis(row.expires_at),
        }
    }
}

impl TryFrom<PriceCacheDB> for CacheRecord {
    type Error = StorageError;

    fn try_from(db: PriceCacheDB) -> Result<Self, Self::Error> {
        let record = PriceRecord {
            price: parse_decimal("price", &db.price)?,
            change: parse_decimal("change", &db.change)?,
            change_pct: parse_decimal("change_pct", &db.change_pct)?,
            market_cap: parse_optional("market_cap", db.market_cap.as_deref())?,
            pe_ratio: parse_optional("pe_ratio", db.pe_ratio.as_deref())?,
            volume: parse_optional("volume", db.volume.as_deref())?,
            symbol: db.symbol,
            currency: db.currency,
        };
        Ok(CacheRecord {
            record,
            cached_at: from_millis("cached_at", db.cached_at)?,
            expires_at: from_millis("expires_at", db.expires_at)?,
        })
    }
}
