//! Column conversion helpers shared by the cache repositories.
//!
//! Timestamps are stored as Unix epoch milliseconds so that expiry filters are
//! plain integer comparisons on an indexed column.

use chrono::{DateTime, Utc};

use crate::errors::StorageError;

pub fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub fn from_millis(column: &str, millis: i64) -> Result<DateTime<Utc>, StorageError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StorageError::CorruptRow(format!("{}: {} out of range", column, millis)))
}
