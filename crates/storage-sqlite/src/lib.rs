//! SQLite storage for the quotecache engine.
//!
//! This crate is the only place where Diesel lives. It implements the
//! `CacheStore` trait from `quotecache-core` for both cache tables:
//! - connection pooling and PRAGMA setup
//! - embedded Diesel migrations
//! - a single writer actor that serializes every write
//! - `price_cache` and `analysis_cache` repositories
//!
//! ```text
//! core (engine, CacheStore trait)
//!                  │
//!                  ▼
//!          storage-sqlite (this crate)
//!                  │
//!                  ▼
//!              SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod schema;

pub mod analysis_cache;
pub mod price_cache;

mod utils;

pub use db::{
    create_pool, get_connection, init, run_migrations, spawn_writer, DbConnection, DbPool,
    WriteHandle,
};

pub use errors::{IntoCore, StorageError};

pub use analysis_cache::AnalysisCacheRepository;
pub use price_cache::PriceCacheRepository;

pub use quotecache_core::errors::{DatabaseError, Error, Result};
