//! TTL cache module.
//!
//! - [`model`] - Cache rows (`CacheRecord`, `AnalysisCacheRecord`) and the `CacheEntry` trait
//! - [`store`] - The `CacheStore` persistence trait
//! - [`clock`] - Wall-clock abstraction used for expiry decisions
//! - [`service`] - `TtlCache`, which stamps expiry and applies validity rules
//! - [`memory`] - A non-durable in-process `CacheStore`
//!
//! ```text
//! Engine → TtlCache<R> → CacheStore<R> (SQLite / memory)
//!              ↓
//!            Clock
//! ```
//!
//! A record is valid iff `now < expires_at`. Expired rows stay readable through
//! [`TtlCache::get`] until the janitor purges them; they are the stale fallback tier.

pub mod clock;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use memory::MemoryCacheStore;
pub use model::{AnalysisCacheRecord, CacheEntry, CacheRecord};
pub use service::TtlCache;
pub use store::CacheStore;
