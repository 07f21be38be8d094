//! Quotecache Market Data Crate
//!
//! This crate owns everything that talks to a live market data backend:
//! symbol normalization, the source traits the caching engine depends on,
//! a throttling decorator and the Yahoo Finance implementation.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Caller input   | --> |     Symbol       |  (canonical identity, cache key)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   PriceSource    |  (Yahoo, wrapped in Throttled)
//!                          +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   PriceRecord    |  (price, change, enrichment)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`Symbol`] - Normalized symbol; the only key the cache ever sees
//! - [`PriceRecord`] - What a source returns for one symbol
//! - [`FetchScope`] - Full record or the cheaper price-only subset
//! - [`PriceSource`] / [`AnalysisSource`] - Seams for live backends

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::MarketDataError;
pub use models::{FetchScope, PriceRecord, Symbol, SymbolKind};
pub use provider::yahoo::YahooSource;
pub use provider::{AnalysisSource, PriceSource, ThrottleConfig, Throttled};
