//! Source trait definitions.
//!
//! The caching engine only ever talks to the outside world through these two
//! traits. Everything behind them (HTTP, auth, rate limits) is the source's concern.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::MarketDataError;
use crate::models::{FetchScope, PriceRecord, Symbol};

/// Trait for live price sources.
///
/// Implement this trait to plug a new backend into the caching engine.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quotecache_market_data::{FetchScope, MarketDataError, PriceRecord, PriceSource, Symbol};
///
/// struct FixedSource;
///
/// #[async_trait]
/// impl PriceSource for FixedSource {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn fetch(&self, symbol: &Symbol, _scope: FetchScope) -> Result<PriceRecord, MarketDataError> {
///         Ok(PriceRecord::new(symbol.as_str(), dec!(1), symbol.default_currency()))
///     }
/// }
/// ```
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Unique identifier for this source, used in logs and error messages.
    fn id(&self) -> &'static str;

    /// Fetch a price record for a normalized symbol.
    ///
    /// With [`FetchScope::PriceOnly`] the source may leave the enrichment fields
    /// empty and should answer faster than with [`FetchScope::Full`].
    async fn fetch(&self, symbol: &Symbol, scope: FetchScope)
        -> Result<PriceRecord, MarketDataError>;
}

/// Trait for analysis backends (e.g. an LLM-backed report generator).
///
/// The result is an opaque JSON document; the engine caches it without looking inside.
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    fn id(&self) -> &'static str;

    async fn analyze(&self, symbol: &Symbol) -> Result<Value, MarketDataError>;
}
