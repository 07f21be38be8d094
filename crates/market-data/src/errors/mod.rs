//! Error types for the market data crate.
//!
//! [`MarketDataError`] is returned by every [`PriceSource`](crate::PriceSource) and
//! [`AnalysisSource`](crate::AnalysisSource). The caching engine treats all variants
//! except [`MarketDataError::InvalidSymbol`] as "the live source did not answer", and
//! falls through to its next degradation tier.

use thiserror::Error;

/// Errors that can occur while normalizing symbols or talking to a market data source.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The symbol could not be normalized into a canonical form.
    /// Nothing is ever fetched or cached under such a key.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// The source does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The request to the source timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The source that timed out
        provider: String,
    },

    /// The source rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The source that rate limited the request
        provider: String,
    },

    /// A source-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The source that returned the error
        provider: String,
        /// The error message from the source
        message: String,
    },

    /// The source answered with data that could not be turned into a record.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// A network error occurred while communicating with a source.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns true when the failure is a malformed symbol.
    ///
    /// Invalid symbols are surfaced immediately: there is nothing cached under an
    /// unrecognized key, so a cache fallback can never help.
    pub fn is_invalid_symbol(&self) -> bool {
        matches!(self, Self::InvalidSymbol(_))
    }

    /// Shorthand for a [`MarketDataError::ProviderError`].
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
