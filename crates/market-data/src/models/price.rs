use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How much of a record the caller needs from the source.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchScope {
    /// Price plus secondary enrichment (fundamentals, volume).
    Full,
    /// Price and daily change only. Cheaper for most backends.
    PriceOnly,
}

impl std::fmt::Display for FetchScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::PriceOnly => write!(f, "price-only"),
        }
    }
}

/// A price record as returned by a source.
///
/// The engine treats it as opaque data: it is cached and served whole,
/// never recomputed or merged field by field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Canonical symbol (see [`Symbol`](crate::Symbol))
    pub symbol: String,

    /// Last traded / current price
    pub price: Decimal,

    /// Absolute change against the previous close
    pub change: Decimal,

    /// Percent change against the previous close
    pub change_pct: Decimal,

    /// Quote currency
    pub currency: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<Decimal>,
}

impl PriceRecord {
    /// Create a record with no change information and no enrichment.
    pub fn new(symbol: impl Into<String>, price: Decimal, currency: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
            change: Decimal::ZERO,
            change_pct: Decimal::ZERO,
            currency: currency.into(),
            market_cap: None,
            pe_ratio: None,
            volume: None,
        }
    }

    /// Set change fields from the previous close.
    ///
    /// A zero previous close leaves `change_pct` at zero.
    pub fn with_previous_close(mut self, previous_close: Decimal) -> Self {
        self.change = self.price - previous_close;
        self.change_pct = if previous_close.is_zero() {
            Decimal::ZERO
        } else {
            (self.change / previous_close * Decimal::ONE_HUNDRED).round_dp(4)
        };
        self
    }

    /// True when none of the enrichment fields are present.
    pub fn is_price_only(&self) -> bool {
        self.market_cap.is_none() && self.pe_ratio.is_none() && self.volume.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_record_new() {
        let record = PriceRecord::new("AAPL", dec!(190.50), "USD");
        assert_eq!(record.price, dec!(190.50));
        assert_eq!(record.change, Decimal::ZERO);
        assert!(record.is_price_only());
    }

    #[test]
    fn test_with_previous_close() {
        let record = PriceRecord::new("AAPL", dec!(110), "USD").with_previous_close(dec!(100));
        assert_eq!(record.change, dec!(10));
        assert_eq!(record.change_pct, dec!(10));

        let record = PriceRecord::new("AAPL", dec!(95), "USD").with_previous_close(dec!(100));
        assert_eq!(record.change, dec!(-5));
        assert_eq!(record.change_pct, dec!(-5));
    }

    #[test]
    fn test_with_zero_previous_close() {
        let record = PriceRecord::new("NEW", dec!(5), "USD").with_previous_close(Decimal::ZERO);
        assert_eq!(record.change, dec!(5));
        assert_eq!(record.change_pct, Decimal::ZERO);
    }

    #[test]
    fn test_serialization_skips_missing_enrichment() {
        let record = PriceRecord::new("BTC-USD", dec!(64000), "USD");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("market_cap").is_none());
        assert_eq!(json["symbol"], "BTC-USD");
    }

    #[test]
    fn test_fetch_scope_display() {
        assert_eq!(FetchScope::Full.to_string(), "full");
        assert_eq!(FetchScope::PriceOnly.to_string(), "price-only");
    }
}
