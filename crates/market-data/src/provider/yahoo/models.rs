//! Yahoo Finance API response models.
//!
//! These models are used for parsing the quoteSummary API responses
//! which carry the enrichment fields the chart API does not.

use serde::Deserialize;

/// Main response wrapper for quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

/// Quote summary container
#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    /// `null` when Yahoo does not know the symbol
    pub result: Option<Vec<YahooQuoteSummaryResult>>,
}

/// Individual result from quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResult {
    pub price: Option<YahooPriceData>,
    pub summary_detail: Option<YahooSummaryDetail>,
}

/// Price module from quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooPriceData {
    pub currency: Option<String>,
    pub regular_market_price: Option<YahooPriceDetail>,
    pub regular_market_change: Option<YahooPriceDetail>,
    /// Fraction, not percent: 0.0123 means 1.23%
    pub regular_market_change_percent: Option<YahooPriceDetail>,
    pub regular_market_previous_close: Option<YahooPriceDetail>,
    pub regular_market_volume: Option<YahooPriceDetail>,
}

/// Price detail with raw and formatted values
#[derive(Debug, Deserialize, Clone)]
pub struct YahooPriceDetail {
    pub raw: Option<f64>,
}

/// Summary detail module (financial metrics)
/// Yahoo returns these as nested objects like {"raw": 123.45, "fmt": "123.45"}
/// or empty objects {} when no data is available.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooSummaryDetail {
    pub market_cap: Option<YahooPriceDetail>,
    #[serde(rename = "trailingPE")]
    pub trailing_pe: Option<YahooPriceDetail>,
    pub volume: Option<YahooPriceDetail>,
}

/// Read the raw value of an optional detail.
pub fn raw(detail: &Option<YahooPriceDetail>) -> Option<f64> {
    detail.as_ref().and_then(|d| d.raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_price_detail_null() {
        let json = r#"{"raw": null, "fmt": null}"#;
        let detail: YahooPriceDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.raw, None);
    }

    #[test]
    fn test_deserialize_price_module() {
        let json = r#"{
            "currency": "HKD",
            "regularMarketPrice": {"raw": 382.4, "fmt": "382.40"},
            "regularMarketChange": {"raw": -3.6, "fmt": "-3.60"},
            "regularMarketChangePercent": {"raw": -0.0093, "fmt": "-0.93%"},
            "regularMarketPreviousClose": {"raw": 386.0, "fmt": "386.00"},
            "regularMarketVolume": {}
        }"#;
        let price: YahooPriceData = serde_json::from_str(json).unwrap();
        assert_eq!(price.currency.as_deref(), Some("HKD"));
        assert_eq!(raw(&price.regular_market_price), Some(382.4));
        assert_eq!(raw(&price.regular_market_change_percent), Some(-0.0093));
        assert_eq!(raw(&price.regular_market_volume), None);
    }

    #[test]
    fn test_deserialize_summary_detail_empty_objects() {
        // Crypto pairs have no P/E: Yahoo sends {}
        let json = r#"{
            "marketCap": {"raw": 1000000000000, "fmt": "1T"},
            "trailingPE": {},
            "volume": {"raw": 31500000, "fmt": "31.5M"}
        }"#;
        let detail: YahooSummaryDetail = serde_json::from_str(json).unwrap();
        assert_eq!(raw(&detail.market_cap), Some(1000000000000.0));
        assert_eq!(raw(&detail.trailing_pe), None);
        assert_eq!(raw(&detail.volume), Some(31500000.0));
    }

    #[test]
    fn test_deserialize_empty_result() {
        let json = r#"{"quoteSummary": {"result": null, "error": {"code": "Not Found"}}}"#;
        let parsed: YahooQuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.quote_summary.result.is_none());

        let json = r#"{"quoteSummary": {"result": []}}"#;
        let parsed: YahooQuoteSummaryResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.quote_summary.result.map(|r| r.len()), Some(0));
    }
}
