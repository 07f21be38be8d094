//! Yahoo Finance price source.
//!
//! Two endpoints back the two fetch scopes:
//! - `PriceOnly`: the chart API through `yahoo_finance_api` (last two daily closes)
//! - `Full`: the quoteSummary API (`price` and `summaryDetail` modules), which needs
//!   a cookie/crumb pair

mod models;

use std::sync::RwLock;

use async_trait::async_trait;
use lazy_static::lazy_static;
use num_traits::FromPrimitive;
use reqwest::header;
use rust_decimal::Decimal;
use tracing::{debug, warn};
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{FetchScope, PriceRecord, Symbol, SymbolKind};
use crate::provider::PriceSource;

use models::{raw, YahooQuoteSummaryResponse, YahooQuoteSummaryResult};

const PROVIDER_ID: &str = "YAHOO";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

lazy_static! {
    /// Global cache for Yahoo authentication crumb
    static ref YAHOO_CRUMB: RwLock<Option<CrumbData>> = RwLock::default();
}

// ============================================================================
// Yahoo Source
// ============================================================================

/// Yahoo Finance price source.
pub struct YahooSource {
    connector: yahoo::YahooConnector,
    client: reqwest::Client,
}

impl YahooSource {
    /// Create a new Yahoo Finance source.
    pub fn new() -> Result<Self, MarketDataError> {
        let connector = yahoo::YahooConnector::new().map_err(|e| {
            MarketDataError::provider(
                PROVIDER_ID,
                format!("Failed to initialize Yahoo connector: {}", e),
            )
        })?;
        Ok(Self {
            connector,
            client: reqwest::Client::new(),
        })
    }

    // ========================================================================
    // Crumb/Cookie Authentication
    // ========================================================================

    /// Ensure we have a valid Yahoo authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        {
            let guard = YAHOO_CRUMB.read().unwrap_or_else(|p| p.into_inner());
            if let Some(crumb) = guard.as_ref() {
                return Ok(crumb.clone());
            }
        }

        self.fetch_crumb().await
    }

    /// Fetch a new Yahoo authentication crumb.
    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        // Step 1: Get cookie from fc.yahoo.com
        let response = self
            .client
            .get("https://fc.yahoo.com")
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to get cookie: {}", e)))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::provider(PROVIDER_ID, "Failed to parse Yahoo cookie"))?;

        // Step 2: Get crumb using cookie
        let crumb = self
            .client
            .get("https://query1.finance.yahoo.com/v1/test/getcrumb")
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to get crumb: {}", e)))?
            .text()
            .await
            .map_err(|e| MarketDataError::provider(PROVIDER_ID, format!("Failed to read crumb: {}", e)))?;

        let crumb_data = CrumbData { cookie, crumb };

        let mut guard = YAHOO_CRUMB.write().unwrap_or_else(|p| p.into_inner());
        *guard = Some(crumb_data.clone());

        Ok(crumb_data)
    }

    /// Clear the cached crumb (used when authentication fails)
    fn clear_crumb(&self) {
        let mut guard = YAHOO_CRUMB.write().unwrap_or_else(|p| p.into_inner());
        *guard = None;
    }

    // ========================================================================
    // Fetching
    // ========================================================================

    /// Price and daily change from the chart API.
    async fn fetch_price_only(&self, symbol: &Symbol) -> Result<PriceRecord, MarketDataError> {
        let ticker = yahoo_ticker(symbol);

        let response = self
            .connector
            .get_latest_quotes(&ticker, "1d")
            .await
            .map_err(|e| {
                if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
                    MarketDataError::SymbolNotFound(symbol.to_string())
                } else {
                    MarketDataError::provider(PROVIDER_ID, e.to_string())
                }
            })?;

        let quotes = response.quotes().map_err(|e| {
            warn!("No quotes returned for {}: {}", ticker, e);
            MarketDataError::SymbolNotFound(symbol.to_string())
        })?;

        let closes: Vec<f64> = quotes.iter().map(|q| q.close).collect();
        record_from_closes(symbol, &closes)
    }

    /// Price plus enrichment from the quoteSummary API.
    async fn fetch_full(&self, symbol: &Symbol) -> Result<PriceRecord, MarketDataError> {
        let ticker = yahoo_ticker(symbol);
        let crumb = self.ensure_crumb().await?;

        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{}?modules=price,summaryDetail&crumb={}",
            encode(&ticker),
            encode(&crumb.crumb)
        );

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await?;

        match response.status() {
            reqwest::StatusCode::UNAUTHORIZED => {
                self.clear_crumb();
                return Err(MarketDataError::provider(
                    PROVIDER_ID,
                    "Yahoo authentication expired",
                ));
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            reqwest::StatusCode::NOT_FOUND => {
                return Err(MarketDataError::SymbolNotFound(symbol.to_string()));
            }
            _ => {}
        }

        let data: YahooQuoteSummaryResponse = response.json().await.map_err(|e| {
            MarketDataError::provider(
                PROVIDER_ID,
                format!("Failed to parse quoteSummary response: {}", e),
            )
        })?;

        let result = data
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        record_from_summary(symbol, &result)
    }
}

#[async_trait]
impl PriceSource for YahooSource {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn fetch(
        &self,
        symbol: &Symbol,
        scope: FetchScope,
    ) -> Result<PriceRecord, MarketDataError> {
        debug!("Yahoo fetch {} ({})", symbol, scope);
        match scope {
            FetchScope::PriceOnly => self.fetch_price_only(symbol).await,
            FetchScope::Full => self.fetch_full(symbol).await,
        }
    }
}

// ============================================================================
// Mapping
// ============================================================================

/// Ticker Yahoo lists the symbol under. Stable-coin pairs are quoted against USD.
fn yahoo_ticker(symbol: &Symbol) -> String {
    match symbol.kind() {
        SymbolKind::Crypto => match symbol.as_str().rsplit_once('-') {
            Some((base, "USDT" | "USDC")) => format!("{}-USD", base),
            _ => symbol.to_string(),
        },
        SymbolKind::Equity | SymbolKind::HongKong => symbol.to_string(),
    }
}

fn to_decimal(value: f64, field: &str) -> Result<Decimal, MarketDataError> {
    Decimal::from_f64(value).ok_or_else(|| MarketDataError::ValidationFailed {
        message: format!("Failed to convert {} {} to Decimal", field, value),
    })
}

/// Build a price-only record from daily closes, oldest first.
fn record_from_closes(symbol: &Symbol, closes: &[f64]) -> Result<PriceRecord, MarketDataError> {
    let (last, previous) = match closes {
        [] => return Err(MarketDataError::SymbolNotFound(symbol.to_string())),
        [only] => (*only, None),
        [.., previous, last] => (*last, Some(*previous)),
    };

    let record = PriceRecord::new(
        symbol.as_str(),
        to_decimal(last, "close")?,
        symbol.default_currency(),
    );

    match previous {
        Some(previous) => Ok(record.with_previous_close(to_decimal(previous, "previous close")?)),
        None => Ok(record),
    }
}

/// Build a full record from a quoteSummary result.
fn record_from_summary(
    symbol: &Symbol,
    result: &YahooQuoteSummaryResult,
) -> Result<PriceRecord, MarketDataError> {
    let price_data = result
        .price
        .as_ref()
        .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

    let price = raw(&price_data.regular_market_price)
        .and_then(Decimal::from_f64)
        .ok_or_else(|| MarketDataError::ValidationFailed {
            message: format!("No valid price for {}", symbol),
        })?;

    let currency = price_data
        .currency
        .clone()
        .unwrap_or_else(|| symbol.default_currency().to_string());

    let mut record = PriceRecord::new(symbol.as_str(), price, currency);

    match (
        raw(&price_data.regular_market_change).and_then(Decimal::from_f64),
        raw(&price_data.regular_market_change_percent).and_then(Decimal::from_f64),
    ) {
        (Some(change), Some(fraction)) => {
            record.change = change;
            record.change_pct = (fraction * Decimal::ONE_HUNDRED).round_dp(4);
        }
        _ => {
            if let Some(previous) =
                raw(&price_data.regular_market_previous_close).and_then(Decimal::from_f64)
            {
                record = record.with_previous_close(previous);
            }
        }
    }

    let detail = result.summary_detail.as_ref();
    record.market_cap = detail
        .and_then(|d| raw(&d.market_cap))
        .and_then(Decimal::from_f64);
    record.pe_ratio = detail
        .and_then(|d| raw(&d.trailing_pe))
        .and_then(Decimal::from_f64);
    record.volume = detail
        .and_then(|d| raw(&d.volume))
        .or_else(|| raw(&price_data.regular_market_volume))
        .and_then(Decimal::from_f64);

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn symbol(raw: &str) -> Symbol {
        Symbol::parse(raw).unwrap()
    }

    #[test]
    fn test_yahoo_ticker() {
        assert_eq!(yahoo_ticker(&symbol("aapl")), "AAPL");
        assert_eq!(yahoo_ticker(&symbol("700.HK")), "0700.HK");
        assert_eq!(yahoo_ticker(&symbol("BTC-USD")), "BTC-USD");
        assert_eq!(yahoo_ticker(&symbol("ETHUSDT")), "ETH-USD");
        assert_eq!(yahoo_ticker(&symbol("SOL-EUR")), "SOL-EUR");
    }

    #[test]
    fn test_record_from_closes() {
        let record = record_from_closes(&symbol("AAPL"), &[180.0, 200.0, 210.0]).unwrap();
        assert_eq!(record.symbol, "AAPL");
        assert_eq!(record.price, dec!(210));
        assert_eq!(record.change, dec!(10));
        assert_eq!(record.change_pct, dec!(5));
        assert_eq!(record.currency, "USD");
        assert!(record.is_price_only());
    }

    #[test]
    fn test_record_from_single_close() {
        let record = record_from_closes(&symbol("0700.HK"), &[382.5]).unwrap();
        assert_eq!(record.price, dec!(382.5));
        assert_eq!(record.change, Decimal::ZERO);
        assert_eq!(record.currency, "HKD");
    }

    #[test]
    fn test_record_from_no_closes() {
        let err = record_from_closes(&symbol("AAPL"), &[]).unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }

    fn summary(json: &str) -> YahooQuoteSummaryResult {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_record_from_summary() {
        let result = summary(
            r#"{
                "price": {
                    "currency": "USD",
                    "regularMarketPrice": {"raw": 202.5},
                    "regularMarketChange": {"raw": 2.5},
                    "regularMarketChangePercent": {"raw": 0.0125}
                },
                "summaryDetail": {
                    "marketCap": {"raw": 3000000000000},
                    "trailingPE": {"raw": 31.2},
                    "volume": {"raw": 51000000}
                }
            }"#,
        );
        let record = record_from_summary(&symbol("AAPL"), &result).unwrap();
        assert_eq!(record.price, dec!(202.5));
        assert_eq!(record.change, dec!(2.5));
        assert_eq!(record.change_pct, dec!(1.25));
        assert_eq!(record.market_cap, Some(dec!(3000000000000)));
        assert_eq!(record.pe_ratio, Some(dec!(31.2)));
        assert_eq!(record.volume, Some(dec!(51000000)));
        assert!(!record.is_price_only());
    }

    #[test]
    fn test_record_from_summary_falls_back_to_previous_close() {
        let result = summary(
            r#"{
                "price": {
                    "regularMarketPrice": {"raw": 110},
                    "regularMarketPreviousClose": {"raw": 100}
                }
            }"#,
        );
        let record = record_from_summary(&symbol("9988.HK"), &result).unwrap();
        assert_eq!(record.change, dec!(10));
        assert_eq!(record.change_pct, dec!(10));
        assert_eq!(record.currency, "HKD");
        assert!(record.is_price_only());
    }

    #[test]
    fn test_record_from_summary_without_price() {
        let result = summary(r#"{"price": {"regularMarketPrice": {}}}"#);
        let err = record_from_summary(&symbol("AAPL"), &result).unwrap_err();
        assert!(matches!(err, MarketDataError::ValidationFailed { .. }));

        let result = summary(r#"{}"#);
        let err = record_from_summary(&symbol("AAPL"), &result).unwrap_err();
        assert!(matches!(err, MarketDataError::SymbolNotFound(_)));
    }
}
