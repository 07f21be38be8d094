//! Canonical symbol identity.
//!
//! Every caller-supplied string goes through [`Symbol::parse`] before it reaches a
//! source or the cache, so `aapl`, ` AAPL ` and `AAPL` share one cache entry and
//! `700.HK`, `HK.700` and `00700.HK` all become `0700.HK`.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

lazy_static! {
    /// Hong Kong listing with exchange suffix: `700.HK`, `00700.HK`
    static ref HK_SUFFIX_REGEX: Regex =
        Regex::new(r"^0*([0-9]{1,5})\.HK$").expect("Invalid regex pattern");

    /// Hong Kong listing with exchange prefix: `HK.700`, `HK:0700`
    static ref HK_PREFIX_REGEX: Regex =
        Regex::new(r"^HK[.:]0*([0-9]{1,5})$").expect("Invalid regex pattern");

    /// Crypto pair with separator: `BTC-USD`, `ETH/EUR`, `SOL_USDT`
    static ref CRYPTO_SEPARATED_REGEX: Regex =
        Regex::new(r"^([A-Z0-9]{2,10})[-/_](USD|USDT|USDC|EUR|BTC|ETH)$")
            .expect("Invalid regex pattern");

    /// Crypto pair quoted in a stable coin with no separator: `BTCUSDT`
    static ref CRYPTO_JOINED_REGEX: Regex =
        Regex::new(r"^([A-Z0-9]{2,10})(USDT|USDC)$").expect("Invalid regex pattern");

    /// Equity or index ticker with optional class/exchange suffix
    static ref EQUITY_REGEX: Regex =
        Regex::new(r"^\^?[A-Z]{1,5}([.-][A-Z]{1,2})?$").expect("Invalid regex pattern");
}

/// Market family of a symbol.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// US-style equity or index ticker (`AAPL`, `BRK-B`, `^GSPC`, `SHOP.TO`)
    Equity,
    /// Hong Kong listing (`0700.HK`)
    HongKong,
    /// Crypto pair (`BTC-USD`)
    Crypto,
}

/// A normalized, canonical market symbol.
///
/// Cheap to clone. Ordering and equality follow the canonical string.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Symbol {
    canonical: Arc<str>,
    kind: SymbolKind,
}

impl Symbol {
    /// Normalize a raw, caller-supplied symbol.
    ///
    /// Returns [`MarketDataError::InvalidSymbol`] when the input matches none of the
    /// supported market forms.
    pub fn parse(raw: &str) -> Result<Self, MarketDataError> {
        let cleaned = raw.trim().to_ascii_uppercase();
        if cleaned.is_empty() {
            return Err(MarketDataError::InvalidSymbol(raw.to_string()));
        }

        if let Some(code) = hk_code(&cleaned) {
            return Ok(Self::new(format!("{:04}.HK", code), SymbolKind::HongKong));
        }

        if let Some(caps) = CRYPTO_SEPARATED_REGEX
            .captures(&cleaned)
            .or_else(|| CRYPTO_JOINED_REGEX.captures(&cleaned))
        {
            let base = &caps[1];
            let quote = &caps[2];
            if base != quote {
                return Ok(Self::new(format!("{}-{}", base, quote), SymbolKind::Crypto));
            }
        }

        if EQUITY_REGEX.is_match(&cleaned) {
            return Ok(Self::new(cleaned, SymbolKind::Equity));
        }

        Err(MarketDataError::InvalidSymbol(raw.to_string()))
    }

    fn new(canonical: String, kind: SymbolKind) -> Self {
        Self {
            canonical: Arc::from(canonical),
            kind,
        }
    }

    /// The canonical string form, used as the cache key.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn kind(&self) -> SymbolKind {
        self.kind
    }

    /// Currency a quote for this symbol is expected in.
    ///
    /// Stable-coin quoted pairs report USD.
    pub fn default_currency(&self) -> &str {
        match self.kind {
            SymbolKind::Equity => "USD",
            SymbolKind::HongKong => "HKD",
            SymbolKind::Crypto => match self.canonical.rsplit('-').next() {
                Some("USDT") | Some("USDC") | None => "USD",
                Some(quote) => quote,
            },
        }
    }
}

fn hk_code(cleaned: &str) -> Option<u32> {
    let caps = HK_SUFFIX_REGEX
        .captures(cleaned)
        .or_else(|| HK_PREFIX_REGEX.captures(cleaned))?;
    let code: u32 = caps[1].parse().ok()?;
    (code >= 1).then_some(code)
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl FromStr for Symbol {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}

impl Serialize for Symbol {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical)
    }
}

impl<'de> Deserialize<'de> for Symbol {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
