//! Engine configuration.

use std::time::Duration;

use quotecache_market_data::Symbol;

use crate::constants::*;
use crate::errors::{Error, Result};
use crate::fetch::{partition_symbols, LadderConfig};

/// Ordered, duplicate-free set of symbols kept warm in the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HotSet(Vec<Symbol>);

impl HotSet {
    /// Build a hot set from raw symbols. Any malformed symbol is an error.
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Result<Self> {
        let (symbols, invalid) = partition_symbols(raw);
        if let Some(bad) = invalid.keys().next() {
            return Err(Error::InvalidConfigValue(format!(
                "hot set contains invalid symbol '{}'",
                bad
            )));
        }
        Ok(Self(symbols))
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for HotSet {
    fn default() -> Self {
        Self(
            DEFAULT_HOT_SET
                .iter()
                .filter_map(|raw| Symbol::parse(raw).ok())
                .collect(),
        )
    }
}

/// Everything the engine needs to know, passed in at construction.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub price_ttl: Duration,
    pub analysis_ttl: Duration,
    pub ladder: LadderConfig,
    pub hot_set: HotSet,
    pub janitor_interval: Duration,
    /// Must be shorter than `price_ttl` so hot symbols never sit expired.
    pub refresh_interval: Duration,
    pub preload_timeout: Duration,
    pub analysis_timeout: Duration,
    pub max_in_flight_fetches: usize,
    /// Run a preload as soon as background tasks start.
    pub preload_on_start: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_ttl: Duration::from_secs(DEFAULT_PRICE_TTL_SECS),
            analysis_ttl: Duration::from_secs(DEFAULT_ANALYSIS_TTL_SECS),
            ladder: LadderConfig::default(),
            hot_set: HotSet::default(),
            janitor_interval: Duration::from_secs(DEFAULT_JANITOR_INTERVAL_SECS),
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
            preload_timeout: Duration::from_secs(DEFAULT_PRELOAD_TIMEOUT_SECS),
            analysis_timeout: Duration::from_secs(DEFAULT_ANALYSIS_TIMEOUT_SECS),
            max_in_flight_fetches: DEFAULT_MAX_IN_FLIGHT_FETCHES,
            preload_on_start: true,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.price_ttl.is_zero() || self.analysis_ttl.is_zero() {
            return Err(Error::InvalidConfigValue(
                "cache TTLs must be positive".to_string(),
            ));
        }
        self.ladder.validate()?;
        if self.refresh_interval.is_zero() || self.refresh_interval >= self.price_ttl {
            return Err(Error::InvalidConfigValue(format!(
                "refresh interval {:?} must be positive and shorter than the price TTL {:?}",
                self.refresh_interval, self.price_ttl
            )));
        }
        if self.janitor_interval.is_zero() {
            return Err(Error::InvalidConfigValue(
                "janitor interval must be positive".to_string(),
            ));
        }
        if self.preload_timeout.is_zero() || self.analysis_timeout.is_zero() {
            return Err(Error::InvalidConfigValue(
                "preload and analysis timeouts must be positive".to_string(),
            ));
        }
        if self.max_in_flight_fetches == 0 {
            return Err(Error::InvalidConfigValue(
                "max in-flight fetches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hot_set.len(), 16);
        assert_eq!(config.price_ttl, Duration::from_secs(300));
        assert_eq!(config.analysis_ttl, Duration::from_secs(1800));
    }

    #[test]
    fn test_refresh_must_beat_ttl() {
        let config = EngineConfig {
            refresh_interval: Duration::from_secs(300),
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfigValue(_))));
    }

    #[test]
    fn test_rejects_zero_values() {
        let zero_ttl = EngineConfig {
            price_ttl: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(zero_ttl.validate().is_err());

        let zero_capacity = EngineConfig {
            max_in_flight_fetches: 0,
            ..EngineConfig::default()
        };
        assert!(zero_capacity.validate().is_err());

        let zero_janitor = EngineConfig {
            janitor_interval: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(zero_janitor.validate().is_err());
    }

    #[test]
    fn test_hot_set_normalizes_and_dedupes() {
        let hot_set = HotSet::new(&["aapl", "700.HK", "AAPL", "0700.HK", "btc/usd"]).unwrap();
        let canonical: Vec<&str> = hot_set.symbols().iter().map(|s| s.as_str()).collect();
        assert_eq!(canonical, vec!["AAPL", "0700.HK", "BTC-USD"]);
    }

    #[test]
    fn test_hot_set_rejects_invalid_symbol() {
        let err = HotSet::new(&["AAPL", "BADSYM"]).unwrap_err();
        assert!(err.to_string().contains("BADSYM"));
    }
}
