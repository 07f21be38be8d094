use std::{net::SocketAddr, str::FromStr, time::Duration};

use anyhow::{anyhow, bail, Context};
use quotecache_core::{EngineConfig, HotSet, LadderConfig};
use quotecache_market_data::ThrottleConfig;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub engine: EngineConfig,
    pub throttle: ThrottleConfig,
}

impl Config {
    /// Reads `QC_*` variables (after loading `.env`). Unset variables take their
    /// defaults; set but unparseable ones are errors.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = var("QC_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid QC_LISTEN_ADDR")?;
        let db_path = var("QC_DB_PATH").unwrap_or_else(|| "./db/quotecache.db".into());
        let cors_allow = split_list(&var("QC_CORS_ALLOW_ORIGINS").unwrap_or_else(|| "*".into()));
        let timeout_ms: u64 = parse("QC_REQUEST_TIMEOUT_MS")?.unwrap_or(30000);

        let engine = engine_from_env()?;
        engine.validate().map_err(|e| anyhow!(e))?;

        let request_timeout = Duration::from_millis(timeout_ms);
        if request_timeout <= engine.ladder.total {
            bail!(
                "QC_REQUEST_TIMEOUT_MS ({:?}) must exceed the ladder ceiling ({:?})",
                request_timeout,
                engine.ladder.total
            );
        }

        let throttle = match parse::<u32>("QC_SOURCE_REQUESTS_PER_MINUTE")? {
            Some(0) => bail!("QC_SOURCE_REQUESTS_PER_MINUTE must be positive"),
            Some(rpm) => ThrottleConfig::per_minute(rpm),
            None => ThrottleConfig::default(),
        };

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout,
            engine,
            throttle,
        })
    }
}

fn engine_from_env() -> anyhow::Result<EngineConfig> {
    let defaults = EngineConfig::default();

    let ladder = LadderConfig {
        fast: secs("QC_T_FAST_SECS")?.unwrap_or(defaults.ladder.fast),
        cache: secs("QC_T_CACHE_SECS")?.unwrap_or(defaults.ladder.cache),
        total: secs("QC_T_TOTAL_SECS")?.unwrap_or(defaults.ladder.total),
    };

    let hot_set = match var("QC_HOT_SET") {
        Some(raw) => HotSet::new(&split_list(&raw)).map_err(|e| anyhow!("QC_HOT_SET: {}", e))?,
        None => defaults.hot_set,
    };

    Ok(EngineConfig {
        price_ttl: minutes("QC_PRICE_TTL_MINUTES")?.unwrap_or(defaults.price_ttl),
        analysis_ttl: minutes("QC_ANALYSIS_TTL_MINUTES")?.unwrap_or(defaults.analysis_ttl),
        ladder,
        hot_set,
        janitor_interval: secs("QC_JANITOR_INTERVAL_SECS")?.unwrap_or(defaults.janitor_interval),
        refresh_interval: secs("QC_REFRESH_INTERVAL_SECS")?.unwrap_or(defaults.refresh_interval),
        preload_timeout: secs("QC_PRELOAD_TIMEOUT_SECS")?.unwrap_or(defaults.preload_timeout),
        analysis_timeout: defaults.analysis_timeout,
        max_in_flight_fetches: parse("QC_MAX_IN_FLIGHT_FETCHES")?
            .unwrap_or(defaults.max_in_flight_fetches),
        preload_on_start: flag("QC_PRELOAD_ON_START")?.unwrap_or(defaults.preload_on_start),
    })
}

fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse<T>(key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e))
        })
        .transpose()
}

/// Fractional seconds, e.g. `2.5`.
fn secs(key: &str) -> anyhow::Result<Option<Duration>> {
    parse::<f64>(key)?
        .map(|s| Duration::try_from_secs_f64(s).with_context(|| format!("Invalid {}", key)))
        .transpose()
}

fn minutes(key: &str) -> anyhow::Result<Option<Duration>> {
    parse::<u64>(key)?
        .map(|m| {
            m.checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| anyhow!("Invalid {} '{}': too large", key, m))
        })
        .transpose()
}

fn flag(key: &str) -> anyhow::Result<Option<bool>> {
    var(key)
        .map(|raw| match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow!("Invalid {} '{}': expected a boolean flag", key, raw)),
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" AAPL, ,0700.HK,btc-usd "),
            vec!["AAPL", "0700.HK", "btc-usd"]
        );
    }

    #[test]
    fn test_flag_values() {
        std::env::set_var("QC_TEST_FLAG_OFF", "Off");
        std::env::set_var("QC_TEST_FLAG_ON", "1");
        std::env::set_var("QC_TEST_FLAG_BAD", "maybe");

        assert_eq!(flag("QC_TEST_FLAG_OFF").unwrap(), Some(false));
        assert_eq!(flag("QC_TEST_FLAG_ON").unwrap(), Some(true));
        assert!(flag("QC_TEST_FLAG_BAD").is_err());
        assert_eq!(flag("QC_TEST_FLAG_UNSET").unwrap(), None);
    }

    #[test]
    fn test_fractional_seconds() {
        std::env::set_var("QC_TEST_SECS", "2.5");
        std::env::set_var("QC_TEST_SECS_BAD", "-1");

        assert_eq!(secs("QC_TEST_SECS").unwrap(), Some(Duration::from_millis(2500)));
        assert!(secs("QC_TEST_SECS_BAD").is_err());
    }

    #[test]
    fn test_minutes_overflow_is_an_error() {
        std::env::set_var("QC_TEST_MINUTES", "5");
        std::env::set_var("QC_TEST_MINUTES_HUGE", u64::MAX.to_string());

        assert_eq!(minutes("QC_TEST_MINUTES").unwrap(), Some(Duration::from_secs(300)));
        assert!(minutes("QC_TEST_MINUTES_HUGE").is_err());
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        std::env::set_var("QC_TEST_COUNT", "many");
        let err = parse::<usize>("QC_TEST_COUNT").unwrap_err();
        assert!(err.to_string().starts_with("Invalid QC_TEST_COUNT 'many'"));
    }
}
