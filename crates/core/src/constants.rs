/// Price cache time-to-live
pub const DEFAULT_PRICE_TTL_SECS: u64 = 5 * 60;

/// Analysis cache time-to-live (analysis is costlier to compute)
pub const DEFAULT_ANALYSIS_TTL_SECS: u64 = 30 * 60;

/// Janitor sweep interval
pub const DEFAULT_JANITOR_INTERVAL_SECS: u64 = 60;

/// Hot-set refresh interval, kept below the price TTL
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 4 * 60;

/// Per-symbol budget for preload fetches
pub const DEFAULT_PRELOAD_TIMEOUT_SECS: u64 = 30;

/// Budget for computing one analysis
pub const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 45;

/// Cap on live fetch tasks, including ones whose caller already got an answer
pub const DEFAULT_MAX_IN_FLIGHT_FETCHES: usize = 64;

/// Default hot set: US equities, HK equities and crypto
pub const DEFAULT_HOT_SET: [&str; 16] = [
    "AAPL", "MSFT", "GOOGL", "AMZN", "NVDA", "META", "TSLA", "AMD", "0700.HK", "9988.HK",
    "3690.HK", "1810.HK", "BTC-USD", "ETH-USD", "SOL-USD", "BNB-USD",
];
