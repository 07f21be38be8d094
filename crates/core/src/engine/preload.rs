//! Hot-set preload.
//!
//! Fetches every hot symbol through the orchestrator (flat timeout, no ladder)
//! and writes successes to the price cache. Failures are reported, never raised.

use std::time::Duration;

use log::{info, warn};

use super::config::HotSet;
use super::model::PreloadReport;
use crate::cache::{CacheRecord, TtlCache};
use crate::fetch::FetchOrchestrator;

pub(crate) async fn preload(
    orchestrator: &FetchOrchestrator,
    prices: &TtlCache<CacheRecord>,
    hot_set: &HotSet,
    timeout: Duration,
    ttl: Duration,
) -> PreloadReport {
    let results = orchestrator.fetch_all(hot_set.symbols(), timeout).await;

    let mut report = PreloadReport::default();
    for (symbol, result) in results {
        match result {
            Ok(record) => match prices.set(&symbol, record, ttl).await {
                Ok(_) => report.preloaded_count += 1,
                Err(err) => {
                    warn!("Preload could not cache {}: {}", symbol, err);
                    report.failures.push(symbol);
                }
            },
            Err(err) => {
                warn!("Preload fetch for {} failed: {}", symbol, err);
                report.failures.push(symbol);
            }
        }
    }

    info!(
        "Preloaded {}/{} hot symbols ({} failed)",
        report.preloaded_count,
        hot_set.len(),
        report.failures.len()
    );
    report
}
