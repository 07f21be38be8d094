//! Cache janitor: purges expired rows from both cache tables.

use log::{debug, info, warn};

use super::model::ClearReport;
use crate::cache::{AnalysisCacheRecord, CacheRecord, TtlCache};
use crate::errors::Result;

/// Per-table purge outcomes. One table failing never skips the other.
pub(crate) struct SweepOutcome {
    pub prices: Result<usize>,
    pub analyses: Result<usize>,
}

impl SweepOutcome {
    pub fn into_report(self) -> Result<ClearReport> {
        let price_removed = self.prices?;
        let analysis_removed = self.analyses?;
        Ok(ClearReport {
            removed_count: price_removed + analysis_removed,
            price_removed,
            analysis_removed,
        })
    }

    /// Log the outcome, swallowing errors.
    pub fn log(&self) {
        match (&self.prices, &self.analyses) {
            (Ok(0), Ok(0)) => debug!("Janitor sweep: nothing expired"),
            (Ok(prices), Ok(analyses)) => {
                info!(
                    "Janitor sweep removed {} price and {} analysis rows",
                    prices, analyses
                )
            }
            (prices, analyses) => {
                if let Err(err) = prices {
                    warn!("Janitor could not purge price cache: {}", err);
                }
                if let Err(err) = analyses {
                    warn!("Janitor could not purge analysis cache: {}", err);
                }
            }
        }
    }
}

pub(crate) async fn sweep(
    prices: &TtlCache<CacheRecord>,
    analyses: &TtlCache<AnalysisCacheRecord>,
) -> SweepOutcome {
    SweepOutcome {
        prices: prices.purge_expired().await,
        analyses: analyses.purge_expired().await,
    }
}
