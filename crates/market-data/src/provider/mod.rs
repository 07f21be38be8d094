//! Live data sources and their decorators.
//!
//! This module contains:
//! - The `PriceSource` and `AnalysisSource` traits the engine depends on
//! - `Throttled`, a token bucket decorator for any source
//! - The Yahoo Finance implementation

mod throttle;
mod traits;

pub mod yahoo;

pub use throttle::{ThrottleConfig, Throttled};
pub use traits::{AnalysisSource, PriceSource};
