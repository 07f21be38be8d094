//! Live fetch path.
//!
//! - [`orchestrator`] - Symbol normalization and concurrent per-symbol fan-out
//! - [`ladder`] - Tiered timeouts trading freshness for availability
//! - [`model`] - What a price read returns (`PriceResponse`, `ServedFrom`)

pub mod ladder;
pub mod model;
pub mod orchestrator;

pub use ladder::{DegradationLadder, LadderConfig, LadderTier};
pub use model::{PriceResponse, ServedFrom};
pub use orchestrator::{
    normalize_symbol, partition_symbols, run_concurrent, FetchOrchestrator, SymbolResults,
};
