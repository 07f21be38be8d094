//! Engine module.
//!
//! - [`config`] - `EngineConfig` and the `HotSet`
//! - [`service`] - The `Engine` facade exposed to the API layer
//! - [`preload`] - Hot-set preload and refresh
//! - [`janitor`] - Expired-row sweeps
//! - [`tasks`] - Cancellable background timers
//! - [`model`] - Report types returned by engine operations

pub mod config;
mod janitor;
pub mod model;
mod preload;
pub mod service;
pub mod tasks;


pub use config::{EngineConfig, HotSet};
pub use model::{AnalysisResponse, CacheStatus, CacheStatusEntry, ClearReport, PreloadReport};
pub use service::Engine;
pub use tasks::BackgroundTasks;
