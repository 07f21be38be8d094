//! Analysis cache table.

mod model;
mod repository;

pub use model::AnalysisCacheDB;
pub use repository::AnalysisCacheRepository;
