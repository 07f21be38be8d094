//! Price cache table.

mod model;
mod repository;

pub use model::PriceCacheDB;
pub use repository::PriceCacheRepository;
