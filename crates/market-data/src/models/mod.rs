//! Market data models
//!
//! - `price` - What a source returns for one symbol (PriceRecord) and how much of it (FetchScope)
//! - `symbol` - Canonical symbol identity and normalization rules (Symbol, SymbolKind)

mod price;
mod symbol;

pub use price::{FetchScope, PriceRecord};
pub use symbol::{Symbol, SymbolKind};
