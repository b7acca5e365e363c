//! Data models for contracts, enriched records and surface grids.

mod contract;
mod grid;
mod record;

pub use contract::*;
pub use grid::*;
pub use record::*;
