//! Shared numerical and presentation utilities.

pub mod black_scholes;
pub mod chain_table;
pub mod plotting;
