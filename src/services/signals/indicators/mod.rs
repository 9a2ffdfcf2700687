//! Technical indicator implementations.

pub mod atr;
pub mod regression;

pub use atr::Atr;
pub use regression::{linear_slope, mean_abs_change};
