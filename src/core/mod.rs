//! Core data types
//!
//! Defines fundamental types:
//! - OptionContract / Position: priced European options and holdings in them
//! - Greeks: delta and gamma
//! - PriceSeries / ReturnSeries / MarketEstimates: inputs to the optimizer
//! - QuantError: crate-wide error taxonomy

pub mod error;
pub mod greeks;
pub mod option;
pub mod returns;

pub use error::*;
pub use greeks::*;
pub use option::*;
pub use returns::*;
