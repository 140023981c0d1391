//! Greeks Hedging
//!
//! Offsetting option positions that leave a book delta and gamma neutral,
//! plus the plain share delta hedge.

mod config;
mod neutralizer;

pub use config::*;
pub use neutralizer::*;
