//! Option Pricing Models
//!
//! Implements:
//! - Black-Scholes (closed form prices, delta/gamma, implied vol)
//! - Monte Carlo cross-check with caller-supplied randomness

pub mod black_scholes;
pub mod monte_carlo;

pub use black_scholes::*;
pub use monte_carlo::*;
