//! Mean-Variance Portfolio Optimization
//!
//! Markowitz optimization over mean/covariance estimates:
//! - **Target-return QP**: minimum variance with a budget constraint, optional
//!   long-only bounds and a minimum expected return
//! - **Max utility**: closed-form δΣw = μ, shorting allowed
//! - **Efficient frontier**: per-target sweep with per-point outcomes
//! - **Random portfolios**: long-only Dirichlet samples for exploration

mod config;
mod frontier;
mod optimizer;
pub mod qp;
mod sampling;

pub use config::*;
pub use frontier::*;
pub use optimizer::*;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Weights with their expected return and volatility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioPoint {
    pub weights: Array1<f64>,
    /// μᵀw
    pub expected_return: f64,
    /// sqrt(wᵀΣw)
    pub volatility: f64,
}

impl PortfolioPoint {
    pub fn weight_sum(&self) -> f64 {
        self.weights.sum()
    }

    /// (return - risk_free) / volatility, None for a riskless portfolio
    pub fn sharpe(&self, risk_free: f64) -> Option<f64> {
        if self.volatility > 0.0 {
            Some((self.expected_return - risk_free) / self.volatility)
        } else {
            None
        }
    }
}

/// Point with the highest Sharpe ratio
pub fn best_sharpe<'a, I>(points: I, risk_free: f64) -> Option<&'a PortfolioPoint>
where
    I: IntoIterator<Item = &'a PortfolioPoint>,
{
    points
        .into_iter()
        .filter_map(|p| p.sharpe(risk_free).map(|s| (p, s)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(p, _)| p)
}
