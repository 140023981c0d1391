//! Delta-gamma neutralization
//!
//! Two hedge options give a 2x2 system
//!
//! ```text
//! | Γ₁ Γ₂ | |w₁|   | -Γ_book |
//! | Δ₁ Δ₂ | |w₂| = | -Δ_book |
//! ```
//!
//! whose solution is the number of contracts of each hedge that zeroes the
//! book's aggregate delta and gamma. For a short book the right-hand side is
//! the per-contract (gamma, delta) scaled by |contracts|.

use ndarray::{arr1, arr2};
use serde::{Deserialize, Serialize};

use super::config::HedgeConfig;
use crate::core::{Greeks, OptionContract, Position, QuantError, QuantResult};
use crate::linalg;

/// Number of Greeks neutralized (gamma and delta), and so of hedge instruments
pub const NEUTRALIZED_GREEKS: usize = 2;

/// Base position plus the candidate hedge instruments
#[derive(Debug, Clone, Serialize)]
pub struct HedgePortfolio {
    base: Position,
    hedges: Vec<OptionContract>,
}

impl HedgePortfolio {
    pub fn new(base: Position, hedges: Vec<OptionContract>) -> QuantResult<Self> {
        if hedges.len() != NEUTRALIZED_GREEKS {
            return Err(QuantError::invalid_argument(format!(
                "neutralizing {} Greeks needs exactly {} hedge instruments, got {}",
                NEUTRALIZED_GREEKS,
                NEUTRALIZED_GREEKS,
                hedges.len()
            )));
        }
        Ok(Self { base, hedges })
    }

    pub fn base(&self) -> &Position {
        &self.base
    }

    pub fn hedges(&self) -> &[OptionContract] {
        &self.hedges
    }

    /// (gamma, delta) the hedges must supply: the negated book Greeks
    pub fn target(&self) -> [f64; 2] {
        (-self.base.greeks()).gamma_delta()
    }

    /// Column j holds hedge j's (gamma, delta) per contract
    pub fn hedge_matrix(&self) -> [[f64; 2]; 2] {
        let m = self.base.multiplier;
        let a = self.hedges[0].greeks().scale(m);
        let b = self.hedges[1].greeks().scale(m);
        [[a.gamma, b.gamma], [a.delta, b.delta]]
    }
}

/// Raw solution of the hedge system
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HedgeRatios {
    /// Contracts of each hedge instrument (negative = sell)
    pub weights: [f64; 2],
    /// ‖M·w - target‖₂
    pub residual_norm: f64,
    /// 1-norm condition number of M
    pub condition_number: f64,
}

/// Solve `M·w = target` for hedge weights, surfacing conditioning problems
pub fn solve_hedge_ratios(
    matrix: [[f64; 2]; 2],
    target: [f64; 2],
    config: &HedgeConfig,
) -> QuantResult<HedgeRatios> {
    if matrix.iter().flatten().chain(target.iter()).any(|v| !v.is_finite()) {
        return Err(QuantError::invalid_argument("hedge system has non-finite entries"));
    }

    let m = arr2(&matrix.map(|row| row.map(|v| config.round(v))));
    let rhs = arr1(&target.map(|v| config.round(v)));

    let condition = linalg::condition_number(&m);
    if !(condition <= config.max_condition) {
        return Err(QuantError::singular(
            condition,
            "hedge Greeks are collinear, cannot neutralize delta and gamma",
        ));
    }
    if condition > config.warn_condition {
        tracing::warn!(
            "Hedge system is ill-conditioned (condition {:.3e}); ratios are sensitive to input noise",
            condition
        );
    }

    let w = linalg::solve(&m, &rhs).map_err(|e| match e {
        QuantError::SingularMatrix { reason, .. } => QuantError::singular(condition, reason),
        other => other,
    })?;

    // Backward error: residual relative to ‖M‖·‖w‖ + ‖target‖
    let residual_norm = linalg::norm_2(&(m.dot(&w) - &rhs));
    let scale = linalg::norm_1(&m) * linalg::norm_2(&w) + linalg::norm_2(&rhs);
    if residual_norm > config.residual_tolerance * scale.max(f64::MIN_POSITIVE) {
        return Err(QuantError::singular(
            condition,
            format!("hedge solve residual {:.3e} exceeds tolerance", residual_norm),
        ));
    }

    tracing::debug!(
        "Hedge ratios [{:.6}, {:.6}], residual {:.3e}, condition {:.3e}",
        w[0],
        w[1],
        residual_norm,
        condition
    );

    Ok(HedgeRatios {
        weights: [w[0], w[1]],
        residual_norm,
        condition_number: condition,
    })
}

/// Hedge positions that neutralize a book, with diagnostics
#[derive(Debug, Clone, Serialize)]
pub struct HedgeSolution {
    /// Right-hand side that was solved
    pub target: [f64; 2],
    /// Solved ratios and conditioning diagnostics
    pub ratios: HedgeRatios,
    /// One position per hedge instrument
    pub hedge_positions: Vec<Position>,
    /// Aggregate Greeks of base plus hedges
    pub net_greeks: Greeks,
}

impl HedgeSolution {
    pub fn hedge_contracts(&self) -> [f64; 2] {
        self.ratios.weights
    }

    /// Net premium paid (positive) or received (negative) for the hedges
    pub fn hedge_cost(&self) -> f64 {
        self.hedge_positions.iter().map(|p| p.market_value()).sum()
    }
}

/// Solves for delta-gamma neutral hedge ratios
#[derive(Debug, Clone, Default)]
pub struct GreeksNeutralizer {
    config: HedgeConfig,
}

impl GreeksNeutralizer {
    pub fn new(config: HedgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HedgeConfig {
        &self.config
    }

    /// Hedge positions making the portfolio delta and gamma neutral
    pub fn neutralize(&self, portfolio: &HedgePortfolio) -> QuantResult<HedgeSolution> {
        let target = portfolio.target();
        let ratios = solve_hedge_ratios(portfolio.hedge_matrix(), target, &self.config)?;

        let hedge_positions = portfolio
            .hedges()
            .iter()
            .zip(ratios.weights)
            .map(|(contract, contracts)| {
                Position::new(contract.clone(), contracts)?
                    .with_multiplier(portfolio.base().multiplier)
            })
            .collect::<QuantResult<Vec<_>>>()?;

        let net_greeks = portfolio.base().greeks()
            + hedge_positions.iter().map(|p| p.greeks()).sum::<Greeks>();

        tracing::info!(
            "Neutralized book of {} contracts with hedges {:.4} / {:.4} (net delta {:.3e}, gamma {:.3e})",
            portfolio.base().contracts,
            ratios.weights[0],
            ratios.weights[1],
            net_greeks.delta,
            net_greeks.gamma
        );

        Ok(HedgeSolution {
            target,
            ratios,
            hedge_positions,
            net_greeks,
        })
    }
}

/// Shares of the underlying that zero a position's delta
pub fn delta_hedge_shares(position: &Position) -> f64 {
    -position.greeks().delta
}
