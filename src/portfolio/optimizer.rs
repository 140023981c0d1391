//! Markowitz optimizer
//!
//! Target-return form (quadratic program):
//!
//! ```text
//! minimize wᵀΣw  s.t.  wᵀμ ≥ μ*,  wᵀ1 = 1,  w ≥ 0 (long-only)
//! ```
//!
//! Risk-aversion form (closed form, no budget or sign constraint):
//!
//! ```text
//! δΣw = μ
//! ```

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use super::config::OptimizerConfig;
use super::qp::{solve_active_set, LinearConstraint, QuadraticProgram};
use super::PortfolioPoint;
use crate::core::{MarketEstimates, QuantError, QuantResult, SolverStatus};
use crate::linalg;

/// Closed-form max-utility portfolio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilityAllocation {
    /// Weights need not sum to one and may be negative
    pub point: PortfolioPoint,
    pub risk_aversion: f64,
    /// μᵀw - δ/2 · wᵀΣw
    pub utility: f64,
}

/// Mean-variance optimizer over validated return estimates
#[derive(Debug, Clone)]
pub struct PortfolioOptimizer {
    symbols: Vec<String>,
    mean: Array1<f64>,
    covariance: Array2<f64>,
    config: OptimizerConfig,
}

impl PortfolioOptimizer {
    pub fn new(estimates: MarketEstimates, config: OptimizerConfig) -> QuantResult<Self> {
        let MarketEstimates {
            symbols,
            mean,
            covariance,
        } = estimates;
        let k = mean.len();
        if k == 0 {
            return Err(QuantError::invalid_argument("need at least one asset"));
        }
        if symbols.len() != k || covariance.dim() != (k, k) {
            return Err(QuantError::invalid_argument(format!(
                "{} symbols, {} means and {:?} covariance do not agree",
                symbols.len(),
                k,
                covariance.dim()
            )));
        }
        if mean.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(QuantError::invalid_argument("estimates contain non-finite values"));
        }

        let covariance = validate_covariance(covariance, &config)?;

        Ok(Self {
            symbols,
            mean,
            covariance,
            config,
        })
    }

    /// Optimizer over unnamed assets
    pub fn from_moments(
        mean: Array1<f64>,
        covariance: Array2<f64>,
        config: OptimizerConfig,
    ) -> QuantResult<Self> {
        let symbols = (0..mean.len()).map(|i| format!("asset_{}", i)).collect();
        Self::new(
            MarketEstimates {
                symbols,
                mean,
                covariance,
            },
            config,
        )
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn num_assets(&self) -> usize {
        self.mean.len()
    }

    /// Expected return and volatility of arbitrary weights
    pub fn evaluate(&self, weights: Array1<f64>) -> QuantResult<PortfolioPoint> {
        if weights.len() != self.num_assets() {
            return Err(QuantError::invalid_argument(format!(
                "{} weights for {} assets",
                weights.len(),
                self.num_assets()
            )));
        }
        let expected_return = self.mean.dot(&weights);
        let variance = linalg::quadratic_form(&weights, &self.covariance).max(0.0);
        Ok(PortfolioPoint {
            weights,
            expected_return,
            volatility: variance.sqrt(),
        })
    }

    /// Highest expected return any fully invested long-only portfolio reaches
    pub fn max_long_only_return(&self) -> f64 {
        self.mean.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Minimum-variance portfolio with expected return at least `target`.
    ///
    /// `None` gives the global minimum-variance portfolio. Weights always sum
    /// to one; with `long_only` they are also non-negative.
    pub fn min_variance(&self, target: Option<f64>, long_only: bool) -> QuantResult<PortfolioPoint> {
        let k = self.num_assets();
        if let Some(t) = target {
            if !t.is_finite() {
                return Err(QuantError::invalid_argument("target return must be finite"));
            }
        }

        let start = self.feasible_start(target, long_only)?;

        // Normalize Σ by its mean variance so KKT pivots don't depend on return units
        let scale = (self.covariance.diag().sum() / k as f64).max(f64::MIN_POSITIVE);
        let ridge = Array2::<f64>::eye(k) * self.config.solver.regularization;
        let hessian = (&self.covariance / scale + &ridge) * 2.0;

        let mut inequalities = Vec::new();
        if let Some(t) = target {
            inequalities.push(LinearConstraint::new(self.mean.clone(), t));
        }
        if long_only {
            for i in 0..k {
                let mut e = Array1::zeros(k);
                e[i] = 1.0;
                inequalities.push(LinearConstraint::new(e, 0.0));
            }
        }

        let qp = QuadraticProgram {
            hessian,
            linear: Array1::zeros(k),
            equalities: vec![LinearConstraint::new(Array1::ones(k), 1.0)],
            inequalities,
        };

        let solution = solve_active_set(&qp, start, &self.config.solver)?;

        let mut weights = solution.x;
        if long_only {
            // Clear roundoff below the bounds
            weights.mapv_inplace(|w| w.max(0.0));
            let total = weights.sum();
            weights /= total;
        }

        self.evaluate(weights)
    }

    /// Maximize μᵀw - δ/2 · wᵀΣw by solving δΣw = μ
    pub fn max_utility(&self, risk_aversion: f64) -> QuantResult<UtilityAllocation> {
        if !(risk_aversion.is_finite() && risk_aversion > 0.0) {
            return Err(QuantError::invalid_argument("risk aversion must be positive"));
        }

        let system = &self.covariance * risk_aversion;
        let weights = linalg::solve(&system, &self.mean).map_err(|e| match e {
            QuantError::SingularMatrix { reason, .. } => {
                QuantError::singular(linalg::condition_number(&system), reason)
            }
            other => other,
        })?;

        let point = self.evaluate(weights)?;
        let utility =
            point.expected_return - 0.5 * risk_aversion * point.volatility * point.volatility;

        Ok(UtilityAllocation {
            point,
            risk_aversion,
            utility,
        })
    }

    /// A point satisfying the budget, bounds and target, built analytically
    fn feasible_start(&self, target: Option<f64>, long_only: bool) -> QuantResult<Array1<f64>> {
        let k = self.num_assets();
        let uniform = Array1::from_elem(k, 1.0 / k as f64);

        let t = match target {
            Some(t) if self.mean.dot(&uniform) < t => t,
            _ => return Ok(uniform),
        };

        let (hi, mu_hi) = self
            .mean
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |best, (i, m)| if m > best.1 { (i, m) } else { best });
        let (lo, mu_lo) = self
            .mean
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, m)| if m < best.1 { (i, m) } else { best });

        if long_only {
            // Same slack as the QP's constraint activity test
            if t > mu_hi + 1e-9 * (1.0 + mu_hi.abs()) {
                return Err(QuantError::optimization(
                    SolverStatus::Infeasible,
                    format!(
                        "target return {:.6} above best long-only return {:.6}",
                        t, mu_hi
                    ),
                ));
            }
            let mut vertex = Array1::zeros(k);
            vertex[hi] = 1.0;
            return Ok(vertex);
        }

        if mu_hi - mu_lo <= f64::EPSILON * mu_hi.abs().max(1.0) {
            return Err(QuantError::optimization(
                SolverStatus::Infeasible,
                format!("all assets return {:.6}, target {:.6} unreachable", mu_hi, t),
            ));
        }

        // Leveraged blend of the best and worst asset hitting the target exactly
        let s = (t - mu_lo) / (mu_hi - mu_lo);
        let mut blend = Array1::zeros(k);
        blend[hi] = s;
        blend[lo] = 1.0 - s;
        Ok(blend)
    }
}

/// Symmetry and positive semi-definiteness checks; returns the symmetrized matrix
fn validate_covariance(covariance: Array2<f64>, config: &OptimizerConfig) -> QuantResult<Array2<f64>> {
    let checks = &config.checks;
    let scale = covariance.iter().fold(0.0_f64, |m, v| m.max(v.abs()));

    let asymmetry = linalg::max_asymmetry(&covariance);
    if asymmetry > checks.symmetry_tolerance * scale.max(f64::MIN_POSITIVE) {
        return Err(QuantError::invalid_argument(format!(
            "covariance matrix is not symmetric (max asymmetry {:.3e})",
            asymmetry
        )));
    }

    let eigenvalues = linalg::symmetric_eigenvalues(&covariance)?;
    let min = eigenvalues[0];
    let max = eigenvalues[eigenvalues.len() - 1];
    if min < -checks.psd_tolerance * max.abs().max(f64::MIN_POSITIVE) {
        return Err(QuantError::invalid_argument(format!(
            "covariance matrix is not positive semi-definite (eigenvalue {:.3e})",
            min
        )));
    }
    if min <= checks.psd_tolerance * max {
        tracing::warn!(
            "Covariance matrix is (nearly) singular: eigenvalues span [{:.3e}, {:.3e}]",
            min,
            max
        );
    }

    Ok((&covariance + &covariance.t()) * 0.5)
}
