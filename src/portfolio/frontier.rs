//! Efficient frontier sweep
//!
//! Each target return is solved independently. A target that cannot be met
//! (or whose solve fails) is kept as a failed outcome next to its target, so
//! one bad point never hides the rest of the curve.

use rayon::prelude::*;
use serde::Serialize;

use super::optimizer::PortfolioOptimizer;
use super::{best_sharpe, PortfolioPoint};
use crate::core::{QuantError, QuantResult};

/// Result of one frontier target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierOutcome {
    pub target: f64,
    pub result: Result<PortfolioPoint, QuantError>,
}

impl FrontierOutcome {
    pub fn point(&self) -> Option<&PortfolioPoint> {
        self.result.as_ref().ok()
    }
}

/// Frontier in target order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficientFrontier {
    pub long_only: bool,
    pub outcomes: Vec<FrontierOutcome>,
}

impl EfficientFrontier {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Successfully solved points, in target order
    pub fn points(&self) -> impl Iterator<Item = &PortfolioPoint> {
        self.outcomes.iter().filter_map(FrontierOutcome::point)
    }

    /// Targets that failed, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (f64, &QuantError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.target, e)))
    }

    pub fn min_volatility(&self) -> Option<&PortfolioPoint> {
        self.points()
            .min_by(|a, b| a.volatility.total_cmp(&b.volatility))
    }

    pub fn max_sharpe(&self, risk_free: f64) -> Option<&PortfolioPoint> {
        best_sharpe(self.points(), risk_free)
    }
}

impl PortfolioOptimizer {
    /// Minimum-variance portfolio for every target return.
    ///
    /// Sweeps of at least `min_parallel_points` targets run on the rayon pool;
    /// outcome order always matches `targets`.
    pub fn efficient_frontier(&self, targets: &[f64], long_only: bool) -> EfficientFrontier {
        let solve = |&target: &f64| FrontierOutcome {
            target,
            result: self.min_variance(Some(target), long_only),
        };

        let outcomes: Vec<FrontierOutcome> = if targets.len() >= self.config().min_parallel_points {
            targets.par_iter().map(solve).collect()
        } else {
            targets.iter().map(solve).collect()
        };

        let mut solved = 0;
        for outcome in &outcomes {
            match &outcome.result {
                Ok(_) => solved += 1,
                Err(e) => tracing::warn!("Skipping frontier target {:.6}: {}", outcome.target, e),
            }
        }
        tracing::info!(
            "Efficient frontier: {}/{} targets solved (long_only={})",
            solved,
            outcomes.len(),
            long_only
        );

        EfficientFrontier { long_only, outcomes }
    }

    /// `n` evenly spaced targets from the global minimum-variance return up
    /// to the best single-asset return, both ends exact.
    ///
    /// With shorting the minimum-variance return can exceed every asset's
    /// return; the grid then extends upward from it by the spread of asset
    /// returns. Identical asset returns give `n` copies of that return.
    pub fn target_grid(&self, n: usize, long_only: bool) -> QuantResult<Vec<f64>> {
        if n < 2 {
            return Err(QuantError::invalid_argument(format!(
                "frontier grid needs at least 2 points, got {}",
                n
            )));
        }
        let low = self.min_variance(None, long_only)?.expected_return;
        let max_mu = self.max_long_only_return();
        let high = if max_mu > low {
            max_mu
        } else if long_only {
            low
        } else {
            let min_mu = self.mean().iter().copied().fold(f64::INFINITY, f64::min);
            low + (max_mu - min_mu)
        };

        let last = (n - 1) as f64;
        let mut grid: Vec<f64> = (0..n)
            .map(|i| low + (high - low) * i as f64 / last)
            .collect();
        grid[n - 1] = high;
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SolverStatus;
    use crate::portfolio::OptimizerConfig;
    use ndarray::{array, Array2};

    fn optimizer(min_parallel_points: usize) -> PortfolioOptimizer {
        let mean = array![0.06, 0.09, 0.12, 0.16];
        let vols = [0.08, 0.15, 0.22, 0.30];
        let corr = array![
            [1.0, 0.2, 0.1, 0.0],
            [0.2, 1.0, 0.4, 0.3],
            [0.1, 0.4, 1.0, 0.5],
            [0.0, 0.3, 0.5, 1.0]
        ];
        let cov = Array2::from_shape_fn((4, 4), |(i, j)| corr[[i, j]] * vols[i] * vols[j]);
        let config = OptimizerConfig {
            min_parallel_points,
            ..Default::default()
        };
        PortfolioOptimizer::from_moments(mean, cov, config).unwrap()
    }

    #[test]
    fn test_grid_spans_gmv_to_max_return() {
        let opt = optimizer(16);
        let grid = opt.target_grid(5, true).unwrap();
        let gmv = opt.min_variance(None, true).unwrap();
        assert_eq!(grid.len(), 5);
        assert!((grid[0] - gmv.expected_return).abs() < 1e-12);
        assert!((grid[4] - 0.16).abs() < 1e-12);
        assert!(opt.target_grid(1, true).is_err());
    }

    #[test]
    fn test_frontier_volatility_increases() {
        let opt = optimizer(16);
        let grid = opt.target_grid(12, true).unwrap();
        let frontier = opt.efficient_frontier(&grid, true);

        assert_eq!(frontier.len(), 12);
        assert_eq!(frontier.failures().count(), 0);

        let vols: Vec<f64> = frontier.points().map(|p| p.volatility).collect();
        for pair in vols.windows(2) {
            assert!(pair[1] >= pair[0] - 1e-9, "{:?}", vols);
        }
        for (outcome, target) in frontier.outcomes.iter().zip(&grid) {
            assert_eq!(outcome.target, *target);
            let p = outcome.point().unwrap();
            assert!(p.expected_return >= target - 1e-8);
        }
    }

    #[test]
    fn test_failed_targets_stay_in_place() {
        let opt = optimizer(16);
        let targets = [0.08, 0.25, 0.10];
        let frontier = opt.efficient_frontier(&targets, true);

        assert!(frontier.outcomes[0].point().is_some());
        assert!(frontier.outcomes[2].point().is_some());

        let failures: Vec<_> = frontier.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, 0.25);
        assert_eq!(failures[0].1.solver_status(), Some(SolverStatus::Infeasible));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let grid = optimizer(16).target_grid(20, true).unwrap();
        let parallel = optimizer(1).efficient_frontier(&grid, true);
        let sequential = optimizer(usize::MAX).efficient_frontier(&grid, true);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_selectors() {
        let opt = optimizer(16);
        let grid = opt.target_grid(10, true).unwrap();
        let frontier = opt.efficient_frontier(&grid, true);

        let min_vol = frontier.min_volatility().unwrap();
        let gmv = opt.min_variance(None, true).unwrap();
        assert!((min_vol.volatility - gmv.volatility).abs() < 1e-8);

        let tangent = frontier.max_sharpe(0.02).unwrap();
        let best = tangent.sharpe(0.02).unwrap();
        assert!(frontier.points().all(|p| p.sharpe(0.02).unwrap() <= best));
    }

    #[test]
    fn test_grid_ends_exactly_at_max_return() {
        // Diagonal books whose linear grid used to round a few ulps past max μ
        for top in [0.3, 0.7, 0.9, 1.1] {
            for n in [5, 7, 8, 10, 12, 13] {
                let opt = PortfolioOptimizer::from_moments(
                    array![0.1, top],
                    array![[0.04, 0.0], [0.0, 0.09]],
                    OptimizerConfig::default(),
                )
                .unwrap();
                let grid = opt.target_grid(n, true).unwrap();
                assert_eq!(*grid.last().unwrap(), top);
                assert!(grid.windows(2).all(|w| w[1] >= w[0]));

                let frontier = opt.efficient_frontier(&grid, true);
                assert_eq!(frontier.failures().count(), 0, "top {} n {}", top, n);
            }
        }
    }

    #[test]
    fn test_target_within_roundoff_of_max_return_is_feasible() {
        let opt = optimizer(16);
        let p = opt.min_variance(Some(0.16 + 1e-15), true).unwrap();
        assert!((p.weights[3] - 1.0).abs() < 1e-8);
        assert!(opt.min_variance(Some(0.16 + 1e-6), true).is_err());
    }

    #[test]
    fn test_shorting_grid_above_every_asset_return() {
        // Highly correlated pair: the unconstrained GMV is leveraged into the
        // better asset and earns more than either one
        let opt = PortfolioOptimizer::from_moments(
            array![0.10, 0.12],
            array![[0.09, 0.057], [0.057, 0.04]],
            OptimizerConfig::default(),
        )
        .unwrap();
        let gmv = opt.min_variance(None, false).unwrap();
        assert!(gmv.expected_return > 0.12);

        let grid = opt.target_grid(6, false).unwrap();
        assert!((grid[0] - gmv.expected_return).abs() < 1e-12);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert!((grid[5] - (gmv.expected_return + 0.02)).abs() < 1e-12);

        let frontier = opt.efficient_frontier(&grid, false);
        assert_eq!(frontier.failures().count(), 0);
        let vols: Vec<f64> = frontier.points().map(|p| p.volatility).collect();
        assert!(vols.windows(2).all(|w| w[1] >= w[0] - 1e-9), "{:?}", vols);
    }
}
