//! Random long-only portfolios
//!
//! Weights are normalized Exp(1) draws, i.e. uniform on the simplex
//! (Dirichlet with all concentrations equal to one).

use ndarray::Array1;
use rand::Rng;
use rand_distr::Exp1;

use super::optimizer::PortfolioOptimizer;
use super::PortfolioPoint;

impl PortfolioOptimizer {
    /// `n` fully invested long-only portfolios drawn uniformly from the simplex
    pub fn random_portfolios(&self, n: usize, rng: &mut impl Rng) -> Vec<PortfolioPoint> {
        let k = self.num_assets();
        let mut points = Vec::with_capacity(n);

        while points.len() < n {
            let draws: Array1<f64> = (0..k).map(|_| rng.sample::<f64, _>(Exp1)).collect();
            let total = draws.sum();
            if total <= 0.0 {
                continue;
            }
            let weights = draws / total;
            // Lengths always match
            if let Ok(point) = self.evaluate(weights) {
                points.push(point);
            }
        }

        points
    }
}
