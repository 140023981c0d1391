//! Monte Carlo cross-check for the closed form
//!
//! Samples terminal spots under risk-neutral geometric Brownian motion with
//! antithetic pairs. The generator is always supplied by the caller so runs are
//! reproducible from a seed.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::core::{OptionContract, QuantError, QuantResult};

/// Monte Carlo price estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloEstimate {
    /// Discounted mean payoff
    pub price: f64,
    /// Standard error of the mean
    pub std_error: f64,
    /// Number of antithetic pairs sampled
    pub paths: usize,
}

impl MonteCarloEstimate {
    /// Is `value` within `k` standard errors of the estimate?
    pub fn contains(&self, value: f64, k: f64) -> bool {
        (self.price - value).abs() <= k * self.std_error
    }
}

/// Price a contract by sampling `n_paths` antithetic terminal-spot pairs
pub fn monte_carlo_price(
    contract: &OptionContract,
    n_paths: usize,
    rng: &mut impl Rng,
) -> QuantResult<MonteCarloEstimate> {
    if n_paths < 2 {
        return Err(QuantError::invalid_argument("Monte Carlo needs at least 2 paths"));
    }

    let inputs = contract.inputs();
    let option_type = contract.option_type();
    let drift = (inputs.rate - 0.5 * inputs.volatility * inputs.volatility) * inputs.time;
    let diffusion = inputs.total_vol();
    let df = inputs.discount();

    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for _ in 0..n_paths {
        let z: f64 = Distribution::<f64>::sample(&StandardNormal, rng);
        let up = inputs.spot * (drift + diffusion * z).exp();
        let down = inputs.spot * (drift - diffusion * z).exp();

        let payoff = 0.5
            * (option_type.intrinsic(up, inputs.strike) + option_type.intrinsic(down, inputs.strike));
        sum += payoff;
        sum_sq += payoff * payoff;
    }

    let n = n_paths as f64;
    let mean = sum / n;
    let variance = ((sum_sq - n * mean * mean) / (n - 1.0)).max(0.0);

    Ok(MonteCarloEstimate {
        price: df * mean,
        std_error: df * (variance / n).sqrt(),
        paths: n_paths,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_mc_agrees_with_closed_form() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let call = OptionContract::call(100.0, 0.2, 105.0, 0.5, 0.03).unwrap();
        let est = monte_carlo_price(&call, 50_000, &mut rng).unwrap();
        assert!(est.contains(call.price(), 4.0), "{:?} vs {}", est, call.price());

        let put = OptionContract::put(543.0, 0.53, 545.0, 30.0 / 365.0, 0.015).unwrap();
        let est = monte_carlo_price(&put, 50_000, &mut rng).unwrap();
        assert!(est.contains(put.price(), 4.0), "{:?} vs {}", est, put.price());
    }

    #[test]
    fn test_same_seed_same_estimate() {
        let call = OptionContract::call(100.0, 0.2, 100.0, 1.0, 0.05).unwrap();
        let a = monte_carlo_price(&call, 1_000, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        let b = monte_carlo_price(&call, 1_000, &mut ChaCha8Rng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_too_few_paths() {
        let call = OptionContract::call(100.0, 0.2, 100.0, 1.0, 0.05).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(monte_carlo_price(&call, 1, &mut rng).is_err());
    }
}
