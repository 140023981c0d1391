//! Option Greeks
//!
//! First and second order spot sensitivities.

use std::ops::{Add, Neg};

use serde::{Deserialize, Serialize};

/// Option Greeks (spot sensitivities)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Greeks {
    /// Delta: dV/dS (sensitivity to spot)
    pub delta: f64,
    /// Gamma: d²V/dS² (sensitivity of delta to spot)
    pub gamma: f64,
}

impl Greeks {
    pub fn new(delta: f64, gamma: f64) -> Self {
        Self { delta, gamma }
    }

    /// Scale Greeks by a factor (e.g., contracts times multiplier)
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            delta: self.delta * factor,
            gamma: self.gamma * factor,
        }
    }

    /// (gamma, delta) ordering used by the hedge system rows
    pub fn gamma_delta(&self) -> [f64; 2] {
        [self.gamma, self.delta]
    }

    /// Both sensitivities within `tolerance` of zero
    pub fn is_neutral(&self, tolerance: f64) -> bool {
        self.delta.abs() <= tolerance && self.gamma.abs() <= tolerance
    }
}

impl Add for Greeks {
    type Output = Greeks;

    fn add(self, other: Greeks) -> Greeks {
        Greeks {
            delta: self.delta + other.delta,
            gamma: self.gamma + other.gamma,
        }
    }
}

impl Neg for Greeks {
    type Output = Greeks;

    fn neg(self) -> Greeks {
        self.scale(-1.0)
    }
}

impl std::iter::Sum for Greeks {
    fn sum<I: Iterator<Item = Greeks>>(iter: I) -> Greeks {
        iter.fold(Greeks::default(), |acc, g| acc + g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_and_sum() {
        let g = Greeks::new(0.5, 0.01);
        let short = g.scale(-1000.0);
        assert_eq!(short.delta, -500.0);
        assert_eq!(short.gamma, -10.0);

        let total: Greeks = vec![g, g, -g].into_iter().sum();
        assert!((total.delta - 0.5).abs() < 1e-12);
        assert!((total.gamma - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_neutral() {
        assert!(Greeks::new(1e-9, -1e-9).is_neutral(1e-6));
        assert!(!Greeks::new(0.1, 0.0).is_neutral(1e-6));
    }
}
