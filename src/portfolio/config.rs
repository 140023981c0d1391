//! Configuration for mean-variance optimization

use serde::{Deserialize, Serialize};

/// Configuration for the optimizer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Active-set QP solver settings
    pub solver: SolverConfig,
    /// Covariance matrix validation
    pub checks: CovarianceChecks,
    /// Frontier sweeps with at least this many targets run on the rayon pool
    /// Default: 16
    pub min_parallel_points: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            solver: SolverConfig::default(),
            checks: CovarianceChecks::default(),
            min_parallel_points: 16,
        }
    }
}

impl OptimizerConfig {
    /// Strict settings: tighter validation and convergence
    pub fn strict() -> Self {
        Self {
            solver: SolverConfig {
                tolerance: 1e-12,
                ..Default::default()
            },
            checks: CovarianceChecks {
                symmetry_tolerance: 1e-14,
                psd_tolerance: 1e-12,
            },
            ..Default::default()
        }
    }

    /// Relaxed settings: accept noisy sample covariances
    pub fn relaxed() -> Self {
        Self {
            solver: SolverConfig {
                regularization: 1e-7,
                ..Default::default()
            },
            checks: CovarianceChecks {
                symmetry_tolerance: 1e-6,
                psd_tolerance: 1e-6,
            },
            ..Default::default()
        }
    }
}

/// Active-set solver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Iteration cap before reporting MaxIterations
    /// Default: 500
    pub max_iterations: usize,

    /// Step and multiplier tolerance
    /// Default: 1e-10
    pub tolerance: f64,

    /// Ridge added to Σ, relative to its mean diagonal, so singular
    /// covariances still give a solvable KKT system
    /// Default: 1e-9
    pub regularization: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
            regularization: 1e-9,
        }
    }
}

/// Covariance matrix validation tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CovarianceChecks {
    /// Max |Σ_ij - Σ_ji| relative to max |Σ_ij|
    /// Default: 1e-10
    pub symmetry_tolerance: f64,

    /// Smallest eigenvalue allowed, as a negative fraction of the largest
    /// Default: 1e-10
    pub psd_tolerance: f64,
}

impl Default for CovarianceChecks {
    fn default() -> Self {
        Self {
            symmetry_tolerance: 1e-10,
            psd_tolerance: 1e-10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let strict = OptimizerConfig::strict();
        let relaxed = OptimizerConfig::relaxed();
        assert!(strict.checks.psd_tolerance < relaxed.checks.psd_tolerance);
        assert_eq!(strict.solver.max_iterations, 500);
    }

    #[test]
    fn test_partial_json_is_rejected() {
        // All fields are required; defaults come from Default, not serde
        assert!(serde_json::from_str::<SolverConfig>(r#"{"max_iterations": 10}"#).is_err());

        let json = serde_json::to_string(&OptimizerConfig::relaxed()).unwrap();
        let back: OptimizerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.solver.regularization, 1e-7);
    }
}
