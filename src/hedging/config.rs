//! Configuration for delta-gamma neutralization

use serde::{Deserialize, Serialize};

/// Configuration for the hedge ratio solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HedgeConfig {
    /// Round Greeks to this many decimals before solving
    /// Removes floating-point noise that can fake ill-conditioning
    /// Default: None (solve on raw Greeks)
    pub round_decimals: Option<u32>,

    /// 1-norm condition number above which the system is rejected as singular
    /// Default: 1e12
    pub max_condition: f64,

    /// Condition number above which a warning is logged but the solve proceeds
    /// Default: 1e6
    pub warn_condition: f64,

    /// Maximum backward error ‖M·w - target‖ / (‖M‖·‖w‖ + ‖target‖)
    /// Default: 1e-9
    pub residual_tolerance: f64,
}

impl Default for HedgeConfig {
    fn default() -> Self {
        Self {
            round_decimals: None,
            max_condition: 1e12,
            warn_condition: 1e6,
            residual_tolerance: 1e-9,
        }
    }
}

impl HedgeConfig {
    /// Strict settings: reject anything moderately ill-conditioned
    pub fn strict() -> Self {
        Self {
            max_condition: 1e8,
            warn_condition: 1e4,
            ..Default::default()
        }
    }

    /// Pre-round Greeks to `decimals` places before solving
    pub fn rounded(decimals: u32) -> Self {
        Self {
            round_decimals: Some(decimals),
            ..Default::default()
        }
    }

    /// Apply the configured rounding to a value
    pub fn round(&self, value: f64) -> f64 {
        match self.round_decimals {
            Some(decimals) => {
                let factor = 10f64.powi(decimals as i32);
                (value * factor).round() / factor
            }
            None => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        let config = HedgeConfig::rounded(4);
        assert_eq!(config.round(0.523_878_8), 0.5239);
        assert_eq!(HedgeConfig::default().round(0.523_878_8), 0.523_878_8);
    }

    #[test]
    fn test_json_round_trip() {
        let config = HedgeConfig::strict();
        let json = serde_json::to_string(&config).unwrap();
        let back: HedgeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_condition, 1e8);
        assert_eq!(back.round_decimals, None);
    }
}
