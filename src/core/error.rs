//! Error types for the pricing, hedging and optimization core

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Terminal state reported by the quadratic program solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    Solved,
    Infeasible,
    Unbounded,
    MaxIterations,
    NumericalFailure,
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Solved => "solved",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::MaxIterations => "iteration limit reached",
            SolverStatus::NumericalFailure => "numerical failure",
        };
        f.write_str(label)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum QuantError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Singular matrix (condition {condition:.3e}): {reason}")]
    SingularMatrix { condition: f64, reason: String },

    #[error("Optimization failed ({status}): {message}")]
    Optimization { status: SolverStatus, message: String },

    #[error("Numerical error: {0}")]
    Numerical(String),
}

pub type QuantResult<T> = Result<T, QuantError>;

impl QuantError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn domain(msg: impl Into<String>) -> Self {
        Self::Domain(msg.into())
    }

    pub fn singular(condition: f64, reason: impl Into<String>) -> Self {
        Self::SingularMatrix {
            condition,
            reason: reason.into(),
        }
    }

    pub fn optimization(status: SolverStatus, msg: impl Into<String>) -> Self {
        Self::Optimization {
            status,
            message: msg.into(),
        }
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Self::Numerical(msg.into())
    }

    /// Solver status carried by an optimization failure
    pub fn solver_status(&self) -> Option<SolverStatus> {
        match self {
            QuantError::Optimization { status, .. } => Some(*status),
            _ => None,
        }
    }
}
