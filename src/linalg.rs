//! Dense linear algebra for the small systems used here
//!
//! Hedge matrices, covariance matrices and QP KKT systems are held as ndarray
//! arrays everywhere else; they are copied into nalgebra matrices only for the
//! factorizations below.

use nalgebra::{linalg::LU, DMatrix, DVector, Dyn, SymmetricEigen};
use ndarray::{Array1, Array2};

use crate::core::{QuantError, QuantResult};

/// Relative pivot size below which a matrix is treated as singular
const PIVOT_EPS: f64 = 1e-13;

/// Sweep cap for the symmetric eigen decomposition
const MAX_EIGEN_ITERATIONS: usize = 1000;

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}

fn from_dmatrix(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

/// LU with partial pivoting; tiny pivots relative to the largest entry count as singular
fn factor(a: &Array2<f64>) -> QuantResult<LU<f64, Dyn, Dyn>> {
    let n = a.nrows();
    if a.ncols() != n {
        return Err(QuantError::invalid_argument(format!(
            "expected a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }

    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    if !scale.is_finite() {
        return Err(QuantError::invalid_argument("matrix has non-finite entries"));
    }
    if n > 0 && scale == 0.0 {
        return Err(QuantError::singular(f64::INFINITY, "zero matrix"));
    }

    let lu = to_dmatrix(a).lu();
    let threshold = PIVOT_EPS * scale * n as f64;
    if let Some((col, pivot)) = lu
        .u()
        .diagonal()
        .iter()
        .copied()
        .enumerate()
        .find(|(_, p)| p.abs() <= threshold)
    {
        return Err(QuantError::singular(
            f64::INFINITY,
            format!("pivot {:.3e} in column {} below threshold", pivot, col),
        ));
    }
    Ok(lu)
}

/// Solve `A x = b`
pub fn solve(a: &Array2<f64>, b: &Array1<f64>) -> QuantResult<Array1<f64>> {
    if b.len() != a.nrows() {
        return Err(QuantError::invalid_argument(format!(
            "system has {} rows but right-hand side has {}",
            a.nrows(),
            b.len()
        )));
    }
    let lu = factor(a)?;
    let rhs = DVector::from_iterator(b.len(), b.iter().copied());
    let x = lu
        .solve(&rhs)
        .ok_or_else(|| QuantError::singular(f64::INFINITY, "LU solve hit a zero pivot"))?;
    Ok(x.iter().copied().collect())
}

/// Matrix inverse
pub fn inverse(a: &Array2<f64>) -> QuantResult<Array2<f64>> {
    let inv = factor(a)?
        .try_inverse()
        .ok_or_else(|| QuantError::singular(f64::INFINITY, "matrix is not invertible"))?;
    Ok(from_dmatrix(&inv))
}

/// Induced 1-norm (max absolute column sum)
pub fn norm_1(a: &Array2<f64>) -> f64 {
    a.columns()
        .into_iter()
        .map(|c| c.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max)
}

/// 1-norm condition number, infinite for singular matrices
pub fn condition_number(a: &Array2<f64>) -> f64 {
    match inverse(a) {
        Ok(inv) => norm_1(a) * norm_1(&inv),
        Err(_) => f64::INFINITY,
    }
}

/// Euclidean norm
pub fn norm_2(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

/// Largest absolute asymmetry |a_ij - a_ji|
pub fn max_asymmetry(a: &Array2<f64>) -> f64 {
    let n = a.nrows();
    let mut worst = 0.0_f64;
    for i in 0..n {
        for j in (i + 1)..n {
            worst = worst.max((a[[i, j]] - a[[j, i]]).abs());
        }
    }
    worst
}

/// wᵀ A w
pub fn quadratic_form(w: &Array1<f64>, a: &Array2<f64>) -> f64 {
    w.dot(&a.dot(w))
}

/// Eigenvalues of the symmetric part of `a`, ascending
pub fn symmetric_eigenvalues(a: &Array2<f64>) -> QuantResult<Array1<f64>> {
    if a.ncols() != a.nrows() {
        return Err(QuantError::invalid_argument("eigenvalues need a square matrix"));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(QuantError::invalid_argument("matrix has non-finite entries"));
    }

    let m = to_dmatrix(a);
    let sym = (&m + m.transpose()) * 0.5;
    let eigen = SymmetricEigen::try_new(sym, f64::EPSILON, MAX_EIGEN_ITERATIONS)
        .ok_or_else(|| QuantError::numerical("symmetric eigen decomposition did not converge"))?;

    let mut values: Vec<f64> = eigen.eigenvalues.iter().copied().collect();
    values.sort_by(|x, y| x.total_cmp(y));
    Ok(Array1::from(values))
}
