//! Ordinary least squares used by the initial-guess estimator.
//!
//! The log-linearized seed fit is a plain degree-1 regression:
//!
//! ```text
//! minimize Σ (ln y_i - (b + m x_i))^2
//! ```
//!
//! Implementation choices:
//! - We solve via SVD so the solve stays robust for tall design matrices and
//!   nearly collinear columns (e.g. coordinate vectors with a tiny spread).
//! - Progressively looser singular-value tolerances are tried before giving
//!   up, which keeps acceptance high without masking truly rank-deficient
//!   systems.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ intercept + slope * x` and return `(intercept, slope)`.
///
/// Returns `None` when the regression cannot be solved (fewer than two
/// points, a length mismatch, or a non-finite solution).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let n = x.len();
    let mut design = DMatrix::<f64>::zeros(n, 2);
    for (i, &xi) in x.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = xi;
    }
    let rhs = DVector::from_column_slice(y);

    let beta = solve_least_squares(&design, &rhs)?;
    Some((beta[0], beta[1]))
}
