//! Goodness-of-fit statistics and confidence intervals.
//!
//! Two equivalent 95% interval derivations are provided, matching the two
//! shapes the optimizer collaborator can return:
//!
//! - an explicit covariance matrix (unconstrained path)
//! - the residual vector plus Jacobian (bounded path)
//!
//! Both reduce to `p_i ± t(0.975, n-p) * se_i` under the usual local
//! linearization; a test pins their agreement on identical inputs, since
//! the equivalence is an assumption worth checking rather than a theorem
//! about the implementation.

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::ConfidenceInterval;

/// Confidence level used throughout the pipeline.
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Coefficient of determination `1 - SSres/SStot`.
///
/// `y_fit` must be the model evaluated at the best-fit parameters over the
/// zero-shifted coordinates. A constant `y` makes `SStot = 0` and the ratio
/// undefined (NaN/±inf); guarding that degeneracy is the caller's job.
pub fn r_squared(y: &[f64], y_fit: &[f64]) -> f64 {
    let n = y.len() as f64;
    let mean = y.iter().sum::<f64>() / n;
    let ss_tot = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>();
    let ss_res = y
        .iter()
        .zip(y_fit.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>();
    1.0 - ss_res / ss_tot
}

/// Mean squared residual.
pub fn mean_squared_error(residuals: &DVector<f64>) -> f64 {
    residuals.norm_squared() / residuals.len() as f64
}

/// Two-sided Student-t quantile for the given coverage.
fn t_quantile(level: f64, dof: usize) -> Option<f64> {
    let t = StudentsT::new(0.0, 1.0, dof as f64).ok()?;
    Some(t.inverse_cdf(0.5 + level / 2.0))
}

/// Intervals from an explicit covariance matrix (unconstrained path).
///
/// Returns `None` when degrees of freedom are exhausted or the covariance
/// diagonal is unusable; the caller records that as a per-model warning.
pub fn intervals_from_covariance(
    params: &[f64],
    covariance: &DMatrix<f64>,
    n_obs: usize,
    level: f64,
) -> Option<Vec<ConfidenceInterval>> {
    let p = params.len();
    if n_obs <= p || covariance.nrows() != p || covariance.ncols() != p {
        return None;
    }
    let t = t_quantile(level, n_obs - p)?;

    let mut out = Vec::with_capacity(p);
    for (i, &value) in params.iter().enumerate() {
        let var = covariance[(i, i)];
        if !var.is_finite() || var < 0.0 {
            log::warn!("invalid covariance diagonal; omitting confidence intervals");
            return None;
        }
        let half = t * var.sqrt();
        out.push(ConfidenceInterval {
            lower: value - half,
            upper: value + half,
        });
    }
    Some(out)
}

/// Intervals from the residual vector and Jacobian (bounded path).
///
/// Builds `s² (JᵀJ)⁻¹` from the returned residuals and Jacobian, then takes
/// the same t-scaled diagonal as the covariance path.
pub fn intervals_from_jacobian(
    params: &[f64],
    residuals: &DVector<f64>,
    jacobian: &DMatrix<f64>,
    level: f64,
) -> Option<Vec<ConfidenceInterval>> {
    let n = residuals.len();
    let p = params.len();
    if n <= p || jacobian.nrows() != n || jacobian.ncols() != p {
        return None;
    }

    let jtj = jacobian.transpose() * jacobian;
    let inv = match jtj.clone().try_inverse() {
        Some(inv) => inv,
        None => match jtj.pseudo_inverse(1e-12) {
            Ok(inv) => inv,
            Err(_) => {
                log::warn!("singular normal equations; omitting confidence intervals");
                return None;
            }
        },
    };

    let s2 = residuals.norm_squared() / (n - p) as f64;
    intervals_from_covariance(params, &(inv * s2), n, level)
}
