//! Reporting utilities: residuals, fitted grids, and formatted summaries.

pub mod format;

pub use format::*;

use crate::domain::{FitResult, OffsetPolicy};
use crate::error::FitError;
use crate::models::evaluate_with_policy;

/// A per-point fitted value and residual.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualPoint {
    pub x: f64,
    pub y_obs: f64,
    pub y_fit: f64,
    pub residual: f64,
}

/// Compute fitted values and residuals for each observation.
///
/// `x` must already be zero-shifted the same way the fit saw it, and the
/// policy must be the one the fit was run with (a fixed offset value is not
/// part of the stored parameters).
pub fn compute_residuals(
    result: &FitResult,
    x: &[f64],
    y: &[f64],
    boundary: f64,
    policy: &OffsetPolicy,
) -> Result<Vec<ResidualPoint>, FitError> {
    if x.len() != y.len() {
        return Err(FitError::InvalidInput(format!(
            "coordinate/measurement length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }

    let flat = result.params.to_vec();
    let y_fit = evaluate_with_policy(result.model, &flat, x, boundary, policy);

    let mut out = Vec::with_capacity(x.len());
    for i in 0..x.len() {
        if !y_fit[i].is_finite() {
            return Err(FitError::Numerical(
                "non-finite model prediction during residual computation".into(),
            ));
        }
        out.push(ResidualPoint {
            x: x[i],
            y_obs: y[i],
            y_fit: y_fit[i],
            residual: y[i] - y_fit[i],
        });
    }
    Ok(out)
}

/// Evaluate a fitted model on an arbitrary coordinate grid.
pub fn fitted_grid(result: &FitResult, grid: &[f64], boundary: f64, policy: &OffsetPolicy) -> Vec<f64> {
    evaluate_with_policy(result.model, &result.params.to_vec(), grid, boundary, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ConfidenceInterval, ExponentialParams, ModelKind, ModelParams, SolveStatus,
    };

    fn exponential_result() -> FitResult {
        FitResult {
            model: ModelKind::Exponential,
            params: ModelParams::Exponential(ExponentialParams {
                amplitude: 2.0,
                decay_length: 0.5,
                offset: None,
            }),
            ci: vec![
                ConfidenceInterval { lower: 1.9, upper: 2.1 },
                ConfidenceInterval { lower: 0.45, upper: 0.55 },
            ],
            mse: 0.0,
            r2: 1.0,
            warning_returned: false,
            status: SolveStatus::Converged,
        }
    }

    #[test]
    fn residuals_vanish_on_data_from_the_same_model() {
        let result = exponential_result();
        let x: [f64; 3] = [0.0, 0.5, 1.0];
        let y: Vec<f64> = x.iter().map(|&xi| 2.0 * (-xi / 0.5).exp()).collect();

        let points =
            compute_residuals(&result, &x, &y, 0.0, &OffsetPolicy::Fixed(0.0)).unwrap();
        for p in &points {
            assert!(p.residual.abs() < 1e-12);
            assert_eq!(p.y_obs, p.y_fit + p.residual);
        }
    }

    #[test]
    fn fitted_grid_follows_the_stored_parameters() {
        let result = exponential_result();
        let grid = [0.0, 1.0];
        let y = fitted_grid(&result, &grid, 0.0, &OffsetPolicy::Fixed(0.0));
        assert!((y[0] - 2.0).abs() < 1e-12);
        assert!((y[1] - 2.0 * (-2.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let result = exponential_result();
        let err = compute_residuals(&result, &[0.0, 1.0], &[1.0], 0.0, &OffsetPolicy::Fixed(0.0))
            .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));
    }
}
