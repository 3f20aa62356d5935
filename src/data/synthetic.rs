//! Synthetic gradient profiles with seeded Gaussian noise.
//!
//! The fitting core never generates noise itself; this module is the seeded
//! adapter used by tests and downstream examples. The same seed always
//! produces the same profile, which keeps pipeline-determinism checks
//! meaningful.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::domain::ModelParams;
use crate::error::FitError;
use crate::models::evaluate;

/// A generated profile: coordinates, noisy observations, and the clean
/// baseline the noise was added to.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticProfile {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub y_clean: Vec<f64>,
}

/// Generate `n` evenly spaced samples of the given model on
/// `[x_start, x_end]`, with zero-mean Gaussian noise of the given standard
/// deviation added to each observation.
///
/// An offset stored in `params` is applied; absent, the baseline sits on
/// zero background.
pub fn generate_profile(
    params: &ModelParams,
    boundary: f64,
    x_start: f64,
    x_end: f64,
    n: usize,
    noise_std: f64,
    seed: u64,
) -> Result<SyntheticProfile, FitError> {
    if n < 2 {
        return Err(FitError::InvalidInput(format!(
            "need at least 2 samples, got {n}"
        )));
    }
    if !(x_start.is_finite() && x_end.is_finite() && x_end > x_start) {
        return Err(FitError::InvalidInput(
            "invalid coordinate range for profile generation".into(),
        ));
    }
    if !(noise_std.is_finite() && noise_std >= 0.0) {
        return Err(FitError::InvalidInput(format!(
            "invalid noise standard deviation {noise_std}"
        )));
    }

    let step = (x_end - x_start) / (n - 1) as f64;
    let x: Vec<f64> = (0..n).map(|i| x_start + i as f64 * step).collect();

    let kind = params.kind();
    let flat = params.to_vec();
    let base_len = kind.base_param_len();
    let (base, offset) = if flat.len() > base_len {
        (&flat[..base_len], flat[base_len])
    } else {
        (&flat[..], 0.0)
    };
    let y_clean = evaluate(kind, base, &x, boundary, offset);

    let normal = Normal::new(0.0, noise_std)
        .map_err(|e| FitError::InvalidInput(format!("noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);
    let y: Vec<f64> = y_clean.iter().map(|&v| v + normal.sample(&mut rng)).collect();

    Ok(SyntheticProfile { x, y, y_clean })
}
