//! Initial parameter guess for the exponential fit.
//!
//! The seed comes from a log-linearization: subtract the background estimate,
//! clamp anything non-positive so the logarithm is defined, then fit a line
//! to `(x, ln y)`. The slope and intercept back-map to the decay length and
//! amplitude. The result only seeds the exponential stage; the richer models
//! are seeded from the exponential best fit instead.

use crate::domain::OffsetPolicy;
use crate::error::FitError;
use crate::math::fit_line;

/// Build the exponential seed vector `[amplitude, decay_length, (offset)]`.
///
/// The offset component is appended only under a free policy, seeded with
/// the explicit value if given, else `min(y)`.
pub fn exponential_guess(
    x: &[f64],
    y: &[f64],
    policy: &OffsetPolicy,
) -> Result<Vec<f64>, FitError> {
    let background = policy.estimate(y);

    let mut shifted: Vec<f64> = y.iter().map(|&v| v - background).collect();

    // Smallest strictly positive entry; used as the clamp floor so the log
    // transform stays defined for flat or noisy tails.
    let floor = shifted
        .iter()
        .copied()
        .filter(|v| *v > 0.0)
        .fold(f64::INFINITY, f64::min);
    if !floor.is_finite() {
        return Err(FitError::DegenerateLogTransform);
    }
    for v in &mut shifted {
        if *v <= 0.0 {
            *v = floor;
        }
    }

    let logs: Vec<f64> = shifted.iter().map(|v| v.ln()).collect();
    let (intercept, slope) = fit_line(x, &logs).ok_or_else(|| {
        FitError::Numerical("log-linear seed regression could not be solved".into())
    })?;

    let mut seed = vec![intercept.exp(), -1.0 / slope];
    if policy.is_free() {
        seed.push(background);
    }
    Ok(seed)
}
