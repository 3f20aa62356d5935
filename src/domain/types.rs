//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they
//! can be:
//!
//! - used in-memory during fitting
//! - exported to JSON for downstream analysis notebooks
//! - compared across runs (determinism checks)

use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Concrete gradient model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelKind {
    /// Single decaying exponential over the whole field.
    Exponential,
    /// Piecewise solution with distinct proximal/distal decay lengths,
    /// split at the interface boundary.
    TwoDomain,
    /// Proximal exponential domain joined to a distal domain whose
    /// consumption rate grows linearly with distance (Airy solution).
    TwoDomainGradualSink,
}

impl ModelKind {
    /// Human-readable label for reports and error messages.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "exponential",
            ModelKind::TwoDomain => "two-domain",
            ModelKind::TwoDomainGradualSink => "two-domain gradual sink",
        }
    }

    /// Number of model parameters excluding a free offset.
    pub fn base_param_len(self) -> usize {
        match self {
            ModelKind::Exponential => 2,
            ModelKind::TwoDomain | ModelKind::TwoDomainGradualSink => 3,
        }
    }

    /// Number of fitted parameters under the given offset policy.
    pub fn param_len(self, policy: &OffsetPolicy) -> usize {
        self.base_param_len() + usize::from(policy.is_free())
    }

    /// Whether this model needs the interface boundary landmark.
    pub fn requires_boundary(self) -> bool {
        !matches!(self, ModelKind::Exponential)
    }
}

/// How the uniform background offset is handled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffsetPolicy {
    /// The offset is a fitted parameter, appended last to the parameter
    /// vector. An explicit seed overrides the `min(y)` default used to
    /// start the fit.
    Free { seed: Option<f64> },
    /// The offset is a known constant excluded from the fitted vector.
    Fixed(f64),
}

impl OffsetPolicy {
    pub fn is_free(&self) -> bool {
        matches!(self, OffsetPolicy::Free { .. })
    }

    /// Resolve the offset value for an evaluation: the last element of the
    /// fitted vector when free, the constant when fixed.
    ///
    /// # Panics
    /// Panics on an empty parameter vector under a free policy. Callers
    /// construct vectors via [`ModelParams::to_vec`] or the guess estimator,
    /// both of which are never empty.
    pub fn resolve(&self, params: &[f64]) -> f64 {
        match self {
            OffsetPolicy::Free { .. } => *params.last().expect("non-empty parameter vector"),
            OffsetPolicy::Fixed(v) => *v,
        }
    }

    /// The offset estimate used for background subtraction and as the free
    /// seed: explicit value if given, else `min(y)`.
    pub fn estimate(&self, y: &[f64]) -> f64 {
        match self {
            OffsetPolicy::Fixed(v) => *v,
            OffsetPolicy::Free { seed: Some(v) } => *v,
            OffsetPolicy::Free { seed: None } => {
                y.iter().copied().fold(f64::INFINITY, f64::min)
            }
        }
    }
}

/// Spatial landmarks of one measured profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmarks {
    /// Origin of the coordinate system; subtracted once from `x` and from
    /// the interface boundary before fitting. `None` means already zeroed.
    pub zero_location: Option<f64>,
    /// Coordinate separating the proximal and distal transport regimes.
    /// Required by the two-domain models, unused by the exponential one.
    pub interface_boundary: Option<f64>,
}

impl Landmarks {
    /// Apply the origin shift, returning the shift amount and the updated
    /// landmarks with `zero_location` reset. Idempotent on zeroed input.
    pub fn zeroed(&self) -> (f64, Landmarks) {
        let shift = self.zero_location.unwrap_or(0.0);
        (
            shift,
            Landmarks {
                zero_location: Some(0.0),
                interface_boundary: self.interface_boundary.map(|b| b - shift),
            },
        )
    }
}

/// Which models to fit in addition to the always-fit exponential.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitFlags {
    pub two_domain: bool,
    pub gradual_sink: bool,
}

impl FitFlags {
    /// Fit all three model families.
    pub fn all() -> Self {
        Self {
            two_domain: true,
            gradual_sink: true,
        }
    }
}

/// Best-fit parameters of the exponential model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialParams {
    pub amplitude: f64,
    pub decay_length: f64,
    /// Present iff the offset was a free parameter.
    pub offset: Option<f64>,
}

/// Best-fit parameters of the two-domain model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoDomainParams {
    pub amplitude: f64,
    pub proximal_decay_length: f64,
    pub distal_decay_length: f64,
    pub offset: Option<f64>,
}

/// Best-fit parameters of the gradual-sink model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradualSinkParams {
    pub amplitude: f64,
    pub proximal_decay_length: f64,
    pub distal_sink_slope: f64,
    pub offset: Option<f64>,
}

/// Named best-fit parameters, one variant per model kind.
///
/// The optimizer and the confidence-interval rows use the flat positional
/// form; this union is the API surface, with `to_vec`/`from_slice` holding
/// the ordering contract in one place:
///
/// ```text
/// exponential:          [amplitude, decay_length, (offset)]
/// two-domain:           [amplitude, proximal, distal, (offset)]
/// gradual sink:         [amplitude, proximal, sink_slope, (offset)]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ModelParams {
    Exponential(ExponentialParams),
    TwoDomain(TwoDomainParams),
    TwoDomainGradualSink(GradualSinkParams),
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::Exponential(_) => ModelKind::Exponential,
            ModelParams::TwoDomain(_) => ModelKind::TwoDomain,
            ModelParams::TwoDomainGradualSink(_) => ModelKind::TwoDomainGradualSink,
        }
    }

    /// Flatten into the positional vector consumed by the optimizer.
    pub fn to_vec(&self) -> Vec<f64> {
        let (mut v, offset) = match *self {
            ModelParams::Exponential(p) => (vec![p.amplitude, p.decay_length], p.offset),
            ModelParams::TwoDomain(p) => (
                vec![p.amplitude, p.proximal_decay_length, p.distal_decay_length],
                p.offset,
            ),
            ModelParams::TwoDomainGradualSink(p) => (
                vec![p.amplitude, p.proximal_decay_length, p.distal_sink_slope],
                p.offset,
            ),
        };
        if let Some(o) = offset {
            v.push(o);
        }
        v
    }

    /// Rebuild named parameters from a flat vector.
    ///
    /// Enforces the length invariant: base parameter count, plus one iff the
    /// offset policy is free.
    pub fn from_slice(kind: ModelKind, p: &[f64], policy: &OffsetPolicy) -> Result<Self, FitError> {
        let expected = kind.param_len(policy);
        if p.len() != expected {
            return Err(FitError::InvalidInput(format!(
                "{} expects {} parameters under this offset policy, got {}",
                kind.display_name(),
                expected,
                p.len()
            )));
        }
        let offset = policy.is_free().then(|| p[expected - 1]);
        Ok(match kind {
            ModelKind::Exponential => ModelParams::Exponential(ExponentialParams {
                amplitude: p[0],
                decay_length: p[1],
                offset,
            }),
            ModelKind::TwoDomain => ModelParams::TwoDomain(TwoDomainParams {
                amplitude: p[0],
                proximal_decay_length: p[1],
                distal_decay_length: p[2],
                offset,
            }),
            ModelKind::TwoDomainGradualSink => {
                ModelParams::TwoDomainGradualSink(GradualSinkParams {
                    amplitude: p[0],
                    proximal_decay_length: p[1],
                    distal_sink_slope: p[2],
                    offset,
                })
            }
        })
    }
}

/// Convergence diagnostics returned by the optimizer collaborator.
///
/// Replaces ambient "last warning" polling: every solve reports its own
/// first-class status, and anything other than `Converged` marks the model's
/// result as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolveStatus {
    Converged,
    /// The iteration cap was exhausted before convergence; the last
    /// parameter estimate is still reported.
    MaxIterationsReached,
    /// Numerical trouble (non-finite residual steps, singular normal
    /// equations, degenerate problem shape).
    IllConditioned(String),
}

impl SolveStatus {
    pub fn is_warning(&self) -> bool {
        !matches!(self, SolveStatus::Converged)
    }
}

/// Symmetric 95% confidence interval for one parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn half_width(&self) -> f64 {
        0.5 * (self.upper - self.lower)
    }

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }
}

/// Fit output for a single model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub model: ModelKind,
    pub params: ModelParams,
    /// One `[low, high]` pair per flat parameter, same order as
    /// [`ModelParams::to_vec`].
    pub ci: Vec<ConfidenceInterval>,
    pub mse: f64,
    pub r2: f64,
    /// True when the optimizer reported non-convergence or a numerical
    /// caveat for this model; the parameter estimate is still the last one
    /// the optimizer held.
    pub warning_returned: bool,
    pub status: SolveStatus,
}

/// Aggregate of all fitted models from one orchestration call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradientFit {
    pub exponential: FitResult,
    pub two_domain: Option<FitResult>,
    #[serde(rename = "twoDomainGradualSink")]
    pub gradual_sink: Option<FitResult>,
}

impl GradientFit {
    /// Look up a model's result by kind.
    pub fn get(&self, kind: ModelKind) -> Option<&FitResult> {
        match kind {
            ModelKind::Exponential => Some(&self.exponential),
            ModelKind::TwoDomain => self.two_domain.as_ref(),
            ModelKind::TwoDomainGradualSink => self.gradual_sink.as_ref(),
        }
    }

    /// All fitted results, exponential first.
    pub fn results(&self) -> Vec<&FitResult> {
        let mut out = vec![&self.exponential];
        out.extend(self.two_domain.iter());
        out.extend(self.gradual_sink.iter());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn param_vector_length_tracks_offset_policy() {
        let free = OffsetPolicy::Free { seed: None };
        let fixed = OffsetPolicy::Fixed(0.0);
        assert_eq!(ModelKind::Exponential.param_len(&free), 3);
        assert_eq!(ModelKind::Exponential.param_len(&fixed), 2);
        assert_eq!(ModelKind::TwoDomainGradualSink.param_len(&free), 4);
        assert_eq!(ModelKind::TwoDomain.param_len(&fixed), 3);
    }

    #[test]
    fn params_round_trip_through_flat_form() {
        let policy = OffsetPolicy::Free { seed: None };
        let p = ModelParams::TwoDomain(TwoDomainParams {
            amplitude: 1.5,
            proximal_decay_length: 0.4,
            distal_decay_length: 0.1,
            offset: Some(0.02),
        });
        let flat = p.to_vec();
        assert_eq!(flat, vec![1.5, 0.4, 0.1, 0.02]);
        let back = ModelParams::from_slice(ModelKind::TwoDomain, &flat, &policy).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn from_slice_rejects_wrong_length() {
        let policy = OffsetPolicy::Fixed(0.0);
        let err = ModelParams::from_slice(ModelKind::Exponential, &[1.0, 2.0, 3.0], &policy);
        assert!(err.is_err());
    }

    #[test]
    fn zeroing_is_idempotent() {
        let lm = Landmarks {
            zero_location: Some(2.0),
            interface_boundary: Some(5.0),
        };
        let (shift, zeroed) = lm.zeroed();
        assert_eq!(shift, 2.0);
        assert_eq!(zeroed.interface_boundary, Some(3.0));

        let (shift2, again) = zeroed.zeroed();
        assert_eq!(shift2, 0.0);
        assert_eq!(again, zeroed);
    }

    #[test]
    fn offset_estimate_prefers_explicit_seed() {
        let y = [3.0, 1.0, 2.0];
        assert_eq!(OffsetPolicy::Free { seed: Some(0.5) }.estimate(&y), 0.5);
        assert_eq!(OffsetPolicy::Free { seed: None }.estimate(&y), 1.0);
        assert_eq!(OffsetPolicy::Fixed(0.25).estimate(&y), 0.25);
    }
}
