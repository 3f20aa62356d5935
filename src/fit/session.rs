//! Fit orchestration: one call fits up to three gradient models.
//!
//! The stages are sequential in data flow but the two conditional fits run
//! concurrently, since both are seeded from the exponential result and
//! neither mutates shared state:
//!
//! 1. zero the landmarks (idempotent)
//! 2. fit the exponential model (always), seeded by the log-linear guess
//! 3. fit the two-domain model (flagged), seeded from stage 2
//! 4. fit the gradual-sink model (flagged, independent of 3), seeded from
//!    stage 2 and constrained to non-negative parameters
//!
//! Precondition violations abort the whole call before any optimizer work;
//! optimizer trouble inside a stage is recorded on that model's result only.

use crate::domain::{
    ConfidenceInterval, FitFlags, FitResult, GradientFit, Landmarks, ModelKind, ModelParams,
    OffsetPolicy,
};
use crate::error::FitError;
use crate::fit::guess::exponential_guess;
use crate::fit::solver::{SolveOutcome, SolverConfig, solve_curve_fit};
use crate::fit::stats::{CONFIDENCE_LEVEL, intervals_from_covariance, intervals_from_jacobian, r_squared};
use crate::models::evaluate_with_policy;

/// Slope seed for the gradual-sink fit; the exponential stage carries no
/// information about the sink, so the seed is a fixed constant.
const SINK_SLOPE_SEED: f64 = 100.0;

/// Fit the exponential model and any flagged piecewise models.
///
/// This is the primary entry point. `x` and `y` are parallel coordinate and
/// concentration series; the landmarks carry an optional origin shift and
/// the interface boundary required by the piecewise models.
pub fn fit_gradient_models(
    x: &[f64],
    y: &[f64],
    policy: &OffsetPolicy,
    landmarks: Option<&Landmarks>,
    flags: FitFlags,
) -> Result<GradientFit, FitError> {
    fit_gradient_models_with(x, y, policy, landmarks, flags, &SolverConfig::default())
}

/// [`fit_gradient_models`] with explicit solver configuration.
pub fn fit_gradient_models_with(
    x: &[f64],
    y: &[f64],
    policy: &OffsetPolicy,
    landmarks: Option<&Landmarks>,
    flags: FitFlags,
    config: &SolverConfig,
) -> Result<GradientFit, FitError> {
    validate_series(x, y, policy, flags)?;

    let landmarks = landmarks.copied().unwrap_or_default();
    if (flags.two_domain || flags.gradual_sink) && landmarks.interface_boundary.is_none() {
        let kind = if flags.two_domain {
            ModelKind::TwoDomain
        } else {
            ModelKind::TwoDomainGradualSink
        };
        return Err(FitError::MissingBoundary(kind));
    }

    // Stage 1: shift the origin once; all later stages see zeroed inputs.
    let (shift, landmarks) = landmarks.zeroed();
    let xs: Vec<f64> = x.iter().map(|v| v - shift).collect();
    let boundary = landmarks.interface_boundary.unwrap_or(0.0);

    // Stage 2: exponential, always.
    let seed = exponential_guess(&xs, y, policy)?;
    let exponential = fit_one(ModelKind::Exponential, &xs, y, boundary, policy, seed, None, config)?;

    let ModelParams::Exponential(exp_params) = exponential.params else {
        unreachable!("stage 2 always produces exponential parameters");
    };

    // Stages 3 and 4: both derive their seeds from the immutable exponential
    // result and nothing else, so they can run side by side.
    let (two_domain, gradual_sink) = rayon::join(
        || {
            flags
                .two_domain
                .then(|| {
                    let mut seed = vec![
                        exp_params.amplitude,
                        exp_params.decay_length,
                        exp_params.decay_length,
                    ];
                    if let Some(o) = exp_params.offset {
                        seed.push(o);
                    }
                    fit_one(ModelKind::TwoDomain, &xs, y, boundary, policy, seed, None, config)
                })
                .transpose()
        },
        || {
            flags
                .gradual_sink
                .then(|| {
                    let mut seed = vec![
                        exp_params.amplitude,
                        exp_params.decay_length,
                        SINK_SLOPE_SEED,
                    ];
                    if let Some(o) = exp_params.offset {
                        seed.push(o);
                    }
                    fit_one(
                        ModelKind::TwoDomainGradualSink,
                        &xs,
                        y,
                        boundary,
                        policy,
                        seed,
                        Some(0.0),
                        config,
                    )
                })
                .transpose()
        },
    );

    Ok(GradientFit {
        exponential,
        two_domain: two_domain?,
        gradual_sink: gradual_sink?,
    })
}

fn validate_series(
    x: &[f64],
    y: &[f64],
    policy: &OffsetPolicy,
    flags: FitFlags,
) -> Result<(), FitError> {
    if x.len() != y.len() {
        return Err(FitError::InvalidInput(format!(
            "coordinate/measurement length mismatch: {} vs {}",
            x.len(),
            y.len()
        )));
    }
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput("non-finite input value".into()));
    }

    let mut requested = vec![ModelKind::Exponential];
    if flags.two_domain {
        requested.push(ModelKind::TwoDomain);
    }
    if flags.gradual_sink {
        requested.push(ModelKind::TwoDomainGradualSink);
    }
    for kind in requested {
        let needed = kind.param_len(policy) + 1;
        if x.len() < needed {
            return Err(FitError::InvalidInput(format!(
                "{} needs at least {} points, got {}",
                kind.display_name(),
                needed,
                x.len()
            )));
        }
    }
    Ok(())
}

/// Run one model's solve and assemble its statistics.
fn fit_one(
    kind: ModelKind,
    xs: &[f64],
    y: &[f64],
    boundary: f64,
    policy: &OffsetPolicy,
    seed: Vec<f64>,
    lower: Option<f64>,
    config: &SolverConfig,
) -> Result<FitResult, FitError> {
    let outcome = solve_curve_fit(kind, xs, y, boundary, policy, &seed, lower, config)?;

    let ci = confidence_intervals(&outcome, y.len(), lower.is_some());
    let ci_degenerate = ci.is_none();
    let ci = ci.unwrap_or_else(|| {
        vec![
            ConfidenceInterval {
                lower: f64::NAN,
                upper: f64::NAN,
            };
            outcome.params.len()
        ]
    });

    let y_fit = evaluate_with_policy(kind, &outcome.params, xs, boundary, policy);
    let r2 = r_squared(y, &y_fit);

    let params = ModelParams::from_slice(kind, &outcome.params, policy)?;
    let warning_returned = outcome.status.is_warning() || ci_degenerate;

    Ok(FitResult {
        model: kind,
        params,
        ci,
        mse: outcome.mse,
        r2,
        warning_returned,
        status: outcome.status,
    })
}

/// Covariance-based intervals on the unconstrained path, residual+Jacobian
/// intervals on the bounded path.
fn confidence_intervals(
    outcome: &SolveOutcome,
    n_obs: usize,
    bounded: bool,
) -> Option<Vec<ConfidenceInterval>> {
    if bounded {
        intervals_from_jacobian(
            &outcome.params,
            &outcome.residuals,
            &outcome.jacobian,
            CONFIDENCE_LEVEL,
        )
    } else {
        outcome
            .covariance
            .as_ref()
            .and_then(|cov| intervals_from_covariance(&outcome.params, cov, n_obs, CONFIDENCE_LEVEL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GradualSinkParams, TwoDomainParams};
    use crate::models::{gradual_sink_profile, two_domain_profile};

    fn grid_to_three() -> Vec<f64> {
        (0..=150).map(|i| i as f64 * 0.02).collect()
    }

    #[test]
    fn recovers_the_reference_exponential_scenario() {
        // x = 0:0.02:3, y = exp(-x/0.5), fixed zero offset.
        let x = grid_to_three();
        let y: Vec<f64> = x.iter().map(|&xi| (-xi / 0.5).exp()).collect();

        let fit = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags::default(),
        )
        .unwrap();

        let ModelParams::Exponential(p) = fit.exponential.params else {
            panic!("wrong variant");
        };
        assert!((p.amplitude - 1.0).abs() < 0.01, "amplitude {}", p.amplitude);
        assert!((p.decay_length - 0.5).abs() < 0.005, "decay {}", p.decay_length);
        assert!(p.offset.is_none());
        assert!(fit.exponential.r2 > 0.999, "r2 {}", fit.exponential.r2);
        assert!(!fit.exponential.warning_returned);
        assert_eq!(fit.exponential.ci.len(), 2);
        assert!(fit.two_domain.is_none());
        assert!(fit.gradual_sink.is_none());
    }

    #[test]
    fn recovers_noise_free_two_domain_parameters() {
        let x = grid_to_three();
        let truth = [1.0, 0.5, 0.1];
        let y = two_domain_profile(&truth, &x, 1.0, 0.0);

        let landmarks = Landmarks {
            zero_location: None,
            interface_boundary: Some(1.0),
        };
        let flags = FitFlags {
            two_domain: true,
            gradual_sink: false,
        };
        let fit = fit_gradient_models(&x, &y, &OffsetPolicy::Fixed(0.0), Some(&landmarks), flags)
            .unwrap();

        let result = fit.two_domain.expect("two-domain fit requested");
        let ModelParams::TwoDomain(TwoDomainParams {
            amplitude,
            proximal_decay_length,
            distal_decay_length,
            offset,
        }) = result.params
        else {
            panic!("wrong variant");
        };
        assert!((amplitude - 1.0).abs() / 1.0 < 0.01, "amplitude {amplitude}");
        assert!(
            (proximal_decay_length - 0.5).abs() / 0.5 < 0.01,
            "proximal {proximal_decay_length}"
        );
        assert!(
            (distal_decay_length - 0.1).abs() / 0.1 < 0.01,
            "distal {distal_decay_length}"
        );
        assert!(offset.is_none());
        assert!(result.r2 > 0.999);
        assert_eq!(result.ci.len(), 3);
    }

    #[test]
    fn bounded_gradual_sink_never_returns_a_negative_slope() {
        let x = grid_to_three();
        let truth = [1.0, 0.5, 50.0];
        let y = gradual_sink_profile(&truth, &x, 1.0, 0.0);

        let landmarks = Landmarks {
            zero_location: None,
            interface_boundary: Some(1.0),
        };
        let flags = FitFlags {
            two_domain: false,
            gradual_sink: true,
        };
        let fit = fit_gradient_models(&x, &y, &OffsetPolicy::Fixed(0.0), Some(&landmarks), flags)
            .unwrap();

        let result = fit.gradual_sink.expect("gradual-sink fit requested");
        let ModelParams::TwoDomainGradualSink(GradualSinkParams {
            amplitude,
            proximal_decay_length,
            distal_sink_slope,
            ..
        }) = result.params
        else {
            panic!("wrong variant");
        };
        assert!(distal_sink_slope >= 0.0, "slope {distal_sink_slope}");
        assert!(amplitude >= 0.0 && proximal_decay_length >= 0.0);
        assert!(result.r2 > 0.9, "r2 {}", result.r2);
        assert_eq!(result.ci.len(), 3);
    }

    #[test]
    fn identical_inputs_produce_identical_results() {
        let x = grid_to_three();
        let truth = [1.0, 0.5, 0.1];
        let y = two_domain_profile(&truth, &x, 1.0, 0.0);
        let landmarks = Landmarks {
            zero_location: None,
            interface_boundary: Some(1.0),
        };
        let flags = FitFlags {
            two_domain: true,
            gradual_sink: false,
        };

        let a = fit_gradient_models(&x, &y, &OffsetPolicy::Fixed(0.0), Some(&landmarks), flags)
            .unwrap();
        let b = fit_gradient_models(&x, &y, &OffsetPolicy::Fixed(0.0), Some(&landmarks), flags)
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn offset_policy_controls_parameter_vector_length() {
        let x = grid_to_three();
        let y: Vec<f64> = x
            .iter()
            .map(|&xi| (-xi / 0.5).exp() + 0.2 + 0.005 * (13.0 * xi).sin())
            .collect();

        let free = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Free { seed: None },
            None,
            FitFlags::default(),
        )
        .unwrap();
        assert_eq!(free.exponential.params.to_vec().len(), 3);
        assert_eq!(free.exponential.ci.len(), 3);
        assert!(free.exponential.r2 >= 0.0);

        let fixed = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Fixed(0.2),
            None,
            FitFlags::default(),
        )
        .unwrap();
        assert_eq!(fixed.exponential.params.to_vec().len(), 2);
        assert!(fixed.exponential.r2 >= 0.0);
    }

    #[test]
    fn exactly_linear_data_is_fitted_not_crashed() {
        let x: Vec<f64> = (0..=60).map(|i| i as f64 * 0.05).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 1.0 - xi / 3.0).collect();

        let fit = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Free { seed: None },
            None,
            FitFlags::default(),
        )
        .unwrap();

        // The estimate may be poor and flagged, but it must exist.
        assert_eq!(fit.exponential.params.to_vec().len(), 3);
        assert!(fit.exponential.mse.is_finite() || fit.exponential.warning_returned);
    }

    #[test]
    fn missing_boundary_is_fatal_before_any_fitting() {
        let x = grid_to_three();
        let y: Vec<f64> = x.iter().map(|&xi| (-xi / 0.5).exp()).collect();

        let err = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags {
                two_domain: true,
                gradual_sink: false,
            },
        )
        .unwrap_err();
        assert_eq!(err, FitError::MissingBoundary(ModelKind::TwoDomain));
    }

    #[test]
    fn malformed_series_are_fatal() {
        let err = fit_gradient_models(
            &[0.0, 1.0],
            &[1.0],
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)));

        let err = fit_gradient_models(
            &[0.0, 1.0],
            &[1.0, 0.5],
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags::default(),
        )
        .unwrap_err();
        assert!(matches!(err, FitError::InvalidInput(_)), "too few points");
    }

    #[test]
    fn zero_location_shift_matches_prezeroed_fit() {
        let x: Vec<f64> = (0..=100).map(|i| i as f64 * 0.03).collect();
        let y: Vec<f64> = x.iter().map(|&xi| 1.2 * (-xi / 0.4).exp()).collect();

        let plain = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags::default(),
        )
        .unwrap();

        let shifted_x: Vec<f64> = x.iter().map(|v| v + 2.0).collect();
        let landmarks = Landmarks {
            zero_location: Some(2.0),
            interface_boundary: None,
        };
        let shifted = fit_gradient_models(
            &shifted_x,
            &y,
            &OffsetPolicy::Fixed(0.0),
            Some(&landmarks),
            FitFlags::default(),
        )
        .unwrap();

        let a = plain.exponential.params.to_vec();
        let b = shifted.exponential.params.to_vec();
        for (va, vb) in a.iter().zip(b.iter()) {
            assert!((va - vb).abs() < 1e-6, "{va} vs {vb}");
        }
    }

    #[test]
    fn aggregate_lookup_is_keyed_by_model_kind() {
        let x = grid_to_three();
        let y: Vec<f64> = x.iter().map(|&xi| (-xi / 0.5).exp()).collect();
        let fit = fit_gradient_models(
            &x,
            &y,
            &OffsetPolicy::Fixed(0.0),
            None,
            FitFlags::default(),
        )
        .unwrap();

        assert!(fit.get(ModelKind::Exponential).is_some());
        assert!(fit.get(ModelKind::TwoDomain).is_none());
        assert_eq!(fit.results().len(), 1);
    }
}
