//! Closed-form steady-state gradient profiles.
//!
//! Each evaluator is a pure function from (parameters, coordinates,
//! interface boundary, resolved offset) to predicted concentrations, so the
//! fitting code can stay generic over model kinds. The piecewise models
//! combine their two branches with the `step(0) = 1` unit-step selector:
//! exactly one branch is active per sample except at the boundary itself,
//! where both steps evaluate to 1 and the branches *sum*. That tie
//! convention is part of the model contract and is reproduced exactly (not
//! split 50/50).

use crate::domain::{ModelKind, OffsetPolicy};
use crate::math::{airy, airy_ai, unit_step};

/// Evaluator signature shared by all model kinds.
///
/// Arguments: base parameters (offset excluded), coordinates, interface
/// boundary (ignored by the exponential model), resolved offset.
pub type ModelEvaluator = fn(&[f64], &[f64], f64, f64) -> Vec<f64>;

/// Registry mapping a model kind to its evaluator.
///
/// This is the interface boundary for callers iterating over several model
/// kinds (noise injection, reporting, fitting) without matching on the kind
/// themselves.
pub fn evaluator(kind: ModelKind) -> ModelEvaluator {
    match kind {
        ModelKind::Exponential => exponential_profile,
        ModelKind::TwoDomain => two_domain_profile,
        ModelKind::TwoDomainGradualSink => gradual_sink_profile,
    }
}

/// Evaluate a model over `x` with the offset already resolved.
pub fn evaluate(kind: ModelKind, p: &[f64], x: &[f64], boundary: f64, offset: f64) -> Vec<f64> {
    evaluator(kind)(p, x, boundary, offset)
}

/// Evaluate a model from the full fitted vector, resolving the offset once
/// per the policy (last element when free, the constant when fixed).
pub fn evaluate_with_policy(
    kind: ModelKind,
    p: &[f64],
    x: &[f64],
    boundary: f64,
    policy: &OffsetPolicy,
) -> Vec<f64> {
    let offset = policy.resolve(p);
    let base = &p[..kind.base_param_len().min(p.len())];
    evaluate(kind, base, x, boundary, offset)
}

/// `y = p0 * exp(-x / p1) + offset`.
///
/// Requires `p1 != 0`; no landmark dependency.
pub fn exponential_profile(p: &[f64], x: &[f64], _boundary: f64, offset: f64) -> Vec<f64> {
    x.iter().map(|&xi| p[0] * (-xi / p[1]).exp() + offset).collect()
}

/// Two-domain steady state with decay lengths `p1` (proximal) and `p2`
/// (distal), split at the interface boundary `xb`:
///
/// ```text
/// left  (x <= xb): p0 (p2 cosh((x-xb)/p1) - p1 sinh((x-xb)/p1)) / D
/// right (x >= xb): p0 p2 exp(-(x-xb)/p2) / D
/// D = p2 cosh(xb/p1) + p1 sinh(xb/p1)
/// ```
///
/// The shared denominator `D` makes the profile continuous at `xb` with
/// matched flux, and anchors the amplitude at the origin: `y(0) = p0 +
/// offset`.
pub fn two_domain_profile(p: &[f64], x: &[f64], xb: f64, offset: f64) -> Vec<f64> {
    let (amp, l1, l2) = (p[0], p[1], p[2]);
    let denom = l2 * (xb / l1).cosh() + l1 * (xb / l1).sinh();

    x.iter()
        .map(|&xi| {
            let d = xi - xb;
            let mut v = 0.0;
            if unit_step(xb - xi) == 1.0 {
                v += amp * (l2 * (d / l1).cosh() - l1 * (d / l1).sinh()) / denom;
            }
            if unit_step(xi - xb) == 1.0 {
                v += amp * l2 * (-d / l2).exp() / denom;
            }
            v + offset
        })
        .collect()
}

/// Gradual-sink steady state: proximal exponential domain (`p1` decay
/// length) joined at `xb` to a distal domain whose consumption rate grows
/// linearly with distance at slope `p2`, which turns the governing equation
/// into the Airy equation. With
///
/// ```text
/// k = p1^-2 p2^-2/3          (Airy argument at the interface)
/// r = p2^(1/3) p1 Ai'(k)/Ai(k)
/// D = cosh(xb/p1) - r sinh(xb/p1)
/// ```
///
/// the profile is
///
/// ```text
/// left  (x <= xb): p0 (cosh(x/p1) - (sinh(xb/p1) - r cosh(xb/p1))/D * sinh(x/p1))
/// right (x >= xb): p0 Ai(p2^(1/3) (x-xb) + k) / (Ai(k) D)
/// ```
///
/// Requires `p1 != 0` and `p2 > 0` (the slope bound is enforced by the
/// orchestrator's constrained fit, not here). Denominators vanish as
/// `p1 -> 0` or `p2 -> 0` and `Ai(k)` underflows for large `k`; those
/// regions produce non-finite values that the optimizer rejects as steps.
pub fn gradual_sink_profile(p: &[f64], x: &[f64], xb: f64, offset: f64) -> Vec<f64> {
    let (amp, l, s) = (p[0], p[1], p[2]);

    let k = l.powi(-2) * s.powf(-2.0 / 3.0);
    let interface = airy(k);
    let s_cbrt = s.cbrt();
    let h = xb / l;
    let ratio = s_cbrt * l * interface.ai_prime / interface.ai;
    let denom = h.cosh() - ratio * h.sinh();
    let left_coef = (h.sinh() - ratio * h.cosh()) / denom;

    x.iter()
        .map(|&xi| {
            let mut v = 0.0;
            if unit_step(xb - xi) == 1.0 {
                v += amp * ((xi / l).cosh() - left_coef * (xi / l).sinh());
            }
            if unit_step(xi - xb) == 1.0 {
                v += amp * airy_ai(s_cbrt * (xi - xb) + k) / (interface.ai * denom);
            }
            v + offset
        })
        .collect()
}
