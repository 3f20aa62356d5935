//! Formatted terminal output for fit aggregates.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::{FitResult, GradientFit, ModelParams, SolveStatus};

/// Parameter names paired with values, in the flat-vector order.
fn named_values(params: &ModelParams) -> Vec<(&'static str, f64)> {
    let mut out = match *params {
        ModelParams::Exponential(p) => vec![
            ("amplitude", p.amplitude),
            ("decay length", p.decay_length),
        ],
        ModelParams::TwoDomain(p) => vec![
            ("amplitude", p.amplitude),
            ("proximal decay length", p.proximal_decay_length),
            ("distal decay length", p.distal_decay_length),
        ],
        ModelParams::TwoDomainGradualSink(p) => vec![
            ("amplitude", p.amplitude),
            ("proximal decay length", p.proximal_decay_length),
            ("distal sink slope", p.distal_sink_slope),
        ],
    };
    let offset = match *params {
        ModelParams::Exponential(p) => p.offset,
        ModelParams::TwoDomain(p) => p.offset,
        ModelParams::TwoDomainGradualSink(p) => p.offset,
    };
    if let Some(o) = offset {
        out.push(("offset", o));
    }
    out
}

fn format_model_block(out: &mut String, result: &FitResult) {
    out.push_str(&format!("[{}]\n", result.model.display_name()));
    for (i, (name, value)) in named_values(&result.params).iter().enumerate() {
        let ci = &result.ci[i];
        out.push_str(&format!(
            "  {name:<22} {value:>12.6}   95% CI [{:.6}, {:.6}]\n",
            ci.lower, ci.upper
        ));
    }
    out.push_str(&format!("  {:<22} {:>12.6e}\n", "mse", result.mse));
    out.push_str(&format!("  {:<22} {:>12.6}\n", "R^2", result.r2));
    let status = match &result.status {
        SolveStatus::Converged => "converged".to_string(),
        SolveStatus::MaxIterationsReached => "iteration cap reached".to_string(),
        SolveStatus::IllConditioned(why) => format!("ill-conditioned ({why})"),
    };
    out.push_str(&format!("  {:<22} {status}\n", "status"));
    if result.warning_returned {
        out.push_str("  warning: estimate carries numerical caveats\n");
    }
}

/// Format the full multi-model summary.
pub fn format_fit_summary(fit: &GradientFit) -> String {
    let mut out = String::new();
    out.push_str("=== morphogen gradient fit ===\n");
    for result in fit.results() {
        format_model_block(&mut out, result);
    }
    out
}
