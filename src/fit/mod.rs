//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - derive the log-linear initial guess for the exponential stage
//! - drive the nonlinear least-squares collaborator (bounded and unbounded)
//! - compute per-model statistics (confidence intervals, MSE, R²)
//! - sequence the three model fits and assemble the aggregate result

pub mod guess;
pub mod session;
pub mod solver;
pub mod stats;

pub use guess::*;
pub use session::*;
pub use solver::*;
pub use stats::*;
