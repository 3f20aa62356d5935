//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input configuration (`OffsetPolicy`, `Landmarks`, `FitFlags`)
//! - the model taxonomy (`ModelKind`) and named parameter records
//!   (`ModelParams` and friends)
//! - fit outputs (`FitResult`, `GradientFit`, `ConfidenceInterval`,
//!   `SolveStatus`)

pub mod types;

pub use types::*;
