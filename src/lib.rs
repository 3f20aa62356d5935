//! `morphogen-curves` library crate.
//!
//! Fits parametric steady-state models of morphogen concentration profiles
//! to noisy one-dimensional spatial measurements, recovering decay-length
//! and sink-strength parameters with 95% confidence intervals and
//! goodness-of-fit statistics.
//!
//! The crate is organized so that:
//!
//! - model evaluators stay pure and reusable (`models`)
//! - the optimizer collaborator is isolated behind one boundary (`fit::solver`)
//! - orchestration, statistics, and reporting are independently testable
//!
//! The primary entry point is [`fit::fit_gradient_models`].

pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod math;
pub mod models;
pub mod report;
