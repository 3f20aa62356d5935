//! Synthetic data generation for tests and examples.

pub mod synthetic;

pub use synthetic::*;
