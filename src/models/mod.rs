//! Steady-state gradient model implementations.
//!
//! Models are implemented as small, pure functions so that fitting and
//! reporting code can stay generic over model kinds.

pub mod model;

pub use model::*;
