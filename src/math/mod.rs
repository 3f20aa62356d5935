//! Mathematical utilities: special functions and least squares.

pub mod airy;
pub mod ols;
pub mod special;

pub use airy::*;
pub use ols::*;
pub use special::*;
