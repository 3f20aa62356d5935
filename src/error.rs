use crate::domain::ModelKind;

/// Fatal errors raised by the fitting pipeline.
///
/// These abort the whole orchestration call: no partial fit aggregate is
/// returned. Optimizer non-convergence is deliberately *not* represented
/// here; it is a per-model warning carried on the fit result instead.
#[derive(Clone, PartialEq)]
pub enum FitError {
    /// Malformed inputs: length mismatch, too few points, non-finite data,
    /// or invalid generation settings.
    InvalidInput(String),
    /// A piecewise model was requested without an interface boundary landmark.
    MissingBoundary(ModelKind),
    /// No strictly positive value remained after offset subtraction, so the
    /// log-linear initial guess has nothing to take a logarithm of.
    DegenerateLogTransform,
    /// Internal linear-algebra failure (e.g. the initial-guess regression
    /// could not be solved).
    Numerical(String),
}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            FitError::MissingBoundary(kind) => write!(
                f,
                "model {} requires an interface boundary landmark",
                kind.display_name()
            ),
            FitError::DegenerateLogTransform => write!(
                f,
                "no positive values after offset subtraction; cannot log-linearize"
            ),
            FitError::Numerical(msg) => write!(f, "numerical failure: {msg}"),
        }
    }
}

impl std::fmt::Debug for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FitError({self})")
    }
}

impl std::error::Error for FitError {}
