//! Errors that abort a synthesis run.
//!
//! Exhausting the trust region is not an error; it is reported through
//! [`SynthesisStatus`](crate::synthesis::outcome::SynthesisStatus).
use crate::{
    model::errors::ModelError, optimization::errors::SolveError, oracle::errors::OracleError,
};

/// Result alias for the synthesis layer.
pub type SynthesisResult<T> = Result<T, SynthesisError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisError {
    // ---- Sub-problem ----
    /// The convex sub-problem of a round has no feasible point.
    SubproblemInfeasible { subproblem: String, violation: f64 },

    /// The convex sub-problem of a round is unbounded below.
    SubproblemUnbounded { subproblem: String },

    /// Any other solver failure (numerical breakdown, invalid spec, ...).
    Solver(SolveError),

    // ---- Oracle ----
    Oracle(OracleError),

    // ---- Model ----
    /// Invalid point or epsilon.
    Model(ModelError),

    // ---- Options ----
    InvalidOption { name: &'static str, value: f64, reason: &'static str },

    /// Unknown strategy name.
    InvalidStrategy { name: String },
}

impl std::error::Error for SynthesisError {}

impl std::fmt::Display for SynthesisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisError::SubproblemInfeasible { subproblem, violation } => {
                write!(f, "Sub-problem '{subproblem}' is infeasible (violation {violation})")
            }
            SynthesisError::SubproblemUnbounded { subproblem } => {
                write!(f, "Sub-problem '{subproblem}' is unbounded")
            }
            SynthesisError::Solver(err) => write!(f, "Sub-problem solve failed: {err}"),
            SynthesisError::Oracle(err) => write!(f, "Value oracle failed: {err}"),
            SynthesisError::Model(err) => write!(f, "{err}"),
            SynthesisError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid option {name} = {value}: {reason}")
            }
            SynthesisError::InvalidStrategy { name } => write!(
                f,
                "Unknown strategy '{name}': expected 'ccp', 'scp' or 'linearization' \
                 (case insensitive)"
            ),
        }
    }
}

impl From<SolveError> for SynthesisError {
    fn from(err: SolveError) -> Self {
        SynthesisError::Solver(err)
    }
}

impl From<OracleError> for SynthesisError {
    fn from(err: OracleError) -> Self {
        SynthesisError::Oracle(err)
    }
}

impl From<ModelError> for SynthesisError {
    fn from(err: ModelError) -> Self {
        SynthesisError::Model(err)
    }
}
