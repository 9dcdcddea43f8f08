//! Errors for parameter points and chain topologies.
//!
//! Purpose
//! -------
//! Represent structural failures of the model layer: parameter values that
//! leave the admissible box, non-finite probability entries, and topology
//! descriptions that reference states outside the chain.
//!
//! Conventions
//! -----------
//! - Variants carry the offending value (and index/name where helpful) so
//!   callers can report them without re-deriving context.
//! - Higher layers convert [`ModelError`] into their own error enums via
//!   `From` impls; this module does not depend on any of them.

/// Result alias for model-layer operations.
pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    // ---- ParameterPoint ----
    /// A point coordinate must be finite.
    NonFiniteCoordinate { name: &'static str, value: f64 },

    /// A design parameter left `[epsilon, 1 - epsilon]`.
    ParameterOutOfRange { name: &'static str, value: f64, epsilon: f64 },

    /// The graph-preserving reserve must lie in `(0, 0.5)`.
    InvalidEpsilon { value: f64 },

    // ---- Topology ----
    /// A coefficient references a state outside `0..n_states`.
    StateOutOfRange { state: usize, n_states: usize },

    /// The chain needs at least one transient state.
    EmptyTopology,

    /// A labelled quantity was not found among the chain states.
    UnknownQuantity { name: String },
}

impl std::error::Error for ModelError {}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelError::NonFiniteCoordinate { name, value } => {
                write!(f, "Coordinate '{name}' must be finite, got {value}")
            }
            ModelError::ParameterOutOfRange { name, value, epsilon } => {
                write!(
                    f,
                    "Parameter '{name}' = {value} lies outside [{epsilon}, {}]",
                    1.0 - epsilon
                )
            }
            ModelError::InvalidEpsilon { value } => {
                write!(f, "Invalid epsilon {value}: must be finite and in (0, 0.5)")
            }
            ModelError::StateOutOfRange { state, n_states } => {
                write!(f, "State index {state} out of range for a chain with {n_states} states")
            }
            ModelError::EmptyTopology => write!(f, "Topology has no transient states"),
            ModelError::UnknownQuantity { name } => {
                write!(f, "Unknown probability quantity '{name}'")
            }
        }
    }
}
