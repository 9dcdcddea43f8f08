//! Errors raised while evaluating the true probabilities of a candidate.
use std::time::Duration;

use crate::model::errors::ModelError;

/// Result alias for value-oracle operations.
pub type OracleResult<T> = Result<T, OracleError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OracleError {
    // ---- Closed form ----
    /// `(I − A)` could not be factorized at the given parameters.
    SingularSystem { x: f64, y: f64 },

    /// The linear solve produced a non-finite probability.
    NonFiniteProbability { name: String, value: f64 },

    // ---- External process ----
    /// Staging the model or property file failed.
    Staging { text: String },

    /// The verification executable could not be started.
    Spawn { program: String, text: String },

    /// The verification process did not finish within the timeout.
    Timeout { quantity: String, timeout: Duration },

    /// The verification process exited unsuccessfully.
    ProcessFailed { quantity: String, status: String, stderr: String },

    /// No result marker was found on standard output.
    MissingMarker { quantity: String, marker: String },

    /// The text after the marker is not a floating-point number.
    UnparsableValue { quantity: String, text: String },

    /// The configuration does not describe the quantity, or the marker
    /// cannot be turned into a pattern.
    InvalidConfig { text: String },

    // ---- Model ----
    /// Wrapper for model-layer failures (invalid point, unknown quantity).
    Model(ModelError),
}

impl std::error::Error for OracleError {}

impl std::fmt::Display for OracleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OracleError::SingularSystem { x, y } => {
                write!(f, "Linear system (I - A) is singular at x = {x}, y = {y}")
            }
            OracleError::NonFiniteProbability { name, value } => {
                write!(f, "Probability '{name}' is not finite: {value}")
            }
            OracleError::Staging { text } => write!(f, "Failed to stage model files: {text}"),
            OracleError::Spawn { program, text } => {
                write!(f, "Failed to start '{program}': {text}")
            }
            OracleError::Timeout { quantity, timeout } => {
                write!(f, "Model checking '{quantity}' timed out after {timeout:?}")
            }
            OracleError::ProcessFailed { quantity, status, stderr } => {
                write!(f, "Model checking '{quantity}' failed with {status}: {stderr}")
            }
            OracleError::MissingMarker { quantity, marker } => {
                write!(f, "Output for '{quantity}' does not contain marker '{marker}'")
            }
            OracleError::UnparsableValue { quantity, text } => {
                write!(f, "Could not parse value for '{quantity}' from '{text}'")
            }
            OracleError::InvalidConfig { text } => {
                write!(f, "Invalid external oracle configuration: {text}")
            }
            OracleError::Model(err) => write!(f, "{err}"),
        }
    }
}

impl From<ModelError> for OracleError {
    fn from(err: ModelError) -> Self {
        OracleError::Model(err)
    }
}
