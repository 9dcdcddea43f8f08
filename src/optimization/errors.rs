use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for sub-problem solves.
pub type SolveResult<T> = Result<T, SolveError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    // ---- Problem structure ----
    /// An expression references a variable that was never declared.
    UnknownVariable { index: usize, n_vars: usize },

    /// Coefficients, bounds and start hints must be finite (bounds may be ±∞).
    NonFiniteCoefficient { location: String, value: f64 },

    /// Variable bounds must satisfy `lower ≤ upper`.
    EmptyBounds { name: String, lower: f64, upper: f64 },

    /// A nonconvex constraint was submitted without allowing nonconvexity.
    NonconvexNotAllowed { constraint: String },

    // ---- Outcome ----
    /// No point satisfies the constraints (smallest violation attained).
    Infeasible { violation: f64 },

    /// The objective decreases without bound on the feasible set.
    Unbounded,

    /// A solution lacks a variable the caller asked for.
    MissingVariable { name: String },

    // ---- Numerics ----
    /// Newton system could not be solved or produced non-finite steps.
    NewtonBreakdown { text: String },

    /// An outer loop ran out of iterations.
    IterationLimit { stage: &'static str, iterations: usize },

    /// Cost function returned a non-finite value.
    NonFiniteCost { value: f64 },

    /// Estimated parameters must be finite.
    InvalidThetaHat { index: usize, value: f64, reason: &'static str },

    /// Theta hat is missing
    MissingThetaHat,

    // ---- Options ----
    /// Gradient tolerance needs to be positive and finite.
    InvalidTolGrad { tol: f64, reason: &'static str },
    /// Cost change tolerance needs to be positive and finite.
    InvalidTolCost { tol: f64, reason: &'static str },
    /// Maximum iterations needs to be positive.
    InvalidMaxIter { max_iter: usize, reason: &'static str },
    /// At least one tolerance must be provided.
    NoTolerancesProvided,
    /// Invalid line searcher name.
    InvalidLineSearch { name: String, reason: &'static str },
    /// lbfgs_mem needs to be at least 1.
    InvalidLBFGSMem { mem: usize, reason: &'static str },
    /// A solver setting is outside its admissible range.
    InvalidSetting { name: &'static str, value: f64, reason: &'static str },

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter { text: String },
    /// Wrapper for argmin::NotImplemented
    NotImplemented { text: String },
    /// Wrapper for argmin::NotInitialized
    NotInitialized { text: String },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated { text: String },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound { text: String },
    /// Wrapper for argmin::PotentialBug
    PotentialBug { text: String },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError { text: String },
    /// Wrapper for other argmin::Error types
    BackendError { text: String },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for SolveError {}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Problem structure ----
            SolveError::UnknownVariable { index, n_vars } => {
                write!(f, "Unknown variable index {index}: problem declares {n_vars} variables")
            }
            SolveError::NonFiniteCoefficient { location, value } => {
                write!(f, "Non-finite value {value} in {location}")
            }
            SolveError::EmptyBounds { name, lower, upper } => {
                write!(f, "Variable '{name}' has empty bounds [{lower}, {upper}]")
            }
            SolveError::NonconvexNotAllowed { constraint } => {
                write!(f, "Constraint '{constraint}' is nonconvex but nonconvexity is not allowed")
            }

            // ---- Outcome ----
            SolveError::Infeasible { violation } => {
                write!(f, "Problem is infeasible (smallest violation {violation})")
            }
            SolveError::Unbounded => write!(f, "Problem is unbounded"),
            SolveError::MissingVariable { name } => {
                write!(f, "Solution has no value for variable '{name}'")
            }

            // ---- Numerics ----
            SolveError::NewtonBreakdown { text } => write!(f, "Newton step failed: {text}"),
            SolveError::IterationLimit { stage, iterations } => {
                write!(f, "{stage} did not converge within {iterations} iterations")
            }
            SolveError::NonFiniteCost { value } => {
                write!(f, "Non-finite cost value: {value}")
            }
            SolveError::InvalidThetaHat { index, value, reason } => {
                write!(f, "Invalid estimated parameter at index {index}: {value}: {reason}")
            }
            SolveError::MissingThetaHat => {
                write!(f, "Missing estimated parameters (theta hat)")
            }

            // ---- Options ----
            SolveError::InvalidTolGrad { tol, reason } => {
                write!(f, "Invalid gradient tolerance {tol}: {reason}")
            }
            SolveError::InvalidTolCost { tol, reason } => {
                write!(f, "Invalid cost function change tolerance {tol}: {reason}")
            }
            SolveError::InvalidMaxIter { max_iter, reason } => {
                write!(f, "Invalid maximum iterations {max_iter}: {reason}")
            }
            SolveError::NoTolerancesProvided => {
                write!(f, "No tolerances provided")
            }
            SolveError::InvalidLineSearch { name, reason } => {
                write!(f, "Invalid line searcher '{name}': {reason}")
            }
            SolveError::InvalidLBFGSMem { mem, reason } => {
                write!(f, "Invalid L-BFGS memory {mem}: {reason}")
            }
            SolveError::InvalidSetting { name, value, reason } => {
                write!(f, "Invalid solver setting {name} = {value}: {reason}")
            }

            // ---- Argmin ----
            SolveError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            SolveError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            SolveError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            SolveError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            SolveError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            SolveError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            SolveError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            SolveError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            SolveError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for SolveError {
    fn from(original_err: Error) -> Self {
        let original_err = match original_err.downcast::<SolveError>() {
            Ok(solve_err) => return solve_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => SolveError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => SolveError::NotImplemented { text },
                ArgminError::NotInitialized { text } => SolveError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => SolveError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => SolveError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => SolveError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => SolveError::ImpossibleError { text },
                _ => SolveError::UnknownError,
            },
            Err(err) => SolveError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Argmin errors map onto the matching wrapper variant, and our own errors
    // travelling through argmin come back unchanged.
    fn argmin_errors_are_normalized() {
        let wrapped: Error = ArgminError::ConditionViolated { text: "descent".to_string() }.into();
        let ours: Error = SolveError::NonFiniteCost { value: f64::INFINITY }.into();

        assert_eq!(
            SolveError::from(wrapped),
            SolveError::ConditionViolated { text: "descent".to_string() }
        );
        assert_eq!(SolveError::from(ours), SolveError::NonFiniteCost { value: f64::INFINITY });
    }
}
