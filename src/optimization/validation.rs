//! Validation helpers shared by the sub-problem solvers.
//!
//! - **Tolerance checks**: [`verify_tol_grad`], [`verify_tol_cost`] ensure
//!   numeric tolerances are finite and strictly positive when provided.
//! - **Settings**: [`verify_positive`] and [`verify_unit_interval`] guard the
//!   scalar knobs of the barrier and penalty options.
//! - **Solver output**: [`validate_theta_hat`] and [`validate_value`] reject
//!   missing or non-finite results coming back from argmin.
use crate::optimization::{
    errors::{SolveError, SolveResult},
    types::Theta,
};

/// Validate the optional gradient-norm tolerance.
///
/// # Errors
/// Returns [`SolveError::InvalidTolGrad`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_grad(tol: Option<f64>) -> SolveResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(SolveError::InvalidTolGrad { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(SolveError::InvalidTolGrad { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Validate the optional cost-change tolerance.
///
/// # Errors
/// Returns [`SolveError::InvalidTolCost`] if the value is non-finite or ≤ 0.0.
pub fn verify_tol_cost(tol: Option<f64>) -> SolveResult<()> {
    if let Some(tol) = tol {
        if !tol.is_finite() {
            return Err(SolveError::InvalidTolCost { tol, reason: "Tolerance must be finite." });
        }
        if tol <= 0.0 {
            return Err(SolveError::InvalidTolCost { tol, reason: "Tolerance must be positive." });
        }
    }
    Ok(())
}

/// Require a finite, strictly positive setting.
///
/// # Errors
/// Returns [`SolveError::InvalidSetting`] naming the offending field.
pub fn verify_positive(name: &'static str, value: f64) -> SolveResult<()> {
    if !value.is_finite() {
        return Err(SolveError::InvalidSetting { name, value, reason: "Setting must be finite." });
    }
    if value <= 0.0 {
        return Err(SolveError::InvalidSetting {
            name,
            value,
            reason: "Setting must be positive.",
        });
    }
    Ok(())
}

/// Require a setting strictly inside `(0, 1)`.
///
/// # Errors
/// Returns [`SolveError::InvalidSetting`] naming the offending field.
pub fn verify_unit_interval(name: &'static str, value: f64) -> SolveResult<()> {
    if !(value > 0.0 && value < 1.0) {
        return Err(SolveError::InvalidSetting {
            name,
            value,
            reason: "Setting must lie strictly between 0 and 1.",
        });
    }
    Ok(())
}

/// Validate and unwrap an estimated parameter vector.
///
/// # Errors
/// - [`SolveError::MissingThetaHat`] if no vector was provided.
/// - [`SolveError::InvalidThetaHat`] if any element is non-finite.
pub fn validate_theta_hat(theta_hat: Option<Theta>) -> SolveResult<Theta> {
    match theta_hat {
        Some(t) => {
            for (index, &value) in t.iter().enumerate() {
                if !value.is_finite() {
                    return Err(SolveError::InvalidThetaHat {
                        index,
                        value,
                        reason: "Parameter estimates must be finite.",
                    });
                }
            }
            Ok(t)
        }
        None => Err(SolveError::MissingThetaHat),
    }
}

/// Validate that a scalar cost is finite.
///
/// # Errors
/// Returns [`SolveError::NonFiniteCost`] if the value is `NaN` or infinite.
pub fn validate_value(value: f64) -> SolveResult<()> {
    if !value.is_finite() {
        return Err(SolveError::NonFiniteCost { value });
    }
    Ok(())
}
