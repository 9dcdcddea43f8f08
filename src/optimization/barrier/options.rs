//! barrier::options — settings for the log-barrier interior-point method.
use crate::optimization::{
    errors::{SolveError, SolveResult},
    validation::{verify_positive, verify_unit_interval},
};

/// Settings for [`InteriorPointSolver`](super::InteriorPointSolver).
///
/// Fields:
/// - `t0`: initial barrier weight on the objective.
/// - `mu`: factor by which `t` grows after each centering step (`> 1`).
/// - `gap_tol`: stop once the duality-gap bound `m / t` falls below this.
/// - `newton_tol`: centering stops once `λ² / 2` (Newton decrement) is below this.
/// - `max_newton_iter`: Newton steps per centering.
/// - `max_outer_iter`: centering steps before giving up.
/// - `armijo`: sufficient-decrease fraction for the backtracking search.
/// - `backtrack`: step shrink factor for the backtracking search.
/// - `phase_one_radius`: half-width of the auxiliary box used to keep phase I bounded.
/// - `divergence_limit`: iterates beyond this magnitude are reported as unbounded.
/// - `breakdown_gap_tol`: if a Newton system cannot be solved once `m / t`
///   is below this, the current iterate is returned as converged.
///
/// Default:
/// - `t0 = 1`, `mu = 10`, `gap_tol = 1e-8`, `newton_tol = 1e-10`,
///   `max_newton_iter = 100`, `max_outer_iter = 60`, `armijo = 0.25`,
///   `backtrack = 0.5`, `phase_one_radius = 1e4`, `divergence_limit = 1e10`,
///   `breakdown_gap_tol = 1e-6`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarrierOptions {
    pub t0: f64,
    pub mu: f64,
    pub gap_tol: f64,
    pub newton_tol: f64,
    pub max_newton_iter: usize,
    pub max_outer_iter: usize,
    pub armijo: f64,
    pub backtrack: f64,
    pub phase_one_radius: f64,
    pub divergence_limit: f64,
    pub breakdown_gap_tol: f64,
}

impl BarrierOptions {
    /// Construct options with custom accuracy, keeping the remaining defaults.
    ///
    /// # Errors
    /// - [`SolveError::InvalidSetting`] for non-positive or non-finite tolerances.
    /// - [`SolveError::InvalidMaxIter`] if `max_newton_iter == 0`.
    pub fn new(gap_tol: f64, newton_tol: f64, max_newton_iter: usize) -> SolveResult<Self> {
        let opts = Self { gap_tol, newton_tol, max_newton_iter, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    /// Check every field; used by [`BarrierOptions::new`] and by the solver
    /// for options built with struct-update syntax.
    pub fn validate(&self) -> SolveResult<()> {
        verify_positive("t0", self.t0)?;
        verify_positive("gap_tol", self.gap_tol)?;
        verify_positive("newton_tol", self.newton_tol)?;
        verify_positive("phase_one_radius", self.phase_one_radius)?;
        verify_positive("divergence_limit", self.divergence_limit)?;
        verify_positive("breakdown_gap_tol", self.breakdown_gap_tol)?;
        verify_unit_interval("armijo", self.armijo)?;
        verify_unit_interval("backtrack", self.backtrack)?;
        if !(self.mu.is_finite() && self.mu > 1.0) {
            return Err(SolveError::InvalidSetting {
                name: "mu",
                value: self.mu,
                reason: "Barrier growth factor must exceed 1.",
            });
        }
        if self.max_newton_iter == 0 || self.max_outer_iter == 0 {
            return Err(SolveError::InvalidMaxIter {
                max_iter: self.max_newton_iter.min(self.max_outer_iter),
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(())
    }
}

impl Default for BarrierOptions {
    fn default() -> Self {
        Self {
            t0: 1.0,
            mu: 10.0,
            gap_tol: 1e-8,
            newton_tol: 1e-10,
            max_newton_iter: 100,
            max_outer_iter: 60,
            armijo: 0.25,
            backtrack: 0.5,
            phase_one_radius: 1e4,
            divergence_limit: 1e10,
            breakdown_gap_tol: 1e-6,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(BarrierOptions::default().validate().is_ok());
    }

    #[test]
    // Purpose
    // -------
    // `new` validates its own arguments and struct-update edits are caught
    // by `validate`.
    fn invalid_settings_are_rejected() {
        assert!(matches!(
            BarrierOptions::new(0.0, 1e-10, 50),
            Err(SolveError::InvalidSetting { name: "gap_tol", .. })
        ));
        assert!(matches!(
            BarrierOptions::new(1e-8, 1e-10, 0),
            Err(SolveError::InvalidMaxIter { .. })
        ));
        let slow = BarrierOptions { mu: 1.0, ..BarrierOptions::default() };
        assert!(matches!(slow.validate(), Err(SolveError::InvalidSetting { name: "mu", .. })));
    }
}
