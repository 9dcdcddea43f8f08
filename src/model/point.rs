//! model::point — the fixed-shape state threaded through refinement rounds.
//!
//! Purpose
//! -------
//! Hold one candidate instantiation of the parametric chain: the two design
//! parameters `x, y` together with the probability-like quantities
//! `ps0, ps1, ps3` that either come out of a convex sub-problem or out of a
//! value oracle.
//!
//! Invariants & assumptions
//! ------------------------
//! - Accepted points satisfy `x, y ∈ [epsilon, 1 − epsilon]`; solver output
//!   may sit marginally outside that box by solver tolerance, which
//!   [`ParameterPoint::check_parameters`] absorbs with [`BOX_SLACK`].
//! - `ps0 ≤ c_lambda` is the success predicate of the refinement loop, not an
//!   invariant of intermediate points.
//!
//! Conventions
//! -----------
//! - Points are plain `Copy` values; rounds replace them with functional
//!   updates (`with_probabilities`, `with_parameters`) instead of mutating
//!   shared state.
use crate::model::errors::{ModelError, ModelResult};

/// Absolute slack allowed when checking solver-produced parameters against
/// the `[epsilon, 1 − epsilon]` box.
pub const BOX_SLACK: f64 = 1e-7;

/// One candidate instantiation `(x, y, ps0, ps1, ps3)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPoint {
    pub x: f64,
    pub y: f64,
    pub ps0: f64,
    pub ps1: f64,
    pub ps3: f64,
}

impl ParameterPoint {
    pub fn new(x: f64, y: f64, ps0: f64, ps1: f64, ps3: f64) -> Self {
        Self { x, y, ps0, ps1, ps3 }
    }

    /// Copy of `self` with the probability fields replaced; `x, y` pass
    /// through unchanged.
    pub fn with_probabilities(&self, ps0: f64, ps1: f64, ps3: f64) -> Self {
        Self { ps0, ps1, ps3, ..*self }
    }

    /// Copy of `self` with the design parameters replaced.
    pub fn with_parameters(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Named coordinates in the canonical `(ps0, ps1, ps3, x, y)` order used
    /// by the sub-problem builders.
    pub fn coordinates(&self) -> [(&'static str, f64); 5] {
        [("ps0", self.ps0), ("ps1", self.ps1), ("ps3", self.ps3), ("x", self.x), ("y", self.y)]
    }

    /// Verify that every coordinate is finite.
    ///
    /// # Errors
    /// [`ModelError::NonFiniteCoordinate`] naming the first offending field.
    pub fn check_finite(&self) -> ModelResult<()> {
        for (name, value) in self.coordinates() {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteCoordinate { name, value });
            }
        }
        Ok(())
    }

    /// Verify finiteness and that `x, y` lie in `[epsilon, 1 − epsilon]` up to
    /// [`BOX_SLACK`].
    ///
    /// # Errors
    /// - [`ModelError::InvalidEpsilon`] if `epsilon ∉ (0, 0.5)`.
    /// - [`ModelError::NonFiniteCoordinate`] for NaN/∞ coordinates.
    /// - [`ModelError::ParameterOutOfRange`] if a parameter leaves the box.
    pub fn check_parameters(&self, epsilon: f64) -> ModelResult<()> {
        validate_epsilon(epsilon)?;
        self.check_finite()?;
        for (name, value) in [("x", self.x), ("y", self.y)] {
            if value < epsilon - BOX_SLACK || value > 1.0 - epsilon + BOX_SLACK {
                return Err(ModelError::ParameterOutOfRange { name, value, epsilon });
            }
        }
        Ok(())
    }
}

/// Validate the graph-preserving reserve `epsilon ∈ (0, 0.5)`.
pub fn validate_epsilon(epsilon: f64) -> ModelResult<()> {
    if !epsilon.is_finite() || epsilon <= 0.0 || epsilon >= 0.5 {
        return Err(ModelError::InvalidEpsilon { value: epsilon });
    }
    Ok(())
}
