//! Adapter that exposes an augmented Lagrangian as an `argmin` problem.
//!
//! For constraints `gᵢ(z) ≤ 0` with multipliers `λᵢ ≥ 0` and penalty `ρ > 0`
//! the cost is the Powell–Hestenes–Rockafellar function
//!
//! ```text
//! L(z) = f(z) + 1/(2ρ) Σ [ max(0, λᵢ + ρ gᵢ(z))² − λᵢ² ]
//! ```
//!
//! which is continuously differentiable with gradient
//! `∇f(z) + Σ max(0, λᵢ + ρ gᵢ(z)) ∇gᵢ(z)`.
use crate::optimization::{
    errors::SolveError,
    problem::QuadExpr,
    types::{Cost, Grad, Theta},
};
use argmin::core::{CostFunction, Error, Gradient};

/// Bridges a sub-problem's augmented Lagrangian to `argmin`'s
/// `CostFunction` and `Gradient`.
#[derive(Debug, Clone)]
pub struct AugmentedLagrangian<'a> {
    pub objective: &'a QuadExpr,
    pub constraints: &'a [QuadExpr],
    pub multipliers: &'a [f64],
    pub rho: f64,
}

impl<'a> AugmentedLagrangian<'a> {
    pub fn new(
        objective: &'a QuadExpr, constraints: &'a [QuadExpr], multipliers: &'a [f64], rho: f64,
    ) -> Self {
        Self { objective, constraints, multipliers, rho }
    }

    /// `max(0, λᵢ + ρ gᵢ(z))` for one constraint.
    fn shifted(&self, lambda: f64, g: &QuadExpr, theta: &Theta) -> f64 {
        (lambda + self.rho * g.value(theta)).max(0.0)
    }
}

impl<'a> CostFunction for AugmentedLagrangian<'a> {
    type Param = Theta;
    type Output = Cost;

    /// # Errors
    /// Returns `NonFiniteCost` if the value is not finite.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let penalty = self
            .constraints
            .iter()
            .zip(self.multipliers)
            .map(|(g, &lambda)| {
                let s = self.shifted(lambda, g, theta);
                s * s - lambda * lambda
            })
            .sum::<f64>();
        let output = self.objective.value(theta) + penalty / (2.0 * self.rho);
        if !output.is_finite() {
            return Err((SolveError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a> Gradient for AugmentedLagrangian<'a> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let mut grad = self.objective.gradient(theta);
        for (g, &lambda) in self.constraints.iter().zip(self.multipliers) {
            let s = self.shifted(lambda, g, theta);
            if s > 0.0 {
                g.accumulate_gradient(theta, s, &mut grad);
            }
        }
        if let Some((index, &value)) = grad.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err((SolveError::InvalidThetaHat {
                index,
                value,
                reason: "Augmented Lagrangian gradient must be finite.",
            })
            .into());
        }
        Ok(grad)
    }
}
