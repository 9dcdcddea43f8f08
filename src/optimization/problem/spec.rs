//! problem::spec — declarative description of one sub-problem.
//!
//! Purpose
//! -------
//! Collect variables (with bounds and start hints), constraints of the form
//! `expr ≤ 0`, a minimization objective and the nonconvexity permission into
//! a single value that a solver gateway can consume.
//!
//! Key behaviors
//! -------------
//! - [`SubproblemSpec::add_var`] declares a variable with lower bound 0 and
//!   no upper bound; [`SubproblemSpec::add_bounded_var`] sets both.
//! - [`SubproblemSpec::inequalities`] lowers finite variable bounds into
//!   linear constraints so solvers see a single list of `g(z) ≤ 0`.
//! - [`SubproblemSpec::validate`] rejects dangling variable handles,
//!   non-finite coefficients and empty bounds before any solve.
//!
//! Conventions
//! -----------
//! - Constraint names are kept for diagnostics only (nonconvexity errors,
//!   trace logging); they need not be unique.
use crate::optimization::{
    errors::{SolveError, SolveResult},
    problem::expr::{QuadExpr, VarId},
    types::Theta,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub start: f64,
}

/// Named constraint `expr ≤ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: QuadExpr,
}

/// A complete sub-problem: minimize `objective` subject to `constraints`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubproblemSpec {
    pub name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: QuadExpr,
    allow_nonconvex: bool,
}

impl SubproblemSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Declare a variable in `[0, ∞)` with start hint `start`.
    pub fn add_var(&mut self, name: impl Into<String>, start: f64) -> VarId {
        self.add_bounded_var(name, 0.0, f64::INFINITY, start)
    }

    pub fn add_bounded_var(
        &mut self, name: impl Into<String>, lower: f64, upper: f64, start: f64,
    ) -> VarId {
        self.variables.push(Variable { name: name.into(), lower, upper, start });
        VarId(self.variables.len() - 1)
    }

    /// Add the constraint `expr ≤ 0`.
    pub fn add_le(&mut self, name: impl Into<String>, expr: QuadExpr) {
        self.constraints.push(Constraint { name: name.into(), expr });
    }

    pub fn minimize(&mut self, objective: QuadExpr) {
        self.objective = objective;
    }

    pub fn set_allow_nonconvex(&mut self, allow: bool) {
        self.allow_nonconvex = allow;
    }

    pub fn allow_nonconvex(&self) -> bool {
        self.allow_nonconvex
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &QuadExpr {
        &self.objective
    }

    pub fn n_vars(&self) -> usize {
        self.variables.len()
    }

    /// First constraint (or the objective) that is not convex, if any.
    pub fn first_nonconvex(&self) -> Option<&str> {
        if !self.objective.is_convex() {
            return Some("objective");
        }
        self.constraints.iter().find(|c| !c.expr.is_convex()).map(|c| c.name.as_str())
    }

    pub fn is_convex(&self) -> bool {
        self.first_nonconvex().is_none()
    }

    /// Check structural consistency of the sub-problem.
    ///
    /// # Errors
    /// - [`SolveError::UnknownVariable`] for a handle not issued by `self`.
    /// - [`SolveError::NonFiniteCoefficient`] for NaN/∞ coefficients, start
    ///   hints, or NaN bounds.
    /// - [`SolveError::EmptyBounds`] when `lower > upper`.
    pub fn validate(&self) -> SolveResult<()> {
        let n_vars = self.n_vars();
        for var in &self.variables {
            if !var.start.is_finite() || var.lower.is_nan() || var.upper.is_nan() {
                let value = if var.start.is_finite() { f64::NAN } else { var.start };
                return Err(SolveError::NonFiniteCoefficient {
                    location: format!("variable '{}'", var.name),
                    value,
                });
            }
            if var.lower > var.upper {
                return Err(SolveError::EmptyBounds {
                    name: var.name.clone(),
                    lower: var.lower,
                    upper: var.upper,
                });
            }
        }
        let named = std::iter::once(("objective", &self.objective))
            .chain(self.constraints.iter().map(|c| (c.name.as_str(), &c.expr)));
        for (name, expr) in named {
            if let Some(bad) = expr.variables().find(|v| v.0 >= n_vars) {
                return Err(SolveError::UnknownVariable { index: bad.0, n_vars });
            }
            if let Some(value) = expr.coefficients().find(|c| !c.is_finite()) {
                return Err(SolveError::NonFiniteCoefficient {
                    location: format!("'{name}' of '{}'", self.name),
                    value,
                });
            }
        }
        Ok(())
    }

    /// All constraints plus finite variable bounds, each as `g(z) ≤ 0`.
    pub fn inequalities(&self) -> Vec<QuadExpr> {
        let mut out: Vec<QuadExpr> = self.constraints.iter().map(|c| c.expr.clone()).collect();
        for (i, var) in self.variables.iter().enumerate() {
            if var.lower.is_finite() {
                out.push(QuadExpr::new().constant(var.lower).term(VarId(i), -1.0));
            }
            if var.upper.is_finite() {
                out.push(QuadExpr::new().constant(-var.upper).term(VarId(i), 1.0));
            }
        }
        out
    }

    /// Start hints projected into the variable bounds.
    pub fn start_point(&self) -> Theta {
        self.variables.iter().map(|v| v.start.max(v.lower).min(v.upper)).collect()
    }

    /// Largest positive constraint or bound violation at `z` (0 if feasible).
    pub fn max_violation(&self, z: &Theta) -> f64 {
        self.inequalities().iter().fold(0.0, |acc, g| acc.max(g.value(z)))
    }
}
