//! problem::assignment — named values returned by a successful solve.
use crate::optimization::{
    errors::{SolveError, SolveResult},
    problem::{expr::VarId, spec::SubproblemSpec},
    types::Theta,
};

/// Optimal (or best found) point of a sub-problem, addressable by name.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    names: Vec<String>,
    values: Theta,
    objective: f64,
}

impl Assignment {
    /// Pair `values` with the variable names of `spec` and record the
    /// objective value at that point.
    pub fn new(spec: &SubproblemSpec, values: Theta) -> Self {
        let names = spec.variables().iter().map(|v| v.name.clone()).collect();
        let objective = spec.objective().value(&values);
        Self { names, values, objective }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.names.iter().position(|n| n == name).map(|i| self.values[i])
    }

    /// Like [`Assignment::value`], but a missing name is an error.
    pub fn require(&self, name: &str) -> SolveResult<f64> {
        self.value(name).ok_or_else(|| SolveError::MissingVariable { name: name.to_string() })
    }

    pub fn get(&self, var: VarId) -> f64 {
        self.values[var.index()]
    }

    pub fn values(&self) -> &Theta {
        &self.values
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names.iter().map(String::as_str).zip(self.values.iter().copied())
    }
}
