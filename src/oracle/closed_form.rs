//! oracle::closed_form — exact probabilities via a small linear solve.
//!
//! Purpose
//! -------
//! Evaluate the reachability probabilities of a parametric chain at fixed
//! parameters by solving `(I − A) p = b`, where `A` and `b` are assembled
//! from a [`ChainTopology`]. For the Knuth–Yao fragment this is exact and has
//! no convergence risk.
//!
//! Invariants & assumptions
//! ------------------------
//! - The topology must label the states `ps0`, `ps1`, `ps3`; the labels are
//!   resolved once at construction.
//! - `(I − A)` is nonsingular for `x, y ∈ (0, 1)` on the Knuth–Yao topology
//!   (`det = 1 − x·y`); a singular or non-finite solve is reported as an
//!   [`OracleError`] rather than a panic.
use crate::{
    model::{errors::ModelError, point::ParameterPoint, topology::ChainTopology},
    oracle::{
        errors::{OracleError, OracleResult},
        traits::ValueOracle,
    },
};

/// Closed-form oracle over an explicit chain topology.
#[derive(Debug, Clone, PartialEq)]
pub struct ClosedFormOracle {
    topology: ChainTopology,
    slots: [usize; 3],
}

impl ClosedFormOracle {
    /// Build an oracle over `topology`.
    ///
    /// # Errors
    /// [`OracleError::Model`] wrapping `UnknownQuantity` if any of `ps0`,
    /// `ps1`, `ps3` is not a state label.
    pub fn new(topology: ChainTopology) -> OracleResult<Self> {
        let slots =
            [topology.index_of("ps0")?, topology.index_of("ps1")?, topology.index_of("ps3")?];
        Ok(Self { topology, slots })
    }

    pub fn topology(&self) -> &ChainTopology {
        &self.topology
    }

    /// Solve for all state probabilities at `(x, y)`, in topology order.
    pub fn solve(&self, x: f64, y: f64) -> OracleResult<Vec<f64>> {
        let (lhs, rhs) = self.topology.assemble(x, y);
        let solution = lhs.lu().solve(&rhs).ok_or(OracleError::SingularSystem { x, y })?;
        for (label, &value) in self.topology.labels().iter().zip(solution.iter()) {
            if !value.is_finite() {
                return Err(OracleError::NonFiniteProbability { name: label.clone(), value });
            }
        }
        Ok(solution.iter().copied().collect())
    }
}

impl Default for ClosedFormOracle {
    fn default() -> Self {
        Self { topology: ChainTopology::knuth_yao(), slots: [0, 1, 2] }
    }
}

impl ValueOracle for ClosedFormOracle {
    fn evaluate(&self, point: &ParameterPoint) -> OracleResult<ParameterPoint> {
        for (name, value) in [("x", point.x), ("y", point.y)] {
            if !value.is_finite() {
                return Err(ModelError::NonFiniteCoordinate { name, value }.into());
            }
        }
        let p = self.solve(point.x, point.y)?;
        let [i0, i1, i3] = self.slots;
        Ok(point.with_probabilities(p[i0], p[i1], p[i3]))
    }
}
