//! The value-oracle seam used by the refinement loop.
use crate::{model::point::ParameterPoint, oracle::errors::OracleResult};

/// Ground-truth evaluator for candidate parameter points.
///
/// Implementations are pure functions of `(x, y)`: they return a copy of the
/// input with `ps0, ps1, ps3` overwritten by the probabilities the chain
/// actually assigns at those parameters, leaving `x, y` untouched. The
/// refinement loop never assumes which implementation it is talking to.
pub trait ValueOracle {
    fn evaluate(&self, point: &ParameterPoint) -> OracleResult<ParameterPoint>;
}

impl<T: ValueOracle + ?Sized> ValueOracle for &T {
    fn evaluate(&self, point: &ParameterPoint) -> OracleResult<ParameterPoint> {
        (**self).evaluate(point)
    }
}
