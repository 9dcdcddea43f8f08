//! gateway — the seam between sub-problem builders and solver back ends.
//!
//! [`ConvexSolverGateway`] takes a declarative [`SubproblemSpec`] and returns
//! an [`Assignment`] or a [`SolveError`]. [`DefaultGateway`] dispatches on
//! convexity:
//!
//! - every constraint convex → [`InteriorPointSolver`] (global optimum);
//! - some constraint nonconvex and `allow_nonconvex` set → [`PenaltySolver`]
//!   (local optimum);
//! - otherwise → [`SolveError::NonconvexNotAllowed`].
use crate::optimization::{
    barrier::InteriorPointSolver,
    errors::{SolveError, SolveResult},
    penalty::PenaltySolver,
    problem::{Assignment, SubproblemSpec},
};

/// Solve a sub-problem specification.
pub trait ConvexSolverGateway {
    fn solve(&self, spec: &SubproblemSpec) -> SolveResult<Assignment>;
}

impl<T: ConvexSolverGateway + ?Sized> ConvexSolverGateway for &T {
    fn solve(&self, spec: &SubproblemSpec) -> SolveResult<Assignment> {
        (**self).solve(spec)
    }
}

/// Built-in gateway combining the barrier and penalty back ends.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultGateway {
    pub barrier: InteriorPointSolver,
    pub penalty: PenaltySolver,
}

impl DefaultGateway {
    pub fn new(barrier: InteriorPointSolver, penalty: PenaltySolver) -> Self {
        Self { barrier, penalty }
    }
}

impl ConvexSolverGateway for DefaultGateway {
    fn solve(&self, spec: &SubproblemSpec) -> SolveResult<Assignment> {
        spec.validate()?;
        match spec.first_nonconvex() {
            None => self.barrier.solve(spec),
            Some(_) if spec.allow_nonconvex() => self.penalty.solve(spec),
            Some(name) => Err(SolveError::NonconvexNotAllowed { constraint: name.to_string() }),
        }
    }
}
