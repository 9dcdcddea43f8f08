//! barrier — primal log-barrier interior-point method for convex sub-problems.
//!
//! Purpose
//! -------
//! Solve convex quadratically constrained sub-problems (every constraint and
//! the objective pass [`QuadExpr::is_convex`](crate::optimization::problem::QuadExpr::is_convex))
//! to high accuracy with a dense Newton method. Sub-problems built by the
//! synthesis layer have at most eight variables, so dense linear algebra via
//! `nalgebra` is sufficient.
//!
//! Key behaviors
//! -------------
//! - Phase I ([`phase_one`]) finds a strictly feasible point or proves the
//!   feasible set has no interior, reported as [`SolveError::Infeasible`].
//! - Phase II ([`newton`]) follows the central path until the duality-gap
//!   bound `m / t` drops below `gap_tol`.
//! - Divergence of the iterates is reported as [`SolveError::Unbounded`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Returned points satisfy every constraint strictly, so they are feasible
//!   for the exact sub-problem regardless of the final accuracy.
//! - Feasible sets without interior (e.g. equality-like pairs of
//!   inequalities) are reported as infeasible.
//!
//! Downstream usage
//! ----------------
//! - [`DefaultGateway`](crate::optimization::gateway::DefaultGateway) routes
//!   convex sub-problems here.
pub mod newton;
pub mod options;
pub mod phase_one;

pub use self::options::BarrierOptions;

use crate::optimization::{
    barrier::{
        newton::{barrier_minimize, BarrierProblem},
        phase_one::strictly_feasible_point,
    },
    errors::{SolveError, SolveResult},
    problem::{Assignment, SubproblemSpec},
};

/// Interior-point solver for convex sub-problems.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InteriorPointSolver {
    pub opts: BarrierOptions,
}

impl InteriorPointSolver {
    pub fn new(opts: BarrierOptions) -> SolveResult<Self> {
        opts.validate()?;
        Ok(Self { opts })
    }

    /// Minimize `spec` to the configured gap tolerance.
    ///
    /// # Errors
    /// - [`SolveError::NonconvexNotAllowed`] if any part of `spec` is nonconvex.
    /// - [`SolveError::Infeasible`], [`SolveError::Unbounded`] as described in
    ///   the module docs.
    /// - Numerical failures of the Newton iterations.
    pub fn solve(&self, spec: &SubproblemSpec) -> SolveResult<Assignment> {
        spec.validate()?;
        if let Some(name) = spec.first_nonconvex() {
            return Err(SolveError::NonconvexNotAllowed { constraint: name.to_string() });
        }
        let ineqs = spec.inequalities();
        let z0 = strictly_feasible_point(spec, &ineqs, &self.opts)?;
        let problem = BarrierProblem { objective: spec.objective(), constraints: &ineqs };
        let run = barrier_minimize(problem, z0, &self.opts, |_| false)?;
        tracing::trace!(
            subproblem = %spec.name,
            outer = run.outer_iterations,
            newton = run.newton_iterations,
            "barrier method converged"
        );
        Ok(Assignment::new(spec, run.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::problem::{LinearForm, QuadExpr};
    use approx::assert_relative_eq;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Full phase I + phase II solves with a convex quadratic constraint.
    // - Infeasibility and nonconvexity reporting through `solve`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Minimize −a − b over the disc (a − 1)² + (b − 1)² ≤ 1 with a start
    // hint outside the disc.
    //
    // Expect
    // ------
    // - Optimum at (1 + 1/√2, 1 + 1/√2), objective −2 − √2.
    fn disc_maximum_is_found_from_outside_start() {
        // Arrange
        let mut spec = SubproblemSpec::new("disc");
        let a = spec.add_var("a", 5.0);
        let b = spec.add_var("b", 5.0);
        spec.add_le(
            "disc",
            QuadExpr::new()
                .constant(-1.0)
                .square(1.0, LinearForm::new(-1.0).term(a, 1.0))
                .square(1.0, LinearForm::new(-1.0).term(b, 1.0)),
        );
        spec.minimize(QuadExpr::new().term(a, -1.0).term(b, -1.0));

        // Act
        let sol = InteriorPointSolver::default().solve(&spec).expect("disc problem is feasible");

        // Assert
        let corner = 1.0 + std::f64::consts::FRAC_1_SQRT_2;
        assert_relative_eq!(sol.get(a), corner, epsilon = 1e-5);
        assert_relative_eq!(sol.get(b), corner, epsilon = 1e-5);
        assert_relative_eq!(sol.objective(), -2.0 - std::f64::consts::SQRT_2, epsilon = 1e-6);
    }

    #[test]
    fn infeasible_problem_is_reported() {
        let mut spec = SubproblemSpec::new("infeasible");
        let a = spec.add_var("a", 0.0);
        spec.add_le("above", QuadExpr::new().constant(2.0).term(a, -1.0));
        spec.add_le("below", QuadExpr::new().constant(-1.0).term(a, 1.0));
        spec.minimize(QuadExpr::new().term(a, 1.0));

        assert!(matches!(
            InteriorPointSolver::default().solve(&spec),
            Err(SolveError::Infeasible { .. })
        ));
    }

    #[test]
    fn nonconvex_problem_is_refused() {
        let mut spec = SubproblemSpec::new("bilinear");
        let a = spec.add_var("a", 0.5);
        let b = spec.add_var("b", 0.5);
        spec.add_le("prod", QuadExpr::new().constant(-1.0).product(a, b, 1.0));

        assert_eq!(
            InteriorPointSolver::default().solve(&spec),
            Err(SolveError::NonconvexNotAllowed { constraint: "prod".to_string() })
        );
    }
}
