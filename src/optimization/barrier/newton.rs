//! barrier::newton — damped Newton centering and the outer barrier loop.
//!
//! Purpose
//! -------
//! Minimize `t·f(z) − Σ log(−gᵢ(z))` for an increasing sequence of `t`,
//! starting from a strictly feasible point. Each centering step is a damped
//! Newton method whose backtracking search first restores strict
//! feasibility and then enforces Armijo sufficient decrease.
//!
//! Key behaviors
//! -------------
//! - The Newton system is solved by dense Cholesky. When the barrier Hessian
//!   is numerically singular (large `t` near a non-unique optimum), a
//!   diagonal shift proportional to its largest diagonal entry is added and
//!   the factorization retried; LU on the unshifted system is the last resort.
//! - If a Newton system still cannot be solved once the gap bound `m / t` is
//!   below `breakdown_gap_tol`, the current strictly feasible iterate is
//!   returned as converged.
//! - A caller-supplied `stop` predicate is checked after every accepted
//!   step; phase I uses it to quit as soon as a strictly feasible point of
//!   the original problem appears.
//! - Iterates whose magnitude exceeds `divergence_limit` abort the run with
//!   [`SolveError::Unbounded`].
//!
//! Invariants & assumptions
//! ------------------------
//! - `f` and all `gᵢ` are convex quadratics; the routine does not re-check.
//! - Every iterate satisfies `gᵢ(z) < 0` for all `i`.
//! - A centering step that stalls (step length below `MIN_STEP`) or hits the
//!   Newton iteration cap is treated as centered; the outer loop still
//!   increases `t` and the iterate stays strictly feasible.
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;

use crate::optimization::{
    barrier::options::BarrierOptions,
    errors::{SolveError, SolveResult},
    problem::QuadExpr,
    types::{Grad, Hessian, Theta},
};

const MIN_STEP: f64 = 1e-14;

/// Relative diagonal shifts tried when the Newton system is singular.
const SHIFTS: [f64; 5] = [1e-12, 1e-10, 1e-8, 1e-6, 1e-4];

/// Objective and inequality constraints seen by the barrier method.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BarrierProblem<'a> {
    pub objective: &'a QuadExpr,
    pub constraints: &'a [QuadExpr],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BarrierExit {
    /// The gap bound `m / t` fell below `gap_tol`.
    Converged,
    /// The `stop` predicate fired.
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BarrierRun {
    pub z: Theta,
    pub exit: BarrierExit,
    pub outer_iterations: usize,
    pub newton_iterations: usize,
}

impl<'a> BarrierProblem<'a> {
    fn is_strictly_feasible(&self, z: &Theta) -> bool {
        self.constraints.iter().all(|g| g.value(z) < 0.0)
    }

    fn barrier_value(&self, z: &Theta, t: f64) -> f64 {
        self.constraints
            .iter()
            .fold(t * self.objective.value(z), |acc, g| acc - (-g.value(z)).ln())
    }

    /// Gradient and Hessian of the barrier function at a strictly feasible `z`.
    fn derivatives(&self, z: &Theta, t: f64) -> (Grad, Hessian) {
        let n = z.len();
        let mut grad = Grad::zeros(n);
        let mut hess = Hessian::zeros((n, n));
        self.objective.accumulate_gradient(z, t, &mut grad);
        self.objective.accumulate_hessian(t, &mut hess);
        for g in self.constraints {
            let slack = -g.value(z);
            let dg = g.gradient(z);
            grad.scaled_add(1.0 / slack, &dg);
            for a in 0..n {
                for b in 0..n {
                    hess[[a, b]] += dg[a] * dg[b] / (slack * slack);
                }
            }
            g.accumulate_hessian(1.0 / slack, &mut hess);
        }
        (grad, hess)
    }
}

/// Run the barrier method from the strictly feasible point `z0`.
///
/// # Errors
/// - [`SolveError::NewtonBreakdown`] if `z0` is not strictly feasible or a
///   Newton system cannot be solved while `m / t ≥ breakdown_gap_tol`.
/// - [`SolveError::Unbounded`] if the iterates diverge.
/// - [`SolveError::IterationLimit`] if `max_outer_iter` centering steps do
///   not close the gap.
pub(crate) fn barrier_minimize<S>(
    problem: BarrierProblem<'_>, z0: Theta, opts: &BarrierOptions, stop: S,
) -> SolveResult<BarrierRun>
where
    S: Fn(&Theta) -> bool,
{
    if !problem.is_strictly_feasible(&z0) {
        return Err(SolveError::NewtonBreakdown {
            text: "starting point is not strictly feasible".to_string(),
        });
    }
    let m = problem.constraints.len() as f64;
    let mut z = z0;
    let mut t = opts.t0;
    let mut newton_iterations = 0;
    for outer in 1..=opts.max_outer_iter {
        let stopped = match centering(problem, &mut z, t, opts, &stop, &mut newton_iterations) {
            Ok(stopped) => stopped,
            Err(SolveError::NewtonBreakdown { text }) if m / t < opts.breakdown_gap_tol => {
                tracing::trace!(t, gap = m / t, %text, "Newton breakdown near optimum");
                return Ok(BarrierRun {
                    z,
                    exit: BarrierExit::Converged,
                    outer_iterations: outer,
                    newton_iterations,
                });
            }
            Err(err) => return Err(err),
        };
        if stopped {
            return Ok(BarrierRun {
                z,
                exit: BarrierExit::Stopped,
                outer_iterations: outer,
                newton_iterations,
            });
        }
        if m / t < opts.gap_tol {
            return Ok(BarrierRun {
                z,
                exit: BarrierExit::Converged,
                outer_iterations: outer,
                newton_iterations,
            });
        }
        t *= opts.mu;
    }
    Err(SolveError::IterationLimit { stage: "barrier method", iterations: opts.max_outer_iter })
}

/// Damped Newton minimization of the barrier function at fixed `t`.
///
/// Returns `Ok(true)` if `stop` fired on an accepted iterate.
fn centering<S>(
    problem: BarrierProblem<'_>, z: &mut Theta, t: f64, opts: &BarrierOptions, stop: &S,
    newton_iterations: &mut usize,
) -> SolveResult<bool>
where
    S: Fn(&Theta) -> bool,
{
    for _ in 0..opts.max_newton_iter {
        let (grad, hess) = problem.derivatives(z, t);
        let step = solve_newton_system(&hess, &grad)?;
        let slope = grad.dot(&step);
        if -slope / 2.0 <= opts.newton_tol {
            return Ok(false);
        }
        let f0 = problem.barrier_value(z, t);
        let mut alpha = 1.0;
        let accepted = loop {
            let candidate = &*z + &(&step * alpha);
            if problem.is_strictly_feasible(&candidate)
                && problem.barrier_value(&candidate, t) <= f0 + opts.armijo * alpha * slope
            {
                break Some(candidate);
            }
            alpha *= opts.backtrack;
            if alpha < MIN_STEP {
                break None;
            }
        };
        let Some(candidate) = accepted else {
            tracing::trace!(t, "barrier centering stalled in line search");
            return Ok(false);
        };
        *z = candidate;
        *newton_iterations += 1;
        if z.iter().any(|v| v.abs() > opts.divergence_limit) {
            return Err(SolveError::Unbounded);
        }
        if stop(z) {
            return Ok(true);
        }
    }
    tracing::trace!(t, max = opts.max_newton_iter, "barrier centering hit its iteration cap");
    Ok(false)
}

/// Solve `H d = −g`, shifting the diagonal of `H` if it is singular.
fn solve_newton_system(hess: &Hessian, grad: &Grad) -> SolveResult<Grad> {
    let n = grad.len();
    let lhs = DMatrix::from_fn(n, n, |i, j| hess[[i, j]]);
    let rhs = DVector::from_fn(n, |i, _| -grad[i]);
    let scale = lhs.diagonal().iter().fold(1.0_f64, |acc, d| acc.max(d.abs()));
    let shifted = std::iter::once(0.0).chain(SHIFTS.iter().map(|s| s * scale)).find_map(|shift| {
        let mut m = lhs.clone();
        for i in 0..n {
            m[(i, i)] += shift;
        }
        m.cholesky().map(|chol| chol.solve(&rhs)).filter(|d| d.iter().all(|v| v.is_finite()))
    });
    let solution = shifted.or_else(|| lhs.lu().solve(&rhs));
    let solution = solution.ok_or_else(|| SolveError::NewtonBreakdown {
        text: "barrier Hessian is singular".to_string(),
    })?;
    if solution.iter().any(|v| !v.is_finite()) {
        return Err(SolveError::NewtonBreakdown {
            text: "Newton direction is not finite".to_string(),
        });
    }
    Ok(Array1::from_iter(solution.iter().copied()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::problem::{LinearForm, VarId};
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Convergence of the outer loop on a small LP and a small QP.
    // - Early exit through the `stop` predicate.
    // - Rejection of infeasible starts and detection of divergence.
    // - Singular Newton systems near a non-unique optimum.
    // -------------------------------------------------------------------------

    fn lower(var: usize, bound: f64) -> QuadExpr {
        QuadExpr::new().constant(bound).term(VarId(var), -1.0)
    }

    fn upper(var: usize, bound: f64) -> QuadExpr {
        QuadExpr::new().constant(-bound).term(VarId(var), 1.0)
    }

    #[test]
    // Purpose
    // -------
    // Minimize a + b over a + b ≥ 1, a, b ≥ 0.2: the optimum value is 1.
    //
    // Given
    // -----
    // - Strictly feasible start (1, 1).
    //
    // Expect
    // ------
    // - Converged exit with a + b within 1e-6 of 1 and bounds respected.
    fn lp_converges_to_optimal_value() {
        // Arrange
        let objective = QuadExpr::new().term(VarId(0), 1.0).term(VarId(1), 1.0);
        let constraints = vec![
            QuadExpr::new().constant(1.0).term(VarId(0), -1.0).term(VarId(1), -1.0),
            lower(0, 0.2),
            lower(1, 0.2),
        ];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };

        // Act
        let run = barrier_minimize(problem, array![1.0, 1.0], &BarrierOptions::default(), |_| false)
            .expect("LP should solve");

        // Assert
        assert_eq!(run.exit, BarrierExit::Converged);
        assert_relative_eq!(run.z[0] + run.z[1], 1.0, epsilon = 1e-6);
        assert!(run.z[0] > 0.2 && run.z[1] > 0.2);
    }

    #[test]
    // Purpose
    // -------
    // An exactly singular PSD Hessian is solved through the diagonal shift.
    //
    // Given
    // -----
    // - H = [[1, 1], [1, 1]], g = (1, 1), which lies in the range of H.
    //
    // Expect
    // ------
    // - d ≈ −g / 2, the minimum-norm Newton direction, up to the
    //   conditioning of the smallest shift.
    fn singular_hessian_is_regularized() {
        let hess = array![[1.0, 1.0], [1.0, 1.0]];
        let grad = array![1.0, 1.0];

        let d = solve_newton_system(&hess, &grad).expect("shifted system should factor");

        assert_relative_eq!(d[0], -0.5, epsilon = 1e-3);
        assert_relative_eq!(d[1], -0.5, epsilon = 1e-3);
    }

    #[test]
    // Purpose
    // -------
    // A degenerate LP whose optimal face is a segment, driven to a tight gap.
    //
    // Given
    // -----
    // - Minimize a + b over a + b ≥ 1, 0 ≤ a, b ≤ 1 with gap_tol = 1e-12.
    //
    // Expect
    // ------
    // - The run ends converged on the optimal face, never with a breakdown.
    fn degenerate_lp_reaches_tight_gap() {
        let objective = QuadExpr::new().term(VarId(0), 1.0).term(VarId(1), 1.0);
        let constraints = vec![
            QuadExpr::new().constant(1.0).term(VarId(0), -1.0).term(VarId(1), -1.0),
            lower(0, 0.0),
            lower(1, 0.0),
            upper(0, 1.0),
            upper(1, 1.0),
        ];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };
        let opts = BarrierOptions { gap_tol: 1e-12, ..BarrierOptions::default() };

        let run = barrier_minimize(problem, array![0.9, 0.9], &opts, |_| false)
            .expect("degenerate LP should converge");

        assert_eq!(run.exit, BarrierExit::Converged);
        assert_relative_eq!(run.z[0] + run.z[1], 1.0, epsilon = 1e-6);
        assert!(problem.is_strictly_feasible(&run.z));
    }

    #[test]
    // Purpose
    // -------
    // Minimize (a − 2)² subject to a ≤ 1: the constrained optimum is a = 1.
    fn qp_optimum_sits_on_active_constraint() {
        let objective = QuadExpr::new().square(1.0, LinearForm::new(-2.0).term(VarId(0), 1.0));
        let constraints = vec![upper(0, 1.0)];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };

        let run = barrier_minimize(problem, array![0.0], &BarrierOptions::default(), |_| false)
            .expect("QP should solve");

        assert_relative_eq!(run.z[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn stop_predicate_ends_the_run_early() {
        let objective = QuadExpr::new().term(VarId(0), 1.0);
        let constraints = vec![lower(0, -5.0), upper(0, 5.0)];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };

        let run = barrier_minimize(problem, array![4.0], &BarrierOptions::default(), |z| z[0] < 0.0)
            .expect("run should stop");

        assert_eq!(run.exit, BarrierExit::Stopped);
        assert!(run.z[0] < 0.0);
    }

    #[test]
    fn infeasible_start_is_rejected() {
        let objective = QuadExpr::new().term(VarId(0), 1.0);
        let constraints = vec![lower(0, 1.0)];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };

        let err = barrier_minimize(problem, array![0.5], &BarrierOptions::default(), |_| false);

        assert!(matches!(err, Err(SolveError::NewtonBreakdown { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Minimize −a subject to a ≥ 0: the Newton steps grow like t·a², so the
    // iterates must be reported as diverging.
    fn unbounded_direction_is_detected() {
        let objective = QuadExpr::new().term(VarId(0), -1.0);
        let constraints = vec![lower(0, 0.0)];
        let problem = BarrierProblem { objective: &objective, constraints: &constraints };
        let opts = BarrierOptions { divergence_limit: 1e6, ..BarrierOptions::default() };

        let err = barrier_minimize(problem, array![1.0], &opts, |_| false);

        assert_eq!(err, Err(SolveError::Unbounded));
    }
}
