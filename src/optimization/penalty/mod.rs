//! penalty — augmented-Lagrangian local solver for nonconvex sub-problems.
//!
//! Purpose
//! -------
//! Handle sub-problems containing bilinear constraints (the direct
//! formulation and the single-step linearization), which the barrier method
//! refuses. Each outer round minimizes the PHR augmented Lagrangian with
//! argmin's L-BFGS and then updates multipliers and the penalty weight.
//!
//! Key behaviors
//! -------------
//! - Multipliers follow `λᵢ ← max(0, λᵢ + ρ gᵢ(z))`; `ρ` grows by
//!   `rho_growth` whenever the max violation fails to shrink by `progress`.
//! - The hinted start is tried first, then `restarts` seeded random starts;
//!   the feasible result with the smallest objective wins.
//! - A failing inner L-BFGS run ends that start early; the last iterate is
//!   still judged on feasibility.
//!
//! Invariants & assumptions
//! ------------------------
//! - The result is a local optimum at best; nonconvex sub-problems carry no
//!   global guarantee.
//! - Results are deterministic for a fixed `seed`.
//! - A point is reported only if its max violation is within `feas_tol`;
//!   otherwise the solve fails with [`SolveError::Infeasible`].
pub mod adapter;
pub mod builders;
pub mod options;
pub mod run;

pub use self::options::{LineSearcher, PenaltyOptions, Tolerances};

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::optimization::{
    errors::{SolveError, SolveResult},
    penalty::{
        adapter::AugmentedLagrangian,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::{run_lbfgs, InnerOutcome},
    },
    problem::{Assignment, QuadExpr, SubproblemSpec},
    types::Theta,
};

/// Augmented-Lagrangian solver with deterministic multistart.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PenaltySolver {
    pub opts: PenaltyOptions,
}

/// Final iterate of one start.
#[derive(Debug, Clone, PartialEq)]
struct LocalSolution {
    z: Theta,
    objective: f64,
    violation: f64,
}

impl PenaltySolver {
    pub fn new(opts: PenaltyOptions) -> SolveResult<Self> {
        opts.validate()?;
        Ok(Self { opts })
    }

    /// Locally minimize `spec`, which may contain nonconvex constraints.
    ///
    /// # Errors
    /// - [`SolveError::Infeasible`] if no start reaches `feas_tol`.
    /// - Structural errors from [`SubproblemSpec::validate`].
    pub fn solve(&self, spec: &SubproblemSpec) -> SolveResult<Assignment> {
        spec.validate()?;
        let ineqs = spec.inequalities();
        let mut best: Option<LocalSolution> = None;
        let mut least_violation = f64::INFINITY;
        for (k, z0) in self.starts(spec).into_iter().enumerate() {
            let local = self.solve_from(spec, &ineqs, z0);
            tracing::trace!(
                subproblem = %spec.name,
                start = k,
                objective = local.objective,
                violation = local.violation,
                "augmented Lagrangian start finished"
            );
            least_violation = least_violation.min(local.violation);
            if local.violation <= self.opts.feas_tol
                && best.as_ref().map_or(true, |b| local.objective < b.objective)
            {
                best = Some(local);
            }
        }
        match best {
            Some(sol) => Ok(Assignment::new(spec, sol.z)),
            None => Err(SolveError::Infeasible { violation: least_violation }),
        }
    }

    /// The hinted start followed by `restarts` seeded random points inside
    /// the variable bounds (or near the hint where a side is unbounded).
    fn starts(&self, spec: &SubproblemSpec) -> Vec<Theta> {
        let mut rng = StdRng::seed_from_u64(self.opts.seed);
        let hint = spec.start_point();
        let mut out = vec![hint.clone()];
        for _ in 0..self.opts.restarts {
            let z: Theta = spec
                .variables()
                .iter()
                .zip(hint.iter())
                .map(|(var, &h)| {
                    let span = 1.0f64.max(2.0 * h.abs());
                    let lo = if var.lower.is_finite() { var.lower } else { h - span };
                    let hi = if var.upper.is_finite() { var.upper } else { lo.max(h) + span };
                    if hi > lo {
                        rng.gen_range(lo..hi)
                    } else {
                        lo
                    }
                })
                .collect();
            out.push(z);
        }
        out
    }

    fn solve_from(&self, spec: &SubproblemSpec, ineqs: &[QuadExpr], z0: Theta) -> LocalSolution {
        let opts = &self.opts;
        let mut multipliers = vec![0.0; ineqs.len()];
        let mut rho = opts.rho0;
        let mut z = z0;
        let mut prev_violation = f64::INFINITY;
        let mut prev_objective = f64::INFINITY;
        for round in 0..opts.max_outer {
            let problem = AugmentedLagrangian::new(spec.objective(), ineqs, &multipliers, rho);
            match self.inner(z.clone(), problem) {
                Ok(out) => z = out.theta_hat,
                Err(err) => {
                    tracing::trace!(round, error = %err, "inner L-BFGS run failed");
                    break;
                }
            }
            let values: Vec<f64> = ineqs.iter().map(|g| g.value(&z)).collect();
            let violation = values.iter().fold(0.0f64, |acc, &v| acc.max(v));
            for (lambda, &g) in multipliers.iter_mut().zip(&values) {
                *lambda = (*lambda + rho * g).max(0.0);
            }
            let objective = spec.objective().value(&z);
            let settled =
                (objective - prev_objective).abs() <= opts.feas_tol * (1.0 + objective.abs());
            if violation <= opts.feas_tol && settled {
                break;
            }
            if violation > opts.progress * prev_violation {
                rho = (rho * opts.rho_growth).min(opts.rho_max);
            }
            prev_violation = violation;
            prev_objective = objective;
        }
        let violation = spec.max_violation(&z);
        let objective = spec.objective().value(&z);
        LocalSolution { z, objective, violation }
    }

    fn inner(&self, z: Theta, problem: AugmentedLagrangian<'_>) -> SolveResult<InnerOutcome> {
        match self.opts.line_searcher {
            LineSearcher::MoreThuente => {
                let solver = build_optimizer_more_thuente(&self.opts)?;
                run_lbfgs(z, &self.opts, problem, solver)
            }
            LineSearcher::HagerZhang => {
                let solver = build_optimizer_hager_zhang(&self.opts)?;
                run_lbfgs(z, &self.opts, problem, solver)
            }
        }
    }
}
