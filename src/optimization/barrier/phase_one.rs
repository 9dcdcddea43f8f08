//! barrier::phase_one — find a strictly feasible starting point.
//!
//! Solves the auxiliary problem
//!
//! ```text
//! minimize s  subject to  gᵢ(z) − s ≤ 0,  |z_j| − R − s ≤ 0 (unbounded sides)
//! ```
//!
//! with the barrier method, stopping as soon as `s < 0`. The box of radius
//! `R` keeps the auxiliary problem bounded below when some variables have
//! no finite bound; it is widened to cover the start point.
use crate::optimization::{
    barrier::{
        newton::{barrier_minimize, BarrierExit, BarrierProblem},
        options::BarrierOptions,
    },
    errors::{SolveError, SolveResult},
    problem::{QuadExpr, SubproblemSpec, VarId},
    types::Theta,
};

/// Return a point with every `g ∈ ineqs` strictly negative.
///
/// # Errors
/// - [`SolveError::Infeasible`] when phase I converges with `s ≥ 0`; the
///   payload is the smallest max-violation found.
/// - Any numerical error of the underlying barrier run.
pub(crate) fn strictly_feasible_point(
    spec: &SubproblemSpec, ineqs: &[QuadExpr], opts: &BarrierOptions,
) -> SolveResult<Theta> {
    let z0 = spec.start_point();
    let worst = max_value(ineqs, &z0);
    if worst < 0.0 {
        return Ok(z0);
    }

    let n = z0.len();
    let s = VarId(n);
    let radius = z0.iter().fold(opts.phase_one_radius, |r, v| r.max(10.0 * v.abs()));
    let mut lifted: Vec<QuadExpr> = ineqs.iter().map(|g| g.clone().term(s, -1.0)).collect();
    for (j, var) in spec.variables().iter().enumerate() {
        if !var.upper.is_finite() {
            lifted.push(QuadExpr::new().constant(-radius).term(VarId(j), 1.0).term(s, -1.0));
        }
        if !var.lower.is_finite() {
            lifted.push(QuadExpr::new().constant(-radius).term(VarId(j), -1.0).term(s, -1.0));
        }
    }
    let objective = QuadExpr::new().term(s, 1.0);

    let mut start = Theta::zeros(n + 1);
    start.slice_mut(ndarray::s![..n]).assign(&z0);
    start[n] = max_value(&lifted, &start) + 1.0;

    let problem = BarrierProblem { objective: &objective, constraints: &lifted };
    let run = barrier_minimize(problem, start, opts, |w| w[n] < 0.0)?;
    let z = run.z.slice(ndarray::s![..n]).to_owned();
    let violation = max_value(ineqs, &z);
    tracing::trace!(
        subproblem = %spec.name,
        violation,
        newton = run.newton_iterations,
        "phase I finished"
    );
    match run.exit {
        BarrierExit::Stopped => Ok(z),
        BarrierExit::Converged if violation < 0.0 => Ok(z),
        BarrierExit::Converged => Err(SolveError::Infeasible { violation }),
    }
}

fn max_value(exprs: &[QuadExpr], z: &Theta) -> f64 {
    exprs.iter().fold(f64::NEG_INFINITY, |acc, g| acc.max(g.value(z)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Starting at the origin, phase I must move into the open region
    // {a + b ≥ 1, a ≤ 0.9, b ≤ 0.9}.
    fn finds_interior_point_of_feasible_region() {
        let mut spec = SubproblemSpec::new("feasible");
        let a = spec.add_bounded_var("a", 0.0, 0.9, 0.0);
        let b = spec.add_bounded_var("b", 0.0, 0.9, 0.0);
        spec.add_le("sum", QuadExpr::new().constant(1.0).term(a, -1.0).term(b, -1.0));
        let ineqs = spec.inequalities();

        let z = strictly_feasible_point(&spec, &ineqs, &BarrierOptions::default())
            .expect("region is nonempty");

        assert!(ineqs.iter().all(|g| g.value(&z) < 0.0));
    }

    #[test]
    // Purpose
    // -------
    // {a ≥ 0.6, a ≤ 0.4} is empty; phase I converges with positive s.
    fn empty_region_is_infeasible() {
        let mut spec = SubproblemSpec::new("empty");
        spec.add_bounded_var("a", 0.6, f64::INFINITY, 0.6);
        let a = VarId(0);
        spec.add_le("cap", QuadExpr::new().constant(-0.4).term(a, 1.0));
        let ineqs = spec.inequalities();

        let err = strictly_feasible_point(&spec, &ineqs, &BarrierOptions::default());

        match err {
            Err(SolveError::Infeasible { violation }) => assert!(violation > 0.05),
            other => panic!("expected infeasibility, got {other:?}"),
        }
    }
}
