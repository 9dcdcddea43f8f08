//! Execution helper that runs an `argmin` solver on one augmented-Lagrangian
//! subproblem and returns a crate-friendly [`InnerOutcome`].
use crate::optimization::{
    errors::SolveResult,
    penalty::{adapter::AugmentedLagrangian, options::PenaltyOptions},
    types::{FnEvalMap, Grad, Theta},
    validation::{validate_theta_hat, validate_value},
};
#[cfg(feature = "obs_slog")]
use argmin::core::{CostFunction, Gradient};
use argmin::core::{Executor, State, TerminationStatus};
#[cfg(feature = "obs_slog")]
use argmin_math::ArgminL2Norm;

/// Result of one inner L-BFGS minimization.
///
/// - `theta_hat`: best point found.
/// - `cost`: augmented-Lagrangian value at `theta_hat`.
/// - `converged`: `true` if argmin reported a terminating status.
/// - `status`: human-readable termination status string.
/// - `iterations`, `fn_evals`: argmin counters.
#[derive(Debug, Clone, PartialEq)]
pub struct InnerOutcome {
    pub theta_hat: Theta,
    pub cost: f64,
    pub converged: bool,
    pub status: String,
    pub iterations: usize,
    pub fn_evals: FnEvalMap,
}

impl InnerOutcome {
    /// Build a validated outcome from raw solver state.
    ///
    /// # Errors
    /// Propagates validation errors for `theta_hat` or `cost`.
    pub fn new(
        theta_hat_opt: Option<Theta>, cost: f64, termination: TerminationStatus, iterations: u64,
        fn_evals: FnEvalMap,
    ) -> SolveResult<Self> {
        let theta_hat = validate_theta_hat(theta_hat_opt)?;
        validate_value(cost)?;
        let (converged, status) = match termination {
            TerminationStatus::NotTerminated => (false, "Not terminated".to_string()),
            other => (true, format!("{other:?}")),
        };
        Ok(Self { theta_hat, cost, converged, status, iterations: iterations as usize, fn_evals })
    }
}

/// Run an `argmin` solver on an [`AugmentedLagrangian`].
///
/// Wires up the problem, the solver, `theta0`, the optional slog observer
/// (feature `obs_slog` with `opts.verbose`) and `opts.tols.max_iter`, then
/// executes and converts the final state.
///
/// # Errors
/// - Any argmin runtime error (line-search failure, non-finite cost, ...)
///   via `From<argmin::core::Error>`.
/// - Validation errors for the returned point.
pub fn run_lbfgs<'a, S>(
    theta0: Theta, opts: &PenaltyOptions, problem: AugmentedLagrangian<'a>, solver: S,
) -> SolveResult<InnerOutcome>
where
    S: argmin::core::Solver<
            AugmentedLagrangian<'a>,
            argmin::core::IterState<Theta, Grad, (), (), (), f64>,
        > + Send
        + 'static,
{
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        log_initial_state(&theta0, &problem)?;
    }
    let mut optimizer = Executor::new(problem, solver);
    optimizer = optimizer.configure(|state| state.param(theta0));
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        let observer = argmin_observer_slog::SlogLogger::term_noblock();
        optimizer = optimizer.add_observer(observer, argmin::core::observers::ObserverMode::Always);
    }
    if let Some(max_iter) = opts.tols.max_iter {
        optimizer = optimizer.configure(|state| state.max_iters(max_iter as u64));
    }

    let mut result = optimizer.run()?.state().clone();
    let iterations = result.get_iter();
    let function_counts = result.get_func_counts().clone();
    let termination = result.get_termination_status().clone();
    InnerOutcome::new(
        result.take_best_param(),
        result.get_best_cost(),
        termination,
        iterations,
        function_counts,
    )
}

#[cfg(feature = "obs_slog")]
fn log_initial_state(theta0: &Theta, problem: &AugmentedLagrangian<'_>) -> SolveResult<()> {
    let c0 = problem.cost(theta0)?;
    let g0n = problem.gradient(theta0).ok().map(|g| g.l2_norm());

    tracing::debug!(cost = c0, grad_norm = ?g0n, rho = problem.rho, "augmented Lagrangian start");
    Ok(())
}
