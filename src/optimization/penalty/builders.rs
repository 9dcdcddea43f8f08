//! penalty::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Hide argmin's generic wiring behind two builders, one per line search,
//! and apply the inner tolerances from [`PenaltyOptions`]. Initial
//! parameters and iteration limits are runtime concerns left to
//! [`run_lbfgs`](super::run::run_lbfgs).
//!
//! Conventions
//! -----------
//! - The L-BFGS memory is `opts.lbfgs_mem` or [`DEFAULT_LBFGS_MEM`].
//! - Invalid tolerances rejected by argmin surface as
//!   [`SolveError`](crate::optimization::errors::SolveError) through the
//!   crate's `From<argmin::core::Error>` conversion.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::SolveResult,
    penalty::options::PenaltyOptions,
    types::{
        Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta,
        DEFAULT_LBFGS_MEM,
    },
};

/// Construct L-BFGS with Hager–Zhang line search.
///
/// # Errors
/// Returned when argmin rejects a configured tolerance.
pub fn build_optimizer_hager_zhang(opts: &PenaltyOptions) -> SolveResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search.
///
/// # Errors
/// Returned when argmin rejects a configured tolerance.
pub fn build_optimizer_more_thuente(opts: &PenaltyOptions) -> SolveResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let mem = opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM);
    let lbfgs = LbfgsMoreThuente::new(more_thuente, mem);
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional gradient and cost-change tolerances to a solver.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &PenaltyOptions,
) -> SolveResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
