//! Configuration for the augmented-Lagrangian solver.
//!
//! - [`Tolerances`]: stopping rules for each inner L-BFGS run.
//! - [`LineSearcher`]: choice of line search used by L-BFGS.
//! - [`PenaltyOptions`]: outer-loop settings (penalty schedule, feasibility
//!   tolerance, multistart) plus the inner settings above.
use crate::optimization::{
    errors::{SolveError, SolveResult},
    validation::{verify_positive, verify_tol_cost, verify_tol_grad},
};
use std::str::FromStr;

/// Choice of line search used inside the L-BFGS solver.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"MoreThuente"`, `"HagerZhang"`). Unknown names return
/// `SolveError::InvalidLineSearch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSearcher {
    MoreThuente,
    HagerZhang,
}

impl FromStr for LineSearcher {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "morethuente" => Ok(LineSearcher::MoreThuente),
            "hagerzhang" => Ok(LineSearcher::HagerZhang),
            _ => Err(SolveError::InvalidLineSearch {
                name: s.to_string(),
                reason: "Valid options are case insensitive 'MoreThuente' or 'HagerZhang'.",
            }),
        }
    }
}

/// Numerical tolerances and iteration limits for one inner L-BFGS run.
///
/// Any field can be `None` but **at least one** of the three must be provided.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    pub tol_grad: Option<f64>,
    pub tol_cost: Option<f64>,
    pub max_iter: Option<usize>,
}

impl Tolerances {
    /// Construct validated tolerances.
    ///
    /// # Errors
    /// - [`SolveError::NoTolerancesProvided`] if all three are `None`.
    /// - [`SolveError::InvalidTolGrad`] / [`SolveError::InvalidTolCost`] for
    ///   non-finite or non-positive tolerances.
    /// - [`SolveError::InvalidMaxIter`] if `max_iter == 0`.
    pub fn new(
        tol_grad: Option<f64>, tol_cost: Option<f64>, max_iter: Option<usize>,
    ) -> SolveResult<Self> {
        if tol_grad.is_none() && tol_cost.is_none() && max_iter.is_none() {
            return Err(SolveError::NoTolerancesProvided);
        }
        verify_tol_cost(tol_cost)?;
        verify_tol_grad(tol_grad)?;
        if let Some(max_iter) = max_iter {
            if max_iter == 0 {
                return Err(SolveError::InvalidMaxIter {
                    max_iter,
                    reason: "Maximum iterations must be greater than zero.",
                });
            }
        }
        Ok(Self { tol_grad, tol_cost, max_iter })
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self { tol_grad: Some(1e-9), tol_cost: None, max_iter: Some(500) }
    }
}

/// Settings for [`PenaltySolver`](super::PenaltySolver).
///
/// Fields:
/// - `tols`, `line_searcher`, `lbfgs_mem`, `verbose`: inner L-BFGS settings
///   (`verbose` attaches a slog observer behind the `obs_slog` feature).
/// - `rho0`: initial penalty weight.
/// - `rho_growth`: factor applied to the penalty when the violation fails to
///   shrink by `progress` between outer rounds.
/// - `rho_max`: cap on the penalty weight.
/// - `progress`: required violation reduction ratio per outer round.
/// - `feas_tol`: maximum constraint violation accepted as feasible.
/// - `max_outer`: outer (multiplier update) rounds per start.
/// - `restarts`: additional random starts after the hinted start.
/// - `seed`: seed for the random starts; equal seeds give equal results.
///
/// Default:
/// - `rho0 = 10`, `rho_growth = 10`, `rho_max = 1e10`, `progress = 0.25`,
///   `feas_tol = 1e-7`, `max_outer = 40`, `restarts = 4`, `seed = 7`,
///   More–Thuente line search, default tolerances, quiet.
#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyOptions {
    pub tols: Tolerances,
    pub line_searcher: LineSearcher,
    pub lbfgs_mem: Option<usize>,
    pub verbose: bool,
    pub rho0: f64,
    pub rho_growth: f64,
    pub rho_max: f64,
    pub progress: f64,
    pub feas_tol: f64,
    pub max_outer: usize,
    pub restarts: usize,
    pub seed: u64,
}

impl PenaltyOptions {
    /// Create options with custom inner settings and default outer schedule.
    ///
    /// # Errors
    /// - [`SolveError::InvalidLBFGSMem`] if `lbfgs_mem == Some(0)`.
    pub fn new(
        tols: Tolerances, line_searcher: LineSearcher, verbose: bool, lbfgs_mem: Option<usize>,
    ) -> SolveResult<Self> {
        let opts = Self { tols, line_searcher, verbose, lbfgs_mem, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> SolveResult<()> {
        if let Some(m) = self.lbfgs_mem {
            if m == 0 {
                return Err(SolveError::InvalidLBFGSMem {
                    mem: m,
                    reason: "L-BFGS memory must be greater than zero.",
                });
            }
        }
        verify_positive("rho0", self.rho0)?;
        verify_positive("rho_max", self.rho_max)?;
        verify_positive("feas_tol", self.feas_tol)?;
        verify_positive("progress", self.progress)?;
        if !(self.rho_growth.is_finite() && self.rho_growth > 1.0) {
            return Err(SolveError::InvalidSetting {
                name: "rho_growth",
                value: self.rho_growth,
                reason: "Penalty growth factor must exceed 1.",
            });
        }
        if self.max_outer == 0 {
            return Err(SolveError::InvalidMaxIter {
                max_iter: 0,
                reason: "Maximum iterations must be greater than zero.",
            });
        }
        Ok(())
    }
}

impl Default for PenaltyOptions {
    fn default() -> Self {
        Self {
            tols: Tolerances::default(),
            line_searcher: LineSearcher::MoreThuente,
            lbfgs_mem: None,
            verbose: false,
            rho0: 10.0,
            rho_growth: 10.0,
            rho_max: 1e10,
            progress: 0.25,
            feas_tol: 1e-7,
            max_outer: 40,
            restarts: 4,
            seed: 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Case-insensitive parsing of line-search names.
    // - Validation rules of `Tolerances` and `PenaltyOptions`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Line-search names parse regardless of case; unknown names fail with
    // `InvalidLineSearch`.
    fn line_searcher_parses_case_insensitively() {
        assert_eq!("morethuente".parse::<LineSearcher>(), Ok(LineSearcher::MoreThuente));
        assert_eq!("HAGERZHANG".parse::<LineSearcher>(), Ok(LineSearcher::HagerZhang));
        assert!(matches!(
            "Armijo".parse::<LineSearcher>(),
            Err(SolveError::InvalidLineSearch { .. })
        ));
    }

    #[test]
    fn tolerances_require_at_least_one_rule() {
        assert_eq!(Tolerances::new(None, None, None), Err(SolveError::NoTolerancesProvided));
        assert!(matches!(
            Tolerances::new(None, None, Some(0)),
            Err(SolveError::InvalidMaxIter { .. })
        ));
        assert!(Tolerances::new(Some(1e-6), None, None).is_ok());
    }

    #[test]
    fn penalty_options_reject_zero_memory_and_flat_growth() {
        assert!(matches!(
            PenaltyOptions::new(Tolerances::default(), LineSearcher::HagerZhang, false, Some(0)),
            Err(SolveError::InvalidLBFGSMem { .. })
        ));
        let flat = PenaltyOptions { rho_growth: 1.0, ..PenaltyOptions::default() };
        assert!(matches!(flat.validate(), Err(SolveError::InvalidSetting { .. })));
        assert!(PenaltyOptions::default().validate().is_ok());
    }
}
