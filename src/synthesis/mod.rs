//! synthesis — trust-region refinement of parameter instantiations.
//!
//! Purpose
//! -------
//! Find `x, y ∈ [epsilon, 1 − epsilon]` such that the reachability quantity
//! `ps0` of the Knuth–Yao fragment is at most `c_lambda`, by alternating
//! convex approximations of the bilinear chain equations with ground-truth
//! re-evaluation.
//!
//! Key behaviors
//! -------------
//! - [`approximation`] builds the per-round sub-problem for each
//!   [`Strategy`] and the exact baseline problem.
//! - [`trust_region`] judges evaluated candidates and owns the radius.
//! - [`refinement`] drives rounds and records the history.
//! - [`synthesize`] runs a strategy with the closed-form oracle and the
//!   default solver gateway.
//!
//! Conventions
//! -----------
//! - Trust-region exhaustion and the round cap are statuses of
//!   [`SynthesisOutcome`]; only sub-problem, oracle, model and option
//!   failures are [`SynthesisError`]s.
pub mod approximation;
pub mod errors;
pub mod options;
pub mod outcome;
pub mod refinement;
pub mod trust_region;

pub use self::approximation::{ApproximationStep, Candidate, Strategy};
pub use self::errors::{SynthesisError, SynthesisResult};
pub use self::options::{DcForm, SynthesisOptions, TrustRegionOptions};
pub use self::outcome::{RoundRecord, SynthesisOutcome, SynthesisStatus};
pub use self::refinement::RefinementLoop;
pub use self::trust_region::{LoopState, RoundVerdict, TrustRegionController, TrustRegionState};

use crate::{
    model::point::ParameterPoint, optimization::gateway::DefaultGateway,
    oracle::closed_form::ClosedFormOracle,
};

/// Run `strategy` from `initial` with the closed-form Knuth–Yao oracle and
/// the default solver gateway.
///
/// # Errors
/// Option validation errors, then any error of [`RefinementLoop::run`].
pub fn synthesize(
    strategy: Strategy, initial: &ParameterPoint, options: &SynthesisOptions,
) -> SynthesisResult<SynthesisOutcome> {
    RefinementLoop::new(ClosedFormOracle::default(), DefaultGateway::default(), *options)?
        .run(strategy, initial)
}
