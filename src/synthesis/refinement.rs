//! synthesis::refinement — the round loop.
//!
//! Purpose
//! -------
//! Drive repeated approximation rounds: build and solve a sub-problem around
//! the current approximation point, re-evaluate the candidate with a
//! [`ValueOracle`], let the [`TrustRegionController`] judge it, and pick the
//! next approximation point.
//!
//! Key behaviors
//! -------------
//! - [`RefinementLoop::run`] runs one strategy to success, trust-region
//!   exhaustion, or the optional round cap.
//! - [`RefinementLoop::direct_baseline`] solves the exact bilinear problem
//!   once and evaluates its solution.
//! - [`RefinementLoop::iterate_linearization`] chains a fixed number of
//!   single-step linearizations at a fixed radius without the oracle.
//!
//! Invariants & assumptions
//! ------------------------
//! - After an accepted round the next approximation point is the evaluated
//!   candidate. After a rejected round it is the evaluated candidate when
//!   `advance_on_reject` is set, and the last accepted point otherwise.
//! - Every sub-problem, oracle or model error ends the run with that error;
//!   nothing is retried.
//! - Rejected rounds shrink `delta` geometrically, so their number is bounded
//!   by `TrustRegionOptions::max_rejections`. Accepted rounds only need
//!   `ps0 ≤ beta`, so a candidate that stalls at `beta` is accepted again;
//!   `max_rounds` bounds that case.
//!
//! Conventions
//! -----------
//! - One `debug!` event per round, one `info!` at termination, `warn!` when
//!   the trust region is exhausted.
use tracing::{debug, info, warn};

use crate::{
    model::point::ParameterPoint,
    optimization::gateway::ConvexSolverGateway,
    oracle::traits::ValueOracle,
    synthesis::{
        approximation::{ApproximationStep, Strategy},
        errors::SynthesisResult,
        options::SynthesisOptions,
        outcome::{RoundRecord, SynthesisOutcome, SynthesisStatus},
        trust_region::{RoundVerdict, TrustRegionController},
    },
};

/// Refinement driver over an oracle `O` and a solver gateway `G`.
#[derive(Debug, Clone)]
pub struct RefinementLoop<O, G> {
    oracle: O,
    step: ApproximationStep<G>,
    options: SynthesisOptions,
}

impl<O: ValueOracle, G: ConvexSolverGateway> RefinementLoop<O, G> {
    /// # Errors
    /// Any validation error of `options`.
    pub fn new(oracle: O, gateway: G, options: SynthesisOptions) -> SynthesisResult<Self> {
        options.validate()?;
        Ok(Self { oracle, step: ApproximationStep::new(gateway, &options), options })
    }

    pub fn options(&self) -> &SynthesisOptions {
        &self.options
    }

    pub fn approximation(&self) -> &ApproximationStep<G> {
        &self.step
    }

    /// Run `strategy` from `initial` until success, exhaustion or the cap.
    ///
    /// Parameters
    /// ----------
    /// - `strategy`: which sub-problem family to build each round.
    /// - `initial`: first approximation point; only finiteness is required,
    ///   its `x, y` need not lie in the reserve box.
    ///
    /// Returns
    /// -------
    /// [`SynthesisOutcome`] with the terminal status and per-round history.
    ///
    /// Errors
    /// ------
    /// - `SubproblemInfeasible` / `SubproblemUnbounded` / `Solver` from the
    ///   sub-problem of any round.
    /// - `Oracle` if re-evaluation fails.
    /// - `Model` for a non-finite `initial` or an out-of-box candidate.
    pub fn run(
        &self, strategy: Strategy, initial: &ParameterPoint,
    ) -> SynthesisResult<SynthesisOutcome> {
        initial.check_finite()?;
        let mut controller =
            TrustRegionController::new(self.options.c_lambda, &self.options.trust_region);
        let mut anchor = *initial;
        let mut last_evaluated = *initial;
        let mut history: Vec<RoundRecord> = Vec::new();

        let status = loop {
            if self.options.max_rounds.is_some_and(|cap| history.len() >= cap) {
                break SynthesisStatus::RoundLimitReached;
            }
            let round = history.len() + 1;
            let delta = controller.state().delta;

            let candidate = self.step.step(strategy, &anchor, delta)?;
            let evaluated = self.oracle.evaluate(&candidate.point)?;
            let verdict = controller.judge(&evaluated);
            debug!(
                %strategy,
                round,
                radius = 1.0 + delta,
                candidate_ps0 = candidate.point.ps0,
                evaluated_ps0 = evaluated.ps0,
                penalty = candidate.penalty,
                ?verdict,
                "refinement round"
            );
            history.push(RoundRecord {
                round,
                delta,
                candidate: candidate.point,
                evaluated,
                penalty: candidate.penalty,
                verdict,
            });
            last_evaluated = evaluated;

            match verdict {
                RoundVerdict::Success => break SynthesisStatus::Succeeded,
                RoundVerdict::Accepted => anchor = evaluated,
                RoundVerdict::Rejected => {
                    if self.options.advance_on_reject {
                        anchor = evaluated;
                    }
                }
                RoundVerdict::Exhausted => {
                    warn!(
                        %strategy,
                        round,
                        delta = controller.state().delta,
                        omega = controller.state().omega,
                        "trust region exhausted, no instantiation found"
                    );
                    break SynthesisStatus::TrustRegionExhausted;
                }
            }
        };

        let state = *controller.state();
        info!(
            %strategy,
            ?status,
            rounds = history.len(),
            x = last_evaluated.x,
            y = last_evaluated.y,
            ps0 = last_evaluated.ps0,
            "refinement finished"
        );
        Ok(SynthesisOutcome {
            strategy,
            status,
            solution: (status == SynthesisStatus::Succeeded).then_some(last_evaluated),
            last_evaluated,
            rounds: history.len(),
            delta: state.delta,
            beta: state.beta,
            history,
        })
    }

    /// Solve the exact bilinear problem once from `start` and evaluate it.
    ///
    /// The result is not judged against `c_lambda`; the caller compares
    /// `ps0` itself.
    pub fn direct_baseline(&self, start: &ParameterPoint) -> SynthesisResult<ParameterPoint> {
        start.check_finite()?;
        let candidate = self.step.solve_original(start)?;
        let evaluated = self.oracle.evaluate(&candidate.point)?;
        info!(
            x = evaluated.x,
            y = evaluated.y,
            candidate_ps0 = candidate.point.ps0,
            ps0 = evaluated.ps0,
            "direct baseline finished"
        );
        Ok(evaluated)
    }

    /// Chain `rounds` single-step linearizations from `initial` at the fixed
    /// radius `1 + initial_delta`, feeding each solution into the next
    /// round without oracle evaluation. Returns every iterate in order.
    pub fn iterate_linearization(
        &self, initial: &ParameterPoint, rounds: usize,
    ) -> SynthesisResult<Vec<ParameterPoint>> {
        initial.check_finite()?;
        let delta = self.options.trust_region.initial_delta;
        let mut anchor = *initial;
        let mut iterates = Vec::with_capacity(rounds);
        for round in 1..=rounds {
            let candidate = self.step.step(Strategy::IterativeLinearization, &anchor, delta)?;
            debug!(
                round,
                x = candidate.point.x,
                y = candidate.point.y,
                ps0 = candidate.point.ps0,
                "fixed linearization round"
            );
            anchor = candidate.point;
            iterates.push(anchor);
        }
        Ok(iterates)
    }
}
