//! synthesis::trust_region — round judgement and termination.
//!
//! Purpose
//! -------
//! Own the [`TrustRegionState`] of one refinement run and decide, from the
//! oracle-evaluated candidate of each round, whether the run succeeded, the
//! candidate improves on the best observed `ps0`, or the radius must shrink.
//!
//! Key behaviors
//! -------------
//! - `ps0 ≤ c_lambda` (exact comparison) → [`RoundVerdict::Success`].
//! - otherwise `ps0 ≤ beta` → [`RoundVerdict::Accepted`], `beta ← ps0`.
//! - otherwise `delta ← delta / gamma`, and the run fails once
//!   `delta < omega` ([`RoundVerdict::Exhausted`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `delta` and `beta` never increase.
//! - After `Success` or `Exhausted` the controller is terminal: further
//!   judgements repeat the terminal verdict and leave the state untouched.
use crate::{model::point::ParameterPoint, synthesis::options::TrustRegionOptions};

/// Radius bookkeeping of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustRegionState {
    /// Radius excess; the multiplicative box radius is `1 + delta`.
    pub delta: f64,
    /// Best observed `ps0`, starting at 1.
    pub beta: f64,
    pub gamma: f64,
    pub omega: f64,
}

impl TrustRegionState {
    pub fn new(options: &TrustRegionOptions) -> Self {
        Self { delta: options.initial_delta, beta: 1.0, gamma: options.gamma, omega: options.omega }
    }

    pub fn radius(&self) -> f64 {
        1.0 + self.delta
    }

    pub fn is_exhausted(&self) -> bool {
        self.delta < self.omega
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Succeeded,
    Failed,
}

/// Outcome of judging one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundVerdict {
    /// The candidate meets the threshold.
    Success,
    /// The candidate improves on `beta`; the radius is kept.
    Accepted,
    /// The radius shrank and is still above `omega`.
    Rejected,
    /// The radius shrank below `omega`.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrustRegionController {
    state: TrustRegionState,
    c_lambda: f64,
    loop_state: LoopState,
}

impl TrustRegionController {
    pub fn new(c_lambda: f64, options: &TrustRegionOptions) -> Self {
        Self { state: TrustRegionState::new(options), c_lambda, loop_state: LoopState::Running }
    }

    /// Judge the oracle-evaluated candidate of a round and update the state.
    pub fn judge(&mut self, evaluated: &ParameterPoint) -> RoundVerdict {
        match self.loop_state {
            LoopState::Succeeded => return RoundVerdict::Success,
            LoopState::Failed => return RoundVerdict::Exhausted,
            LoopState::Running => {}
        }

        if evaluated.ps0 <= self.c_lambda {
            self.loop_state = LoopState::Succeeded;
            return RoundVerdict::Success;
        }
        if evaluated.ps0 <= self.state.beta {
            self.state.beta = evaluated.ps0;
            return RoundVerdict::Accepted;
        }

        self.state.delta /= self.state.gamma;
        if self.state.is_exhausted() {
            self.loop_state = LoopState::Failed;
            RoundVerdict::Exhausted
        } else {
            RoundVerdict::Rejected
        }
    }

    pub fn state(&self) -> &TrustRegionState {
        &self.state
    }

    pub fn loop_state(&self) -> LoopState {
        self.loop_state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Each verdict and its effect on delta / beta.
    // - Terminal states.
    // - Monotonicity of delta and beta over arbitrary candidate sequences.
    // -------------------------------------------------------------------------

    fn at(ps0: f64) -> ParameterPoint {
        ParameterPoint::new(0.5, 0.5, ps0, 0.5, 0.5)
    }

    #[test]
    // Purpose
    // -------
    // Accept keeps delta and lowers beta; reject divides delta by gamma.
    //
    // Given
    // -----
    // - c_lambda = 0.1, defaults delta = 2, gamma = 1.5.
    // - Candidates ps0 = 0.4 (accept), then 0.5 (reject).
    fn accept_then_reject() {
        let mut ctl = TrustRegionController::new(0.1, &TrustRegionOptions::default());

        assert_eq!(ctl.judge(&at(0.4)), RoundVerdict::Accepted);
        assert_relative_eq!(ctl.state().beta, 0.4);
        assert_relative_eq!(ctl.state().delta, 2.0);

        assert_eq!(ctl.judge(&at(0.5)), RoundVerdict::Rejected);
        assert_relative_eq!(ctl.state().beta, 0.4);
        assert_relative_eq!(ctl.state().delta, 2.0 / 1.5);
        assert_relative_eq!(ctl.state().radius(), 1.0 + 2.0 / 1.5);
        assert_eq!(ctl.loop_state(), LoopState::Running);
    }

    #[test]
    // Purpose
    // -------
    // The threshold comparison is exact and inclusive; success is terminal.
    fn success_is_inclusive_and_terminal() {
        let mut ctl = TrustRegionController::new(0.1, &TrustRegionOptions::default());

        assert_eq!(ctl.judge(&at(0.1)), RoundVerdict::Success);
        assert_eq!(ctl.loop_state(), LoopState::Succeeded);
        assert_eq!(ctl.judge(&at(0.9)), RoundVerdict::Success);
        assert_relative_eq!(ctl.state().delta, 2.0);
    }

    #[test]
    // Purpose
    // -------
    // Repeated rejections exhaust the radius after exactly the number of
    // shrinks needed to cross omega.
    //
    // Given
    // -----
    // - delta = 1, gamma = 2, omega = 0.1: 1/2, 1/4, 1/8, 1/16 < 0.1.
    fn repeated_rejection_exhausts() {
        let opts = TrustRegionOptions::new(1.0, 2.0, 0.1).unwrap();
        let mut ctl = TrustRegionController::new(0.1, &opts);
        ctl.judge(&at(0.5));

        let verdicts: Vec<_> = (0..4).map(|_| ctl.judge(&at(0.9))).collect();

        assert_eq!(
            verdicts,
            vec![
                RoundVerdict::Rejected,
                RoundVerdict::Rejected,
                RoundVerdict::Rejected,
                RoundVerdict::Exhausted
            ]
        );
        assert_eq!(ctl.loop_state(), LoopState::Failed);
        assert_eq!(ctl.judge(&at(0.0)), RoundVerdict::Exhausted);
    }

    proptest! {
        #[test]
        // Purpose
        // -------
        // Over any sequence of candidates delta and beta never increase and
        // the number of rejections is bounded by `max_rejections`.
        fn delta_and_beta_are_monotone(seq in prop::collection::vec(0.0f64..1.0, 1..80)) {
            let opts = TrustRegionOptions::default();
            let mut ctl = TrustRegionController::new(0.01, &opts);
            let mut rejections = 0;

            for ps0 in seq {
                let before = *ctl.state();
                ctl.judge(&at(ps0));
                let after = *ctl.state();

                prop_assert!(after.delta <= before.delta);
                prop_assert!(after.beta <= before.beta);
                if after.delta < before.delta {
                    rejections += 1;
                }
            }
            prop_assert!(rejections <= opts.max_rejections());
        }
    }
}
