//! Result records of a refinement run.
use crate::{
    model::point::ParameterPoint,
    synthesis::{approximation::Strategy, trust_region::RoundVerdict},
};

/// How a run ended. Hard failures are [`SynthesisError`](super::SynthesisError)s instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisStatus {
    /// An evaluated candidate met `ps0 ≤ c_lambda`.
    Succeeded,
    /// The radius excess fell below `omega`; no instantiation found.
    TrustRegionExhausted,
    /// The optional round cap was hit before either of the above.
    RoundLimitReached,
}

/// One round of a refinement run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundRecord {
    /// 1-based round index.
    pub round: usize,
    /// Radius excess the sub-problem was built with.
    pub delta: f64,
    /// Sub-problem solution.
    pub candidate: ParameterPoint,
    /// `candidate` after re-evaluation by the oracle.
    pub evaluated: ParameterPoint,
    /// Total slack of the sub-problem solution.
    pub penalty: f64,
    pub verdict: RoundVerdict,
}

/// Summary of a refinement run.
///
/// - `solution` is `Some` iff `status == Succeeded`, and then equals
///   `last_evaluated`.
/// - `delta` and `beta` are the final trust-region values.
/// - `history` holds one record per round; `rounds == history.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisOutcome {
    pub strategy: Strategy,
    pub status: SynthesisStatus,
    pub solution: Option<ParameterPoint>,
    pub last_evaluated: ParameterPoint,
    pub rounds: usize,
    pub delta: f64,
    pub beta: f64,
    pub history: Vec<RoundRecord>,
}

impl SynthesisOutcome {
    pub fn is_success(&self) -> bool {
        self.status == SynthesisStatus::Succeeded
    }
}
