//! pmc_synthesis — parameter synthesis for parametric Markov chains.
//!
//! Purpose
//! -------
//! Find parameter values of a parametric Markov chain under which a
//! reachability probability stays below a threshold. The bilinear
//! fixed-point equations of the chain are approximated by convex
//! sub-problems, each candidate is re-evaluated against the exact chain, and
//! a trust region controls how far successive approximations may move.
//!
//! Key behaviors
//! -------------
//! - [`model`]: the fixed-shape [`ParameterPoint`](model::ParameterPoint)
//!   and the sparse [`ChainTopology`](model::ChainTopology) of the
//!   Knuth–Yao die fragment.
//! - [`oracle`]: ground-truth evaluation, in closed form or through an
//!   external model checker.
//! - [`optimization`]: the sub-problem model and its solver back ends
//!   (log-barrier interior point, augmented Lagrangian over argmin L-BFGS).
//! - [`synthesis`]: the CCP, SCP and linearization refinement loops, the
//!   direct baseline and the fixed-round linearization.
//!
//! Invariants & assumptions
//! ------------------------
//! - Accepted points keep `x, y ∈ [epsilon, 1 − epsilon]` so the chain graph
//!   is preserved.
//! - Runs are single-threaded and deterministic given their options.
//!
//! Conventions
//! -----------
//! - Each layer has its own error enum and `XxxResult<T>` alias; higher
//!   layers wrap lower ones through `From`.
//! - The library logs through `tracing` and never prints; installing a
//!   subscriber is left to binaries.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end scenarios and the
//!   external-oracle round trip live under `tests/`.

pub mod model;
pub mod optimization;
pub mod oracle;
pub mod synthesis;

pub mod prelude {
    pub use crate::model::{ChainTopology, ParameterPoint};
    pub use crate::optimization::prelude::*;
    pub use crate::oracle::{ClosedFormOracle, ExternalOracle, ExternalOracleConfig, ValueOracle};
    pub use crate::synthesis::{
        synthesize, RefinementLoop, Strategy, SynthesisError, SynthesisOptions, SynthesisOutcome,
        SynthesisResult, SynthesisStatus, TrustRegionOptions,
    };
}
