//! optimization — sub-problem model, solver back ends, and error surface.
//!
//! Purpose
//! -------
//! Turn a declarative sub-problem (variables with bounds, quadratic
//! constraints `expr ≤ 0`, a quadratic objective) into an optimal or best
//! found assignment, without the synthesis layer knowing which numerical
//! method ran.
//!
//! Key behaviors
//! -------------
//! - [`problem`] holds the expression model and [`problem::SubproblemSpec`].
//! - [`barrier`] solves convex sub-problems with a log-barrier
//!   interior-point method (phase I + central path).
//! - [`penalty`] solves nonconvex sub-problems locally with an augmented
//!   Lagrangian driven by argmin's L-BFGS.
//! - [`gateway`] dispatches between the two on syntactic convexity.
//! - All failures are normalized into [`errors::SolveError`] with the alias
//!   [`errors::SolveResult`], including argmin backend errors.
//!
//! Invariants & assumptions
//! ------------------------
//! - Convexity is decided syntactically: bilinear products and negative
//!   square weights are nonconvex, everything else is convex.
//! - Sub-problems are small (≤ 8 variables); all linear algebra is dense.
//!
//! Conventions
//! -----------
//! - Decision vectors, gradients and Hessians use the `ndarray` aliases in
//!   [`types`]; `nalgebra` is used only inside the Newton solve.
//! - Solvers log at `trace` level through `tracing`; they never print.
//!
//! Testing notes
//! -------------
//! - Each back end is unit tested on small problems with known optima; the
//!   gateway tests cover routing only.
pub mod barrier;
pub mod errors;
pub mod gateway;
pub mod penalty;
pub mod problem;
pub mod types;
pub mod validation;

pub mod prelude {
    pub use super::barrier::{BarrierOptions, InteriorPointSolver};
    pub use super::errors::{SolveError, SolveResult};
    pub use super::gateway::{ConvexSolverGateway, DefaultGateway};
    pub use super::penalty::{LineSearcher, PenaltyOptions, PenaltySolver, Tolerances};
    pub use super::problem::{Assignment, LinearForm, QuadExpr, SubproblemSpec, VarId};
}
