//! oracle — ground-truth evaluation of candidate parameter points.
//!
//! Purpose
//! -------
//! Re-evaluate the probabilities implied by a candidate `(x, y)`
//! independently of the convex approximation that produced it.
//!
//! Key behaviors
//! -------------
//! - [`ValueOracle`] is the seam consumed by the refinement loop.
//! - [`ClosedFormOracle`] solves `(I − A) p = b` over a sparse
//!   [`ChainTopology`](crate::model::topology::ChainTopology).
//! - [`ExternalOracle`] stages the instantiated model in a temporary
//!   directory and asks an external model checker, one quantity at a time.
//!
//! Conventions
//! -----------
//! - Both implementations are interchangeable for the Knuth–Yao topology and
//!   return the input point with `ps0, ps1, ps3` replaced.
//! - All failures surface as [`OracleError`]; the loop treats them as fatal.

pub mod closed_form;
pub mod errors;
pub mod external;
pub mod traits;

pub use self::closed_form::ClosedFormOracle;
pub use self::errors::{OracleError, OracleResult};
pub use self::external::{ExternalOracle, ExternalOracleConfig, QuantityModel};
pub use self::traits::ValueOracle;
