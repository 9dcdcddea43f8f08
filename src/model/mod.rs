//! model — parameter points and the parametric chain they instantiate.
//!
//! Purpose
//! -------
//! Provide the data types shared by every other layer: the fixed-shape
//! [`ParameterPoint`] record threaded through refinement rounds and the
//! sparse [`ChainTopology`] that the closed-form oracle solves.
//!
//! Conventions
//! -----------
//! - Probability quantities are named after the chain states they belong to
//!   (`ps0`, `ps1`, `ps3`); `ps7 = 1` is the absorbing target and never a
//!   variable.
//! - Fallible constructors and checks return [`ModelResult`].

pub mod errors;
pub mod point;
pub mod topology;

pub use self::errors::{ModelError, ModelResult};
pub use self::point::ParameterPoint;
pub use self::topology::{AffineParam, ChainTopology, Transition};
