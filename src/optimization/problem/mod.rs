//! problem — solver-independent sub-problem model.
//!
//! A sub-problem is a set of bounded variables, a quadratic objective to
//! minimize, and quadratic constraints `expr ≤ 0`. Builders in
//! [`crate::synthesis::approximation`] produce these; the solver gateway in
//! [`crate::optimization::gateway`] consumes them and returns an
//! [`Assignment`].
pub mod assignment;
pub mod expr;
pub mod spec;

pub use self::assignment::Assignment;
pub use self::expr::{LinearForm, ProductTerm, QuadExpr, SquareTerm, VarId};
pub use self::spec::{Constraint, SubproblemSpec, Variable};
