//! model::topology — sparse description of the parametric chain.
//!
//! Purpose
//! -------
//! Describe the transient part of an absorbing parametric Markov chain as an
//! explicit coefficient list instead of inline arithmetic, so the closed-form
//! oracle can assemble `(I − A) p = b` for any small topology whose weights
//! are affine in the two design parameters.
//!
//! Key behaviors
//! -------------
//! - [`AffineParam`] encodes a weight `c + a·x + b·y`.
//! - [`ChainTopology`] stores labelled transient states, transitions between
//!   them, and the one-step contribution of absorbing target states.
//! - [`ChainTopology::knuth_yao`] returns the fixed three-state fragment used
//!   by the synthesis loop:
//!
//!   ```text
//!   ps0 = x·ps1
//!   ps1 = y·ps3
//!   ps3 = x·ps1 + (1 − x)·ps7,   ps7 = 1
//!   ```
//!
//! Invariants & assumptions
//! ------------------------
//! - State indices are validated on construction; `assemble` never indexes
//!   out of bounds.
//! - Duplicate `(from, to)` transitions are summed.
use nalgebra::{DMatrix, DVector};

use crate::model::errors::{ModelError, ModelResult};

/// A weight affine in the design parameters: `constant + x_coeff·x + y_coeff·y`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineParam {
    pub constant: f64,
    pub x_coeff: f64,
    pub y_coeff: f64,
}

impl AffineParam {
    pub const fn new(constant: f64, x_coeff: f64, y_coeff: f64) -> Self {
        Self { constant, x_coeff, y_coeff }
    }

    /// The weight `x`.
    pub const fn x() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// The weight `y`.
    pub const fn y() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }

    /// The weight `1 − x`.
    pub const fn one_minus_x() -> Self {
        Self::new(1.0, -1.0, 0.0)
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        self.constant + self.x_coeff * x + self.y_coeff * y
    }
}

/// Transition between two transient states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub from: usize,
    pub to: usize,
    pub weight: AffineParam,
}

/// Labelled transient states plus sparse transition and absorption lists.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTopology {
    labels: Vec<String>,
    transitions: Vec<Transition>,
    absorbing: Vec<(usize, AffineParam)>,
}

impl ChainTopology {
    /// Build a validated topology.
    ///
    /// # Errors
    /// - [`ModelError::EmptyTopology`] when `labels` is empty.
    /// - [`ModelError::StateOutOfRange`] when any transition or absorption
    ///   entry references a state `≥ labels.len()`.
    pub fn new(
        labels: Vec<String>, transitions: Vec<Transition>, absorbing: Vec<(usize, AffineParam)>,
    ) -> ModelResult<Self> {
        let n_states = labels.len();
        if n_states == 0 {
            return Err(ModelError::EmptyTopology);
        }
        let states = transitions
            .iter()
            .flat_map(|t| [t.from, t.to])
            .chain(absorbing.iter().map(|(s, _)| *s));
        for state in states {
            if state >= n_states {
                return Err(ModelError::StateOutOfRange { state, n_states });
            }
        }
        Ok(Self { labels, transitions, absorbing })
    }

    /// The Knuth–Yao die fragment over `(ps0, ps1, ps3)`.
    pub fn knuth_yao() -> Self {
        Self {
            labels: vec!["ps0".to_string(), "ps1".to_string(), "ps3".to_string()],
            transitions: vec![
                Transition { from: 0, to: 1, weight: AffineParam::x() },
                Transition { from: 1, to: 2, weight: AffineParam::y() },
                Transition { from: 2, to: 1, weight: AffineParam::x() },
            ],
            absorbing: vec![(2, AffineParam::one_minus_x())],
        }
    }

    pub fn n_states(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Position of the state labelled `name`.
    ///
    /// # Errors
    /// [`ModelError::UnknownQuantity`] if no state carries that label.
    pub fn index_of(&self, name: &str) -> ModelResult<usize> {
        self.labels
            .iter()
            .position(|label| label == name)
            .ok_or_else(|| ModelError::UnknownQuantity { name: name.to_string() })
    }

    /// Assemble `(I − A, b)` at the parameter values `(x, y)`.
    pub fn assemble(&self, x: f64, y: f64) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.n_states();
        let mut lhs = DMatrix::<f64>::identity(n, n);
        for t in &self.transitions {
            lhs[(t.from, t.to)] -= t.weight.eval(x, y);
        }
        let mut rhs = DVector::<f64>::zeros(n);
        for (state, weight) in &self.absorbing {
            rhs[*state] += weight.eval(x, y);
        }
        (lhs, rhs)
    }
}
