//! Configuration of a synthesis run.
//!
//! - [`TrustRegionOptions`]: initial radius excess and the shrink/stop policy.
//! - [`SynthesisOptions`]: threshold, graph-preserving reserve, penalty
//!   weight, trust region, reject policy, DC form and the round cap.
//! - [`DcForm`]: which convex surrogate CCP uses for a product.
//!
//! Both follow the same pattern: a validating `new` returning
//! [`SynthesisResult`], a `Default` with the reference values, and
//! `validate` for values assembled with struct-update syntax.
use crate::{
    model::point::validate_epsilon,
    synthesis::errors::{SynthesisError, SynthesisResult},
};

/// Trust-region policy.
///
/// - `initial_delta`: starting radius excess; the multiplicative box passed
///   to a sub-problem is `1 + delta`.
/// - `gamma`: shrink factor applied to `delta` on every rejected round (> 1).
/// - `omega`: the run fails once `delta < omega` (> 0).
///
/// Default: `initial_delta = 2`, `gamma = 1.5`, `omega = 1e-3`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrustRegionOptions {
    pub initial_delta: f64,
    pub gamma: f64,
    pub omega: f64,
}

impl TrustRegionOptions {
    /// # Errors
    /// [`SynthesisError::InvalidOption`] naming the first invalid field.
    pub fn new(initial_delta: f64, gamma: f64, omega: f64) -> SynthesisResult<Self> {
        let opts = Self { initial_delta, gamma, omega };
        opts.validate()?;
        Ok(opts)
    }

    pub fn validate(&self) -> SynthesisResult<()> {
        verify_positive("initial_delta", self.initial_delta)?;
        verify_positive("omega", self.omega)?;
        if !(self.gamma.is_finite() && self.gamma > 1.0) {
            return Err(SynthesisError::InvalidOption {
                name: "gamma",
                value: self.gamma,
                reason: "Shrink factor must be finite and greater than 1.",
            });
        }
        Ok(())
    }

    /// Upper bound on the number of rejected rounds before `delta < omega`:
    /// `⌈log(initial_delta / omega) / log(gamma)⌉`, plus one for the round
    /// that crosses the cutoff.
    pub fn max_rejections(&self) -> usize {
        let ratio = (self.initial_delta / self.omega).ln() / self.gamma.ln();
        ratio.max(0.0).ceil() as usize + 1
    }
}

impl Default for TrustRegionOptions {
    fn default() -> Self {
        Self { initial_delta: 2.0, gamma: 1.5, omega: 1e-3 }
    }
}

/// Convex surrogate of a product `u·v` in the CCP sub-problem.
///
/// - `Tangent`: `½(u+v)² + ½(h_u² + h_v²) − h_u·u − h_v·v`, an upper bound of
///   `u·v` that touches it at `h`. The constant term `(1 − x)·ps7` stays exact.
/// - `Reference`: `½(u+v)² − (3/2)(h_u² + h_v²) + h_u·u + h_v·v`, applied to
///   every product including `(1 − x)·ps7`. This reproduces the reference
///   CCP runs. It matches `u·v` at `h` but falls below it when `u < h_u` or
///   `v < h_v`, so a candidate may understate its own `ps0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DcForm {
    #[default]
    Tangent,
    Reference,
}

/// Options of a refinement run.
///
/// - `c_lambda`: success threshold on `ps0`, in `(0, 1]`.
/// - `epsilon`: graph-preserving reserve, `x, y ∈ [epsilon, 1 − epsilon]`.
/// - `tau`: penalty weight on the slack variables of CCP and SCP.
/// - `trust_region`: see [`TrustRegionOptions`].
/// - `advance_on_reject`: after a rejected round, linearize around the
///   rejected (oracle-evaluated) candidate when `true`, or around the last
///   accepted point when `false`.
/// - `dc_form`: CCP surrogate, see [`DcForm`].
/// - `max_rounds`: optional hard cap on the number of rounds.
///
/// Default: `c_lambda = 3/20`, `epsilon = 1e-4`, `tau = 1e6`,
/// `advance_on_reject = true`, `dc_form = Tangent`, `max_rounds = Some(1000)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisOptions {
    pub c_lambda: f64,
    pub epsilon: f64,
    pub tau: f64,
    pub trust_region: TrustRegionOptions,
    pub advance_on_reject: bool,
    pub dc_form: DcForm,
    pub max_rounds: Option<usize>,
}

impl SynthesisOptions {
    /// Construct options with the default reject policy and round cap.
    ///
    /// # Errors
    /// - [`SynthesisError::InvalidOption`] for an out-of-range threshold,
    ///   penalty weight or trust-region field.
    /// - [`SynthesisError::Model`] for an invalid `epsilon`.
    pub fn new(
        c_lambda: f64, epsilon: f64, tau: f64, trust_region: TrustRegionOptions,
    ) -> SynthesisResult<Self> {
        let opts = Self { c_lambda, epsilon, tau, trust_region, ..Self::default() };
        opts.validate()?;
        Ok(opts)
    }

    pub fn with_advance_on_reject(mut self, advance: bool) -> Self {
        self.advance_on_reject = advance;
        self
    }

    pub fn with_dc_form(mut self, dc_form: DcForm) -> Self {
        self.dc_form = dc_form;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: Option<usize>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn validate(&self) -> SynthesisResult<()> {
        if !(self.c_lambda.is_finite() && self.c_lambda > 0.0 && self.c_lambda <= 1.0) {
            return Err(SynthesisError::InvalidOption {
                name: "c_lambda",
                value: self.c_lambda,
                reason: "Threshold must lie in (0, 1].",
            });
        }
        validate_epsilon(self.epsilon)?;
        verify_positive("tau", self.tau)?;
        self.trust_region.validate()?;
        if self.max_rounds == Some(0) {
            return Err(SynthesisError::InvalidOption {
                name: "max_rounds",
                value: 0.0,
                reason: "Round cap must be greater than zero.",
            });
        }
        Ok(())
    }
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            c_lambda: 3.0 / 20.0,
            epsilon: 1e-4,
            tau: 1e6,
            trust_region: TrustRegionOptions::default(),
            advance_on_reject: true,
            dc_form: DcForm::Tangent,
            max_rounds: Some(1000),
        }
    }
}

fn verify_positive(name: &'static str, value: f64) -> SynthesisResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SynthesisError::InvalidOption {
            name,
            value,
            reason: "Value must be finite and positive.",
        });
    }
    Ok(())
}
