//! synthesis::approximation — convex sub-problems around an approximation point.
//!
//! Purpose
//! -------
//! Replace the bilinear fixed-point equations of the Knuth–Yao fragment
//!
//! ```text
//! ps0 ≥ x·ps1,   ps1 ≥ y·ps3,   ps3 ≥ x·ps1 + (1 − x)·ps7,   ps7 = 1
//! ```
//!
//! by a tractable sub-problem around an approximation point `h`, submit it to
//! a [`ConvexSolverGateway`], and read the solution back as a
//! [`ParameterPoint`] candidate.
//!
//! Key behaviors
//! -------------
//! - [`Strategy::PenaltyCcp`]: every product `u·v` is replaced by a convex
//!   surrogate chosen by [`DcForm`]. The default is the majorant
//!   `½(u+v)² + ½(h_u² + h_v²) − h_u·u − h_v·v`, which is tight at `h`;
//!   [`DcForm::Reference`] also replaces the `(1 − x)·ps7` term. Slacks
//!   `k0, k1, k3 ≥ 0` are penalized by `tau`. No trust region.
//! - [`Strategy::PenaltyScp`]: every product is replaced by its first-order
//!   Taylor expansion `h_u·v + h_v·u − h_u·h_v`, with the same slacks and a
//!   multiplicative trust box `h_v / r ≤ v ≤ h_v·r` on `ps0, ps1, ps3, x, y`.
//! - [`Strategy::IterativeLinearization`]: the Taylor form and the trust box
//!   without slacks; the sub-problem is flagged `allow_nonconvex`.
//! - The original problem keeps the exact products and is flagged
//!   `allow_nonconvex`; it backs the direct baseline.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every sub-problem carries `x, y ∈ [epsilon, 1 − epsilon]`,
//!   `ps0 ≤ c_lambda` and nonnegativity of every variable.
//! - The trust radius is `r = 1 + delta ≥ 1`. A zero component of `h`
//!   collapses its box to `{0}`.
//! - Sub-problems are rebuilt from scratch on every call; nothing is cached
//!   between rounds.
//!
//! Conventions
//! -----------
//! - Variables are declared in the order `ps0, ps1, ps3, x, y` followed by the
//!   slacks `k0, k1, k3`; slacks start at 0, the others at `h`.
//! - An infeasible or unbounded sub-problem is surfaced as
//!   [`SynthesisError::SubproblemInfeasible`] /
//!   [`SynthesisError::SubproblemUnbounded`]; the loop treats both as fatal.
use std::str::FromStr;

use crate::{
    model::point::ParameterPoint,
    optimization::{
        errors::SolveError,
        gateway::ConvexSolverGateway,
        problem::{LinearForm, QuadExpr, SubproblemSpec, VarId},
    },
    synthesis::{
        errors::{SynthesisError, SynthesisResult},
        options::{DcForm, SynthesisOptions},
    },
};

const SLACKS: [&str; 3] = ["k0", "k1", "k3"];

/// Refinement strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Penalty convex-concave procedure (DC majorant).
    PenaltyCcp,
    /// Penalty sequential convex programming (Taylor + trust box).
    PenaltyScp,
    /// Single-step linearization without slacks.
    IterativeLinearization,
}

impl Strategy {
    pub const ALL: [Strategy; 3] =
        [Strategy::PenaltyCcp, Strategy::PenaltyScp, Strategy::IterativeLinearization];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::PenaltyCcp => "penalty_ccp",
            Strategy::PenaltyScp => "penalty_scp",
            Strategy::IterativeLinearization => "linearization",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = SynthesisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ccp" | "dc" | "penalty_ccp" => Ok(Strategy::PenaltyCcp),
            "scp" | "penalty_scp" => Ok(Strategy::PenaltyScp),
            "linearization" | "lp" | "iterative_linearization" => {
                Ok(Strategy::IterativeLinearization)
            }
            _ => Err(SynthesisError::InvalidStrategy { name: s.to_string() }),
        }
    }
}

/// Solution of one sub-problem, read back as a point.
///
/// `penalty` is `k0 + k1 + k3` for the slack strategies and `0` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub point: ParameterPoint,
    pub penalty: f64,
}

/// How a bilinear product `u·v` enters a sub-problem.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Product {
    Majorant(DcForm),
    Taylor,
    Exact,
}

impl Product {
    fn expr(self, u: VarId, v: VarId, h_u: f64, h_v: f64) -> QuadExpr {
        match self {
            Product::Majorant(DcForm::Tangent) => majorant(u, v, h_u, h_v),
            Product::Majorant(DcForm::Reference) => reference_majorant(u, v, h_u, h_v),
            Product::Taylor => taylor(u, v, h_u, h_v),
            Product::Exact => QuadExpr::new().product(u, v, 1.0),
        }
    }

    /// The `(1 − x)·ps7` term of `ps3_reach` with `ps7 = 1`.
    fn exit_term(self, x: VarId, h_x: f64) -> QuadExpr {
        match self {
            Product::Majorant(DcForm::Reference) => {
                // u = 1 − x, v = ps7 = h_v = 1
                let h_u = 1.0 - h_x;
                QuadExpr::new()
                    .square(0.5, LinearForm::new(2.0).term(x, -1.0))
                    .constant(-1.5 * (h_u * h_u + 1.0) + h_u + 1.0)
                    .term(x, -h_u)
            }
            _ => QuadExpr::new().constant(1.0).term(x, -1.0),
        }
    }
}

/// `½(u+v)² + ½(h_u² + h_v²) − h_u·u − h_v·v`; exceeds `u·v` by
/// `½(u − h_u)² + ½(v − h_v)²`.
fn majorant(u: VarId, v: VarId, h_u: f64, h_v: f64) -> QuadExpr {
    QuadExpr::new()
        .square(0.5, LinearForm::new(0.0).term(u, 1.0).term(v, 1.0))
        .constant(0.5 * (h_u * h_u + h_v * h_v))
        .term(u, -h_u)
        .term(v, -h_v)
}

/// `½(u+v)² − (3/2)(h_u² + h_v²) + h_u·u + h_v·v`; differs from `u·v` by
/// `½(u − h_u)(u + 3h_u) + ½(v − h_v)(v + 3h_v)`.
fn reference_majorant(u: VarId, v: VarId, h_u: f64, h_v: f64) -> QuadExpr {
    QuadExpr::new()
        .square(0.5, LinearForm::new(0.0).term(u, 1.0).term(v, 1.0))
        .constant(-1.5 * (h_u * h_u + h_v * h_v))
        .term(u, h_u)
        .term(v, h_v)
}

fn taylor(u: VarId, v: VarId, h_u: f64, h_v: f64) -> QuadExpr {
    QuadExpr::new().term(v, h_u).term(u, h_v).constant(-h_u * h_v)
}

#[derive(Debug, Clone, Copy)]
struct Vars {
    ps0: VarId,
    ps1: VarId,
    ps3: VarId,
    x: VarId,
    y: VarId,
}

impl Vars {
    fn paired(&self, h: &ParameterPoint) -> [(&'static str, VarId, f64); 5] {
        [
            ("ps0", self.ps0, h.ps0),
            ("ps1", self.ps1, h.ps1),
            ("ps3", self.ps3, h.ps3),
            ("x", self.x, h.x),
            ("y", self.y, h.y),
        ]
    }
}

/// Builds and solves the per-round sub-problem.
#[derive(Debug, Clone)]
pub struct ApproximationStep<G> {
    gateway: G,
    c_lambda: f64,
    epsilon: f64,
    tau: f64,
    dc_form: DcForm,
}

impl<G: ConvexSolverGateway> ApproximationStep<G> {
    /// Capture the threshold, reserve, penalty weight and DC form of
    /// `options`. Options are assumed validated.
    pub fn new(gateway: G, options: &SynthesisOptions) -> Self {
        Self {
            gateway,
            c_lambda: options.c_lambda,
            epsilon: options.epsilon,
            tau: options.tau,
            dc_form: options.dc_form,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Sub-problem for `strategy` around `h`; `delta` is ignored by CCP.
    pub fn build(&self, strategy: Strategy, h: &ParameterPoint, delta: f64) -> SubproblemSpec {
        match strategy {
            Strategy::PenaltyCcp => self.build_dc(h),
            Strategy::PenaltyScp => self.build_scp(h, 1.0 + delta),
            Strategy::IterativeLinearization => self.build_linearized(h, 1.0 + delta),
        }
    }

    pub fn build_dc(&self, h: &ParameterPoint) -> SubproblemSpec {
        let product = Product::Majorant(self.dc_form);
        self.assemble(Strategy::PenaltyCcp.name(), h, product, true, None, false)
    }

    pub fn build_scp(&self, h: &ParameterPoint, radius: f64) -> SubproblemSpec {
        self.assemble(Strategy::PenaltyScp.name(), h, Product::Taylor, true, Some(radius), false)
    }

    pub fn build_linearized(&self, h: &ParameterPoint, radius: f64) -> SubproblemSpec {
        self.assemble(
            Strategy::IterativeLinearization.name(),
            h,
            Product::Taylor,
            false,
            Some(radius),
            true,
        )
    }

    /// The exact bilinear problem, started from `start`.
    pub fn build_original(&self, start: &ParameterPoint) -> SubproblemSpec {
        self.assemble("original", start, Product::Exact, false, None, true)
    }

    /// Build and solve one round of `strategy` around `h`.
    ///
    /// # Errors
    /// - [`SynthesisError::SubproblemInfeasible`] / [`SynthesisError::SubproblemUnbounded`].
    /// - [`SynthesisError::Solver`] for any other gateway failure.
    /// - [`SynthesisError::Model`] if the solution leaves the reserve box.
    pub fn step(
        &self, strategy: Strategy, h: &ParameterPoint, delta: f64,
    ) -> SynthesisResult<Candidate> {
        self.solve(&self.build(strategy, h, delta))
    }

    pub fn solve_original(&self, start: &ParameterPoint) -> SynthesisResult<Candidate> {
        self.solve(&self.build_original(start))
    }

    /// Submit `spec` and read the candidate back.
    pub fn solve(&self, spec: &SubproblemSpec) -> SynthesisResult<Candidate> {
        let assignment = self.gateway.solve(spec).map_err(|err| match err {
            SolveError::Infeasible { violation } => {
                SynthesisError::SubproblemInfeasible { subproblem: spec.name.clone(), violation }
            }
            SolveError::Unbounded => {
                SynthesisError::SubproblemUnbounded { subproblem: spec.name.clone() }
            }
            other => SynthesisError::Solver(other),
        })?;

        let point = ParameterPoint::new(
            assignment.require("x")?,
            assignment.require("y")?,
            assignment.require("ps0")?,
            assignment.require("ps1")?,
            assignment.require("ps3")?,
        );
        point.check_parameters(self.epsilon)?;
        let penalty = SLACKS.iter().filter_map(|k| assignment.value(k)).sum();
        Ok(Candidate { point, penalty })
    }

    fn assemble(
        &self, name: &str, h: &ParameterPoint, product: Product, slacks: bool,
        radius: Option<f64>, allow_nonconvex: bool,
    ) -> SubproblemSpec {
        let mut spec = SubproblemSpec::new(name);
        let vars = Vars {
            ps0: spec.add_var("ps0", h.ps0),
            ps1: spec.add_var("ps1", h.ps1),
            ps3: spec.add_var("ps3", h.ps3),
            x: spec.add_var("x", h.x),
            y: spec.add_var("y", h.y),
        };
        let k = slacks.then(|| SLACKS.map(|k| spec.add_var(k, 0.0)));

        self.add_shared(&mut spec, &vars);

        let relax = |i: usize| match k {
            Some(k) => QuadExpr::new().term(k[i], -1.0),
            None => QuadExpr::new(),
        };
        // ps0 + k0 ≥ x·ps1
        spec.add_le(
            "ps0_reach",
            QuadExpr::new().term(vars.ps0, -1.0)
                + relax(0)
                + product.expr(vars.x, vars.ps1, h.x, h.ps1),
        );
        // ps1 + k1 ≥ y·ps3
        spec.add_le(
            "ps1_reach",
            QuadExpr::new().term(vars.ps1, -1.0)
                + relax(1)
                + product.expr(vars.y, vars.ps3, h.y, h.ps3),
        );
        // ps3 + k3 ≥ x·ps1 + (1 − x)·ps7
        spec.add_le(
            "ps3_reach",
            QuadExpr::new().term(vars.ps3, -1.0)
                + product.exit_term(vars.x, h.x)
                + relax(2)
                + product.expr(vars.x, vars.ps1, h.x, h.ps1),
        );

        if let Some(r) = radius {
            for (label, var, h_v) in vars.paired(h) {
                spec.add_le(
                    format!("{label}_trust_lower"),
                    QuadExpr::new().constant(h_v / r).term(var, -1.0),
                );
                spec.add_le(
                    format!("{label}_trust_upper"),
                    QuadExpr::new().term(var, 1.0).constant(-h_v * r),
                );
            }
        }

        let mut objective = QuadExpr::new().term(vars.ps0, 1.0);
        if let Some(k) = k {
            for slack in k {
                objective = objective.term(slack, self.tau);
            }
        }
        spec.minimize(objective);
        spec.set_allow_nonconvex(allow_nonconvex);
        spec
    }

    fn add_shared(&self, spec: &mut SubproblemSpec, vars: &Vars) {
        let eps = self.epsilon;
        for (label, var) in [("x", vars.x), ("y", vars.y)] {
            spec.add_le(
                format!("{label}_reserve_lower"),
                QuadExpr::new().constant(eps).term(var, -1.0),
            );
            spec.add_le(
                format!("{label}_reserve_upper"),
                QuadExpr::new().term(var, 1.0).constant(-(1.0 - eps)),
            );
        }
        spec.add_le("threshold", QuadExpr::new().term(vars.ps0, 1.0).constant(-self.c_lambda));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    // Named import: proptest's prelude also exports a `Strategy`.
    use super::Strategy;
    use crate::optimization::{
        errors::SolveResult, gateway::DefaultGateway, problem::Assignment, types::Theta,
    };
    use approx::assert_relative_eq;
    use ndarray::array;
    use proptest::prelude::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The majorant and Taylor product models (tightness, domination).
    // - Shape and convexity of each sub-problem.
    // - Solving DC and original sub-problems through the default gateway.
    // - Mapping of infeasible and unbounded gateway results.
    //
    // Out of scope: trust-region bookkeeping (see `trust_region`).
    // -------------------------------------------------------------------------

    fn start() -> ParameterPoint {
        ParameterPoint::new(0.4, 0.8, 0.01, 0.3, 0.9)
    }

    fn step(c_lambda: f64) -> ApproximationStep<DefaultGateway> {
        let opts = SynthesisOptions { c_lambda, ..SynthesisOptions::default() };
        ApproximationStep::new(DefaultGateway::default(), &opts)
    }

    struct Refusing(SolveError);

    impl ConvexSolverGateway for Refusing {
        fn solve(&self, _spec: &SubproblemSpec) -> SolveResult<Assignment> {
            Err(self.0.clone())
        }
    }

    proptest! {
        #[test]
        // Purpose
        // -------
        // The majorant dominates u·v everywhere with the exact gap
        // ½(u − h_u)² + ½(v − h_v)², so it is tight at h.
        fn majorant_dominates_product(
            u in 0.0f64..2.0, v in 0.0f64..2.0, hu in 0.0f64..2.0, hv in 0.0f64..2.0,
        ) {
            let expr = majorant(VarId(0), VarId(1), hu, hv);
            let z: Theta = array![u, v];

            let gap = expr.value(&z) - u * v;

            prop_assert!(gap >= -1e-12);
            prop_assert!((gap - 0.5 * ((u - hu).powi(2) + (v - hv).powi(2))).abs() < 1e-9);
        }

        #[test]
        // Purpose
        // -------
        // The reference surrogate matches u·v at h and differs elsewhere by
        // ½(u − h_u)(u + 3h_u) + ½(v − h_v)(v + 3h_v).
        fn reference_surrogate_gap_is_exact(
            u in 0.0f64..2.0, v in 0.0f64..2.0, hu in 0.0f64..2.0, hv in 0.0f64..2.0,
        ) {
            let expr = reference_majorant(VarId(0), VarId(1), hu, hv);

            let gap = expr.value(&array![u, v]) - u * v;
            let at_h = expr.value(&array![hu, hv]) - hu * hv;

            prop_assert!(at_h.abs() < 1e-9);
            let expected = 0.5 * (u - hu) * (u + 3.0 * hu) + 0.5 * (v - hv) * (v + 3.0 * hv);
            prop_assert!((gap - expected).abs() < 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // The Taylor form agrees with u·v at h and is linear.
    fn taylor_is_tight_and_linear() {
        let expr = taylor(VarId(0), VarId(1), 0.4, 0.3);

        assert_relative_eq!(expr.value(&array![0.4, 0.3]), 0.12, epsilon = 1e-15);
        assert!(expr.is_linear());
    }

    #[test]
    // Purpose
    // -------
    // Each strategy produces the expected variables and constraint count.
    //
    // Expect
    // ------
    // - Shared: 4 reserve bounds + threshold; 3 reachability constraints.
    // - SCP/linearization add 2 trust bounds for each of 5 variables.
    // - Only CCP/SCP carry the 3 slacks.
    fn sub_problems_have_expected_shape() {
        let step = step(0.15);
        let h = start();

        let dc = step.build_dc(&h);
        let scp = step.build_scp(&h, 3.0);
        let lin = step.build_linearized(&h, 3.0);
        let orig = step.build_original(&h);

        assert_eq!((dc.n_vars(), dc.constraints().len()), (8, 8));
        assert_eq!((scp.n_vars(), scp.constraints().len()), (8, 18));
        assert_eq!((lin.n_vars(), lin.constraints().len()), (5, 18));
        assert_eq!((orig.n_vars(), orig.constraints().len()), (5, 8));
        assert!(dc.is_convex() && scp.is_convex() && lin.is_convex());
        assert!(!orig.is_convex() && orig.allow_nonconvex());
        assert_eq!(step.build(Strategy::PenaltyScp, &h, 2.0), scp);
    }

    #[test]
    // Purpose
    // -------
    // At c = 3/20 the DC sub-problem from the reference point has a solution
    // inside the reserve box and below the threshold.
    fn dc_step_solves_within_bounds() {
        let cand = step(0.15).step(Strategy::PenaltyCcp, &start(), 0.0).expect("DC is feasible");

        assert!(cand.point.ps0 <= 0.15 + 1e-6);
        assert!(cand.point.check_parameters(1e-4).is_ok());
        assert!(cand.penalty >= -1e-9);
    }

    #[test]
    // Purpose
    // -------
    // The reference DC form also surrogates the (1 − x)·ps7 term and still
    // yields a solvable convex sub-problem.
    //
    // Expect
    // ------
    // - Both forms agree on every constraint at h, since both are tight there.
    // - Away from h in x alone, ps3_reach differs between the forms.
    // - The reference step solves within the reserve box.
    fn reference_dc_form_changes_exit_term_only() {
        let h = start();
        let tangent = step(0.15);
        let reference = ApproximationStep::new(
            DefaultGateway::default(),
            &SynthesisOptions::default().with_dc_form(DcForm::Reference),
        );

        let t = tangent.build_dc(&h);
        let r = reference.build_dc(&h);

        assert_eq!(t.constraints().len(), r.constraints().len());
        assert!(r.is_convex());
        let at_h: Theta = array![h.ps0, h.ps1, h.ps3, h.x, h.y, 0.0, 0.0, 0.0];
        for (ct, cr) in t.constraints().iter().zip(r.constraints()) {
            assert_eq!(ct.name, cr.name);
            assert_relative_eq!(ct.expr.value(&at_h), cr.expr.value(&at_h), epsilon = 1e-12);
        }
        let moved: Theta = array![h.ps0, h.ps1, h.ps3, 0.1, h.y, 0.0, 0.0, 0.0];
        let reach = |spec: &SubproblemSpec| {
            let c = spec.constraints().iter().find(|c| c.name == "ps3_reach").unwrap();
            c.expr.value(&moved)
        };
        assert!((reach(&t) - reach(&r)).abs() > 1e-3);
        let cand = reference.step(Strategy::PenaltyCcp, &h, 0.0).expect("reference DC solves");
        assert!(cand.point.check_parameters(1e-4).is_ok());
        assert!(cand.point.ps0 <= 0.15 + 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // The exact bilinear problem is solved locally and satisfies the
    // reachability constraints.
    fn original_problem_is_feasible() {
        let cand = step(0.15).solve_original(&start()).expect("original is feasible");
        let p = cand.point;

        assert!(p.ps0 <= 0.15 + 1e-6);
        assert!(p.ps0 >= p.x * p.ps1 - 1e-5);
        assert!(p.ps1 >= p.y * p.ps3 - 1e-5);
        assert!(p.ps3 >= p.x * p.ps1 + 1.0 - p.x - 1e-5);
        assert_eq!(cand.penalty, 0.0);
    }

    #[test]
    // Purpose
    // -------
    // A trust box around ps0 = 0.5 with r = 1.01 cannot reach ps0 ≤ 0.15.
    //
    // Expect
    // ------
    // - `SubproblemInfeasible` naming the SCP sub-problem.
    fn trust_box_above_threshold_is_infeasible() {
        let h = ParameterPoint::new(0.5, 0.5, 0.5, 0.5, 0.5);

        let err = step(0.15).step(Strategy::PenaltyScp, &h, 0.01).expect_err("box excludes c");

        match err {
            SynthesisError::SubproblemInfeasible { subproblem, violation } => {
                assert_eq!(subproblem, "penalty_scp");
                assert!(violation > 0.0);
            }
            other => panic!("expected SubproblemInfeasible, got {other:?}"),
        }
    }

    #[test]
    fn gateway_failures_are_mapped() {
        let opts = SynthesisOptions::default();
        let unbounded = ApproximationStep::new(Refusing(SolveError::Unbounded), &opts);
        let broken = ApproximationStep::new(
            Refusing(SolveError::NewtonBreakdown { text: "singular".into() }),
            &opts,
        );

        assert_eq!(
            unbounded.step(Strategy::PenaltyCcp, &start(), 1.0),
            Err(SynthesisError::SubproblemUnbounded { subproblem: "penalty_ccp".into() })
        );
        assert!(matches!(
            broken.step(Strategy::PenaltyCcp, &start(), 1.0),
            Err(SynthesisError::Solver(SolveError::NewtonBreakdown { .. }))
        ));
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("CCP".parse::<Strategy>(), Ok(Strategy::PenaltyCcp));
        assert_eq!("dc".parse::<Strategy>(), Ok(Strategy::PenaltyCcp));
        assert_eq!("Scp".parse::<Strategy>(), Ok(Strategy::PenaltyScp));
        assert_eq!("LP".parse::<Strategy>(), Ok(Strategy::IterativeLinearization));
        assert!(matches!(
            "newton".parse::<Strategy>(),
            Err(SynthesisError::InvalidStrategy { .. })
        ));
        assert_eq!(Strategy::PenaltyScp.to_string(), "penalty_scp");
    }
}
