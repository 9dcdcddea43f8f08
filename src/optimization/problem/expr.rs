//! problem::expr — quadratic expressions over sub-problem variables.
//!
//! Purpose
//! -------
//! Represent the objective and constraint functions of a sub-problem in a
//! form that is both easy to build (builder-style methods) and easy to
//! classify: a [`QuadExpr`] keeps convex square terms and bilinear products
//! apart, so convexity is a syntactic check rather than an eigenvalue test.
//!
//! Key behaviors
//! -------------
//! - `value`, `gradient` and `accumulate_hessian` evaluate the expression
//!   exactly (the Hessian is constant).
//! - [`QuadExpr::is_convex`] holds iff there are no bilinear products and
//!   every square term has a nonnegative weight.
//!
//! Invariants & assumptions
//! ------------------------
//! - Variable references are only meaningful relative to the
//!   [`SubproblemSpec`](super::SubproblemSpec) that issued them; range
//!   checks happen in `SubproblemSpec::validate`.
//! - Repeated terms on the same variable are allowed and simply add up.
use std::ops::Add;

use crate::optimization::types::{Grad, Hessian, Theta};

/// Handle of a declared variable (its position in the decision vector).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Affine form `constant + Σ coeff·z`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinearForm {
    pub constant: f64,
    pub terms: Vec<(VarId, f64)>,
}

impl LinearForm {
    pub fn new(constant: f64) -> Self {
        Self { constant, terms: Vec::new() }
    }

    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.terms.push((var, coeff));
        self
    }

    pub fn eval(&self, z: &Theta) -> f64 {
        self.terms.iter().fold(self.constant, |acc, &(v, c)| acc + c * z[v.0])
    }
}

/// `weight · form(z)²`; convex whenever `weight ≥ 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareTerm {
    pub weight: f64,
    pub form: LinearForm,
}

/// `coeff · z_left · z_right`; never treated as convex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductTerm {
    pub left: VarId,
    pub right: VarId,
    pub coeff: f64,
}

/// Quadratic expression `c + Σ aᵢ zᵢ + Σ wₖ (ℓₖ(z))² + Σ cⱼ z_u z_v`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuadExpr {
    pub constant: f64,
    pub linear: Vec<(VarId, f64)>,
    pub squares: Vec<SquareTerm>,
    pub products: Vec<ProductTerm>,
}

impl QuadExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `c` to the constant part.
    pub fn constant(mut self, c: f64) -> Self {
        self.constant += c;
        self
    }

    pub fn term(mut self, var: VarId, coeff: f64) -> Self {
        self.linear.push((var, coeff));
        self
    }

    pub fn square(mut self, weight: f64, form: LinearForm) -> Self {
        self.squares.push(SquareTerm { weight, form });
        self
    }

    pub fn product(mut self, left: VarId, right: VarId, coeff: f64) -> Self {
        self.products.push(ProductTerm { left, right, coeff });
        self
    }

    pub fn is_convex(&self) -> bool {
        self.products.is_empty() && self.squares.iter().all(|s| s.weight >= 0.0)
    }

    pub fn is_linear(&self) -> bool {
        self.products.is_empty() && self.squares.is_empty()
    }

    /// Every variable referenced anywhere in the expression.
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        self.linear
            .iter()
            .map(|&(v, _)| v)
            .chain(self.squares.iter().flat_map(|s| s.form.terms.iter().map(|&(v, _)| v)))
            .chain(self.products.iter().flat_map(|p| [p.left, p.right]))
    }

    /// Every coefficient stored in the expression, for finiteness checks.
    pub fn coefficients(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.constant)
            .chain(self.linear.iter().map(|&(_, c)| c))
            .chain(self.squares.iter().flat_map(|s| {
                std::iter::once(s.weight)
                    .chain(std::iter::once(s.form.constant))
                    .chain(s.form.terms.iter().map(|&(_, c)| c))
            }))
            .chain(self.products.iter().map(|p| p.coeff))
    }

    pub fn value(&self, z: &Theta) -> f64 {
        let linear = self.linear.iter().fold(self.constant, |acc, &(v, c)| acc + c * z[v.0]);
        let squares = self.squares.iter().fold(0.0, |acc, s| {
            let r = s.form.eval(z);
            acc + s.weight * r * r
        });
        let products =
            self.products.iter().fold(0.0, |acc, p| acc + p.coeff * z[p.left.0] * z[p.right.0]);
        linear + squares + products
    }

    /// Add `scale · ∇expr(z)` into `grad`.
    pub fn accumulate_gradient(&self, z: &Theta, scale: f64, grad: &mut Grad) {
        for &(v, c) in &self.linear {
            grad[v.0] += scale * c;
        }
        for s in &self.squares {
            let r = 2.0 * s.weight * s.form.eval(z);
            for &(v, c) in &s.form.terms {
                grad[v.0] += scale * r * c;
            }
        }
        for p in &self.products {
            grad[p.left.0] += scale * p.coeff * z[p.right.0];
            grad[p.right.0] += scale * p.coeff * z[p.left.0];
        }
    }

    pub fn gradient(&self, z: &Theta) -> Grad {
        let mut grad = Grad::zeros(z.len());
        self.accumulate_gradient(z, 1.0, &mut grad);
        grad
    }

    /// Add `scale · ∇²expr` into `hess`.
    pub fn accumulate_hessian(&self, scale: f64, hess: &mut Hessian) {
        for s in &self.squares {
            for &(a, ca) in &s.form.terms {
                for &(b, cb) in &s.form.terms {
                    hess[[a.0, b.0]] += scale * 2.0 * s.weight * ca * cb;
                }
            }
        }
        for p in &self.products {
            hess[[p.left.0, p.right.0]] += scale * p.coeff;
            hess[[p.right.0, p.left.0]] += scale * p.coeff;
        }
    }
}

impl Add for QuadExpr {
    type Output = QuadExpr;

    fn add(mut self, rhs: QuadExpr) -> QuadExpr {
        self.constant += rhs.constant;
        self.linear.extend(rhs.linear);
        self.squares.extend(rhs.squares);
        self.products.extend(rhs.products);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use finitediff::FiniteDiff;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact value, gradient and Hessian of a mixed expression, with the
    //   gradient cross-checked by central differences.
    // - Syntactic convexity classification.
    // -------------------------------------------------------------------------

    fn mixed() -> QuadExpr {
        // 1 + 2a − b + 0.5·(a + b − 1)² + 3·a·c
        QuadExpr::new()
            .constant(1.0)
            .term(VarId(0), 2.0)
            .term(VarId(1), -1.0)
            .square(0.5, LinearForm::new(-1.0).term(VarId(0), 1.0).term(VarId(1), 1.0))
            .product(VarId(0), VarId(2), 3.0)
    }

    #[test]
    // Purpose
    // -------
    // The analytic value and gradient match a hand computation and central
    // finite differences.
    //
    // Given
    // -----
    // - z = (0.3, 0.4, 2.0): a + b − 1 = −0.3.
    //
    // Expect
    // ------
    // - value = 1 + 0.6 − 0.4 + 0.045 + 1.8 = 3.045.
    // - gradient within 1e-6 of finite differences.
    fn value_and_gradient_match_finite_differences() {
        // Arrange
        let expr = mixed();
        let z = array![0.3, 0.4, 2.0];

        // Act
        let value = expr.value(&z);
        let grad = expr.gradient(&z);
        let fd = z.central_diff(&|p: &Theta| expr.value(p));

        // Assert
        assert_relative_eq!(value, 3.045, epsilon = 1e-12);
        for i in 0..3 {
            assert_relative_eq!(grad[i], fd[i], epsilon = 1e-6);
        }
    }

    #[test]
    // Purpose
    // -------
    // The Hessian is symmetric and holds square and product contributions.
    fn hessian_collects_square_and_product_terms() {
        let mut hess = Hessian::zeros((3, 3));

        mixed().accumulate_hessian(1.0, &mut hess);

        assert_relative_eq!(hess[[0, 0]], 1.0);
        assert_relative_eq!(hess[[0, 1]], 1.0);
        assert_relative_eq!(hess[[1, 1]], 1.0);
        assert_relative_eq!(hess[[0, 2]], 3.0);
        assert_relative_eq!(hess[[2, 0]], 3.0);
        assert_relative_eq!(hess[[2, 2]], 0.0);
    }

    #[test]
    fn convexity_is_syntactic() {
        let convex = QuadExpr::new().square(1.0, LinearForm::new(0.0).term(VarId(0), 1.0));
        let concave = QuadExpr::new().square(-1.0, LinearForm::new(0.0).term(VarId(0), 1.0));

        assert!(convex.is_convex());
        assert!(!concave.is_convex());
        assert!(!mixed().is_convex());
        assert!(QuadExpr::new().term(VarId(0), 1.0).is_linear());
    }

    #[test]
    fn sum_concatenates_terms() {
        let z = array![0.3, 0.4, 2.0];
        let rhs = QuadExpr::new().constant(2.0).term(VarId(2), -1.0);

        let sum = mixed() + rhs.clone();

        assert_relative_eq!(sum.value(&z), mixed().value(&z) + rhs.value(&z), epsilon = 1e-12);
        assert!(!sum.is_linear());
    }
}
