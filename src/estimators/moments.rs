//! Per-individual sufficient statistics for the AR(1) regression.
//!
//! Purpose
//! -------
//! Every estimator in the battery only needs the cross-products of the
//! design `w_t = (1, y_{t-1})'` and the outcome `y_t`. This module computes
//! them once per individual so that OLS, fixed effects, REML and
//! empirical Bayes never touch the raw series again.
//!
//! Key behaviors
//! -------------
//! - [`IndividualMoments`] stores `n`, `W'W`, `W'y` and `y'y`.
//! - Moments are additive: pooling is [`IndividualMoments::accumulate`].
//! - [`solve_spd`] / [`inverse_spd`] solve 2×2 symmetric positive-definite
//!   systems through a Cholesky factorization and report `None` when the
//!   matrix is numerically singular.
//!
//! Conventions
//! -----------
//! - Coefficient vectors are `(intercept, slope)` as a `nalgebra::Vector2`.
//! - Singularity is judged relative to scale: a matrix `A` is treated as
//!   singular when `det(A) ≤ SINGULAR_TOL · A₁₁ · A₂₂`.
use crate::panel::data::PanelData;
use nalgebra::{Matrix2, Vector2};
use ndarray::ArrayView1;

/// `(intercept, slope)` of an AR(1) regression line.
pub type Coefficients = Vector2<f64>;

/// Relative determinant threshold below which a 2×2 system is singular.
pub const SINGULAR_TOL: f64 = 1e-10;

/// Cross-products of one individual's estimation rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndividualMoments {
    /// Number of estimation rows.
    pub n_obs: usize,
    /// `W'W = [[n, Σx], [Σx, Σx²]]`.
    pub xtx: Matrix2<f64>,
    /// `W'y = (Σy, Σxy)`.
    pub xty: Vector2<f64>,
    /// `y'y = Σy²`.
    pub yty: f64,
}

impl IndividualMoments {
    pub fn zeros() -> Self {
        Self { n_obs: 0, xtx: Matrix2::zeros(), xty: Vector2::zeros(), yty: 0.0 }
    }

    /// Moments of the rows `(lagged[k], outcome[k])`.
    pub fn from_rows(lagged: ArrayView1<'_, f64>, outcome: ArrayView1<'_, f64>) -> Self {
        let mut m = Self::zeros();
        for (&x, &y) in lagged.iter().zip(outcome.iter()) {
            m.n_obs += 1;
            m.xtx[(0, 1)] += x;
            m.xtx[(1, 1)] += x * x;
            m.xty[0] += y;
            m.xty[1] += x * y;
            m.yty += y * y;
        }
        m.xtx[(0, 0)] = m.n_obs as f64;
        m.xtx[(1, 0)] = m.xtx[(0, 1)];
        m
    }

    pub fn accumulate(&mut self, other: &IndividualMoments) {
        self.n_obs += other.n_obs;
        self.xtx += other.xtx;
        self.xty += other.xty;
        self.yty += other.yty;
    }

    pub fn sum_lagged(&self) -> f64 {
        self.xtx[(0, 1)]
    }

    pub fn sum_outcome(&self) -> f64 {
        self.xty[0]
    }

    /// Residual sum of squares `Σ (y - w'β)²` expanded in moments.
    ///
    /// Clamped at zero against cancellation.
    pub fn rss(&self, coef: &Coefficients) -> f64 {
        (self.yty - 2.0 * coef.dot(&self.xty) + coef.dot(&(self.xtx * coef))).max(0.0)
    }

    /// Centered total sum of squares `Σ (y - ȳ)²`.
    pub fn centered_tss(&self) -> f64 {
        if self.n_obs == 0 {
            return 0.0;
        }
        (self.yty - self.sum_outcome().powi(2) / self.n_obs as f64).max(0.0)
    }
}

/// Moments of every individual, in individual order.
pub fn panel_moments(data: &PanelData) -> Vec<IndividualMoments> {
    (0..data.n_individuals())
        .map(|i| {
            let (lagged, outcome) = data.estimation_rows(i);
            IndividualMoments::from_rows(lagged, outcome)
        })
        .collect()
}

/// Pooled moments of the whole panel.
pub fn pooled_moments(moments: &[IndividualMoments]) -> IndividualMoments {
    let mut total = IndividualMoments::zeros();
    for m in moments {
        total.accumulate(m);
    }
    total
}

/// One-step-ahead forecast `α + ρ · lagged`.
pub fn forecast(coef: &Coefficients, lagged: f64) -> f64 {
    coef[0] + coef[1] * lagged
}

/// True when `a` fails the relative determinant test.
pub fn is_singular(a: &Matrix2<f64>) -> bool {
    let scale = a[(0, 0)].abs() * a[(1, 1)].abs();
    let det = a.determinant();
    !det.is_finite() || scale.is_nan() || scale <= 0.0 || det <= SINGULAR_TOL * scale
}

/// Solve `A x = b` for symmetric positive-definite `A`.
pub fn solve_spd(a: &Matrix2<f64>, b: &Vector2<f64>) -> Option<Vector2<f64>> {
    if is_singular(a) {
        return None;
    }
    a.cholesky().map(|chol| chol.solve(b))
}

/// Inverse of a symmetric positive-definite `A`.
pub fn inverse_spd(a: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    if is_singular(a) {
        return None;
    }
    a.cholesky().map(|chol| chol.inverse())
}
