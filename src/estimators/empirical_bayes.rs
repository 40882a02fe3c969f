//! Empirical-Bayes shrinkage of per-individual OLS coefficients.
//!
//! Purpose
//! -------
//! Combine each individual's likelihood `N(θ_i; (W'W)⁻¹W'y, σ̂_i²(W'W)⁻¹)`
//! with a normal prior `N(θ̄, Ω)` estimated from the cross-section of OLS
//! coefficients, and forecast with the posterior mean
//!
//! ```text
//! θ_EB,i = (W_i'W_i / σ̂_i² + Ω⁻¹)⁻¹ (W_i'y_i / σ̂_i² + Ω⁻¹ θ̄).
//! ```
//!
//! Key behaviors
//! -------------
//! - [`NormalPrior::from_estimates`] uses the mean and the sample covariance
//!   (divisor `k - 1`) of the valid OLS coefficients.
//! - [`shrink`] applies [`posterior_mean`] to every individual that has an
//!   OLS fit with a positive residual variance; all others get `None`.
//! - When the prior cannot be formed, every posterior is `None` and the
//!   failure is returned alongside so the caller can log it; the other
//!   estimators are unaffected.
//!
//! Invariants & assumptions
//! ------------------------
//! - At least [`MIN_PRIOR_INDIVIDUALS`] valid fits are required; with fewer
//!   the 2×2 sample covariance is singular or meaningless.
//! - As `Ω → ∞` the posterior mean tends to OLS; as `σ̂² → ∞` it tends to θ̄.
use crate::{
    estimators::{
        moments::{Coefficients, IndividualMoments, inverse_spd, solve_spd},
        ols::OlsFit,
    },
    panel::errors::{PanelError, PanelResult},
};
use nalgebra::Matrix2;

/// Smallest number of valid OLS fits from which a prior is formed.
pub const MIN_PRIOR_INDIVIDUALS: usize = 3;

/// Normal prior on `(intercept, slope)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalPrior {
    pub mean: Coefficients,
    pub covariance: Matrix2<f64>,
    precision: Matrix2<f64>,
}

impl NormalPrior {
    /// Errors
    /// ------
    /// - `PanelError::SingularPrior` when `covariance` is not invertible.
    pub fn new(mean: Coefficients, covariance: Matrix2<f64>) -> PanelResult<Self> {
        let precision =
            inverse_spd(&covariance).ok_or(PanelError::SingularPrior { valid_individuals: 0 })?;
        Ok(Self { mean, covariance, precision })
    }

    /// Moment estimate of the prior from OLS coefficients.
    pub fn from_estimates(estimates: &[Coefficients]) -> PanelResult<Self> {
        let k = estimates.len();
        if k < MIN_PRIOR_INDIVIDUALS {
            return Err(PanelError::SingularPrior { valid_individuals: k });
        }
        let mean = estimates.iter().sum::<Coefficients>() / k as f64;
        let covariance = estimates
            .iter()
            .map(|c| (c - mean) * (c - mean).transpose())
            .sum::<Matrix2<f64>>()
            / (k as f64 - 1.0);
        Self::new(mean, covariance).map_err(|_| PanelError::SingularPrior { valid_individuals: k })
    }

    pub fn precision(&self) -> &Matrix2<f64> {
        &self.precision
    }
}

/// Posterior mean of one individual's coefficients.
///
/// Errors
/// ------
/// - `PanelError::InvalidResidualVariance` for non-positive or non-finite
///   `sigma2`.
/// - `PanelError::SingularDesign` if the posterior precision is singular.
pub fn posterior_mean(
    m: &IndividualMoments, sigma2: f64, prior: &NormalPrior,
) -> PanelResult<Coefficients> {
    if !sigma2.is_finite() || sigma2 <= 0.0 {
        return Err(PanelError::InvalidResidualVariance { value: sigma2 });
    }
    let precision = m.xtx / sigma2 + prior.precision;
    let rhs = m.xty / sigma2 + prior.precision * prior.mean;
    solve_spd(&precision, &rhs).ok_or(PanelError::SingularDesign { context: "empirical Bayes posterior" })
}

/// Shrinkage estimates for the whole panel.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalBayesFit {
    /// `None` when the prior could not be formed.
    pub prior: Option<NormalPrior>,
    pub estimates: Vec<Option<Coefficients>>,
    /// Why the prior is missing, for logging.
    pub prior_error: Option<PanelError>,
}

/// Shrink every valid OLS fit toward the cross-sectional prior.
pub fn shrink(moments: &[IndividualMoments], ols: &[Option<OlsFit>]) -> EmpiricalBayesFit {
    let valid: Vec<Coefficients> = ols
        .iter()
        .flatten()
        .filter(|f| f.residual_variance.is_some_and(|v| v.is_finite() && v > 0.0))
        .map(|f| f.coefficients)
        .collect();
    let prior = match NormalPrior::from_estimates(&valid) {
        Ok(prior) => prior,
        Err(err) => {
            return EmpiricalBayesFit {
                prior: None,
                estimates: vec![None; moments.len()],
                prior_error: Some(err),
            };
        }
    };
    let estimates = moments
        .iter()
        .zip(ols)
        .map(|(m, fit)| {
            let sigma2 = fit.as_ref()?.residual_variance?;
            posterior_mean(m, sigma2, &prior).ok()
        })
        .collect();
    EmpiricalBayesFit { prior: Some(prior), estimates, prior_error: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimators::ols::{fit_ols, fit_per_individual};
    use approx::assert_relative_eq;
    use ndarray::ArrayView1;
    use proptest::prelude::*;

    fn moments(x: &[f64], y: &[f64]) -> IndividualMoments {
        IndividualMoments::from_rows(ArrayView1::from(x), ArrayView1::from(y))
    }

    fn sample() -> IndividualMoments {
        moments(&[1.0, 2.0, 3.0, 4.0, 2.5], &[2.1, 2.4, 3.3, 3.6, 2.2])
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The two limits of the posterior mean (flat prior, huge noise).
    // - A prior centred on the OLS estimate is a fixed point (proptest).
    // - Prior estimation from OLS coefficients and its failure modes.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A near-flat prior leaves OLS unchanged.
    //
    // Given
    // -----
    // - Ω = 1e12 · I, θ̄ = (10, -10), σ² = 0.5.
    //
    // Expect
    // ------
    // - θ_EB ≈ θ_OLS (1e-6).
    fn flat_prior_reproduces_ols() {
        let m = sample();
        let ols = fit_ols(&m).unwrap().coefficients;
        let prior =
            NormalPrior::new(Coefficients::new(10.0, -10.0), Matrix2::identity() * 1e12).unwrap();

        let eb = posterior_mean(&m, 0.5, &prior).unwrap();

        assert_relative_eq!(eb, ols, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Overwhelming noise collapses the posterior onto the prior mean.
    //
    // Given
    // -----
    // - Ω = diag(0.5, 0.05), θ̄ = (1, 0.4), σ² = 1e12.
    //
    // Expect
    // ------
    // - θ_EB ≈ θ̄ (1e-6).
    fn huge_noise_reproduces_prior_mean() {
        let prior =
            NormalPrior::new(Coefficients::new(1.0, 0.4), Matrix2::new(0.5, 0.0, 0.0, 0.05)).unwrap();

        let eb = posterior_mean(&sample(), 1e12, &prior).unwrap();

        assert_relative_eq!(eb, prior.mean, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // The prior is the sample mean and (k-1)-divisor covariance.
    //
    // Given
    // -----
    // - Coefficients (0, 0), (2, 1), (1, 2).
    //
    // Expect
    // ------
    // - mean (1, 1), covariance [[1, 0.5], [0.5, 1]].
    fn prior_uses_sample_moments() {
        let est = [Coefficients::new(0.0, 0.0), Coefficients::new(2.0, 1.0), Coefficients::new(1.0, 2.0)];

        let prior = NormalPrior::from_estimates(&est).unwrap();

        assert_relative_eq!(prior.mean, Coefficients::new(1.0, 1.0), epsilon = 1e-12);
        assert_relative_eq!(prior.covariance, Matrix2::new(1.0, 0.5, 0.5, 1.0), epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Too few or collinear estimates make the prior singular, which blanks
    // every EB estimate instead of failing.
    //
    // Given
    // -----
    // - Two estimates; three estimates on a line; a panel with two valid
    //   individuals.
    //
    // Expect
    // ------
    // - `SingularPrior { valid_individuals: 2 }`, `SingularPrior { 3 }`, and
    //   `shrink` returning all `None` with the error recorded.
    fn singular_prior_blanks_all_estimates() {
        let two = [Coefficients::new(0.0, 0.0), Coefficients::new(1.0, 1.0)];
        let line = [Coefficients::new(0.0, 0.0), Coefficients::new(1.0, 1.0), Coefficients::new(2.0, 2.0)];

        assert_eq!(
            NormalPrior::from_estimates(&two),
            Err(PanelError::SingularPrior { valid_individuals: 2 })
        );
        assert_eq!(
            NormalPrior::from_estimates(&line),
            Err(PanelError::SingularPrior { valid_individuals: 3 })
        );

        let ms = [sample(), moments(&[1.0, 3.0, 2.0], &[1.0, 2.0, 2.2]), moments(&[1.0], &[2.0])];
        let fit = shrink(&ms, &fit_per_individual(&ms));
        assert!(fit.estimates.iter().all(Option::is_none));
        assert!(fit.prior.is_none());
        assert_eq!(fit.prior_error, Some(PanelError::SingularPrior { valid_individuals: 2 }));
    }

    #[test]
    // Purpose
    // -------
    // Individuals without a residual variance are skipped while the rest
    // are shrunk.
    //
    // Given
    // -----
    // - Three individuals with five rows and one with exactly two rows.
    //
    // Expect
    // ------
    // - EB estimates for the first three, `None` for the two-row individual.
    fn exact_fit_individual_gets_no_estimate() {
        let ms = [
            sample(),
            moments(&[1.0, 3.0, 2.0, 4.0, 0.5], &[1.0, 2.0, 2.2, 3.9, 0.7]),
            moments(&[2.0, 1.0, 3.0, 0.0, 1.5], &[3.1, 1.6, 3.5, 1.2, 2.9]),
            moments(&[1.0, 2.0], &[2.0, 5.0]),
        ];

        let fit = shrink(&ms, &fit_per_individual(&ms));

        assert!(fit.prior.is_some());
        assert!(fit.estimates[..3].iter().all(Option::is_some));
        assert_eq!(fit.estimates[3], None);
    }

    proptest! {
        #[test]
        // Purpose
        // -------
        // Shrinking toward the individual's own OLS estimate changes nothing,
        // whatever the noise level and prior spread.
        //
        // Given
        // -----
        // - 4 to 20 random rows with spread-out lags, σ² in [0.01, 100],
        //   diagonal Ω with entries in [0.01, 100], θ̄ = θ_OLS.
        //
        // Expect
        // ------
        // - θ_EB = θ_OLS up to 1e-6 relative.
        fn prior_centred_on_ols_is_a_fixed_point(
            rows in prop::collection::vec((-5.0..5.0f64, -5.0..5.0f64), 4..20),
            sigma2 in 0.01..100.0f64,
            omega in (0.01..100.0f64, 0.01..100.0f64),
        ) {
            let (x, y): (Vec<f64>, Vec<f64>) = rows.into_iter().unzip();
            let mean_x = x.iter().sum::<f64>() / x.len() as f64;
            let var_x = x.iter().map(|v| (v - mean_x).powi(2)).sum::<f64>() / x.len() as f64;
            prop_assume!(var_x > 0.5);
            let m = moments(&x, &y);
            let ols = fit_ols(&m).unwrap().coefficients;
            let prior = NormalPrior::new(ols, Matrix2::new(omega.0, 0.0, 0.0, omega.1)).unwrap();

            let eb = posterior_mean(&m, sigma2, &prior).unwrap();

            prop_assert!((eb - ols).norm() <= 1e-6 * (1.0 + ols.norm()));
        }
    }
}
