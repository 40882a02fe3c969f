//! Least-squares fits: per-individual (no pooling) and pooled (full pooling).
//!
//! Purpose
//! -------
//! Fit `y_t = α + ρ y_{t-1} + e_t` by OLS from [`IndividualMoments`], either
//! separately for every individual or once on the stacked panel.
//!
//! Key behaviors
//! -------------
//! - [`fit_ols`] solves the normal equations `W'W β = W'y` and reports the
//!   RSS, the residual variance `RSS / (n - 2)` (when `n > 2`) and the
//!   centered R².
//! - [`fit_per_individual`] never fails as a whole: an individual with fewer
//!   than two rows or a singular design gets `None` and is excluded from
//!   every downstream step that needs its OLS fit.
//! - [`fit_pooled`] fails the replication when the stacked design is
//!   singular.
//!
//! Edge cases
//! ----------
//! - Exactly two rows give an exact fit: coefficients exist but the residual
//!   variance is `None` (zero degrees of freedom).
use crate::{
    estimators::moments::{Coefficients, IndividualMoments, pooled_moments, solve_spd},
    panel::errors::{PanelError, PanelResult},
};

/// Parameters in the AR(1) regression.
pub const N_COEFFICIENTS: usize = 2;

/// Result of one OLS fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OlsFit {
    pub coefficients: Coefficients,
    pub n_obs: usize,
    pub rss: f64,
    /// `RSS / (n - 2)`; `None` without residual degrees of freedom.
    pub residual_variance: Option<f64>,
    /// Centered R²; `None` when the outcome has no variation.
    pub r_squared: Option<f64>,
}

/// OLS on one set of moments.
///
/// Errors
/// ------
/// - `PanelError::InsufficientData` with fewer than two rows.
/// - `PanelError::SingularDesign` when `W'W` fails the singularity test
///   (e.g. a constant lagged outcome).
pub fn fit_ols(m: &IndividualMoments) -> PanelResult<OlsFit> {
    if m.n_obs < N_COEFFICIENTS {
        return Err(PanelError::InsufficientData {
            context: "OLS",
            required: N_COEFFICIENTS,
            available: m.n_obs,
        });
    }
    let coefficients =
        solve_spd(&m.xtx, &m.xty).ok_or(PanelError::SingularDesign { context: "OLS" })?;
    let rss = m.rss(&coefficients);
    let dof = m.n_obs - N_COEFFICIENTS;
    let residual_variance = (dof > 0).then(|| rss / dof as f64);
    let tss = m.centered_tss();
    let r_squared = (tss > 0.0).then(|| 1.0 - rss / tss);
    Ok(OlsFit { coefficients, n_obs: m.n_obs, rss, residual_variance, r_squared })
}

/// Separate OLS per individual; `None` where the fit is impossible.
pub fn fit_per_individual(moments: &[IndividualMoments]) -> Vec<Option<OlsFit>> {
    moments.iter().map(|m| fit_ols(m).ok()).collect()
}

/// Single OLS on the stacked rows of all individuals.
pub fn fit_pooled(moments: &[IndividualMoments]) -> PanelResult<OlsFit> {
    fit_ols(&pooled_moments(moments)).map_err(|err| match err {
        PanelError::SingularDesign { .. } => PanelError::SingularDesign { context: "pooled OLS" },
        PanelError::InsufficientData { required, available, .. } => {
            PanelError::InsufficientData { context: "pooled OLS", required, available }
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::ArrayView1;

    fn moments(x: &[f64], y: &[f64]) -> IndividualMoments {
        IndividualMoments::from_rows(ArrayView1::from(x), ArrayView1::from(y))
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Exact recovery on noiseless data and the n = 2 edge case.
    // - Failure modes (too few rows, singular designs).
    // - Pooled fit over several individuals.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Noiseless AR(1) rows are recovered exactly.
    //
    // Given
    // -----
    // - y = 1 + 0.5 x for x = (0, 1, 2, 4).
    //
    // Expect
    // ------
    // - β = (1, 0.5), RSS ≈ 0, R² ≈ 1, residual variance ≈ 0.
    fn exact_line_is_recovered() {
        let m = moments(&[0.0, 1.0, 2.0, 4.0], &[1.0, 1.5, 2.0, 3.0]);

        let fit = fit_ols(&m).unwrap();

        assert_relative_eq!(fit.coefficients[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], 0.5, epsilon = 1e-10);
        assert_relative_eq!(fit.r_squared.unwrap(), 1.0, epsilon = 1e-10);
        assert!(fit.residual_variance.unwrap() < 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Two rows give coefficients but no residual variance.
    //
    // Given
    // -----
    // - Rows (1, 2) and (2, 5).
    //
    // Expect
    // ------
    // - β = (-1, 3); `residual_variance = None`.
    fn two_rows_have_no_residual_variance() {
        let fit = fit_ols(&moments(&[1.0, 2.0], &[2.0, 5.0])).unwrap();

        assert_relative_eq!(fit.coefficients[0], -1.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], 3.0, epsilon = 1e-10);
        assert_eq!(fit.residual_variance, None);
    }

    #[test]
    // Purpose
    // -------
    // Too few rows and constant regressors are reported, and per-individual
    // fitting maps them to `None`.
    //
    // Given
    // -----
    // - One row; three rows with constant x; one valid individual.
    //
    // Expect
    // ------
    // - `InsufficientData`, `SingularDesign`, and `[None, None, Some]`.
    fn per_individual_marks_unfittable_as_none() {
        let short = moments(&[1.0], &[2.0]);
        let flat = moments(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]);
        let good = moments(&[1.0, 2.0, 3.0], &[2.0, 2.5, 3.5]);

        assert!(matches!(fit_ols(&short), Err(PanelError::InsufficientData { .. })));
        assert!(matches!(fit_ols(&flat), Err(PanelError::SingularDesign { .. })));
        let fits = fit_per_individual(&[short, flat, good]);
        assert!(fits[0].is_none() && fits[1].is_none() && fits[2].is_some());
    }

    #[test]
    // Purpose
    // -------
    // The pooled fit uses the stacked rows, so individuals with too few rows
    // on their own still contribute.
    //
    // Given
    // -----
    // - Three one-row individuals on the line y = 2 + x.
    //
    // Expect
    // ------
    // - Pooled β = (2, 1) even though no individual is fittable alone.
    fn pooled_fit_stacks_rows() {
        let parts = [moments(&[0.0], &[2.0]), moments(&[1.0], &[3.0]), moments(&[5.0], &[7.0])];

        let fit = fit_pooled(&parts).unwrap();

        assert_relative_eq!(fit.coefficients[0], 2.0, epsilon = 1e-10);
        assert_relative_eq!(fit.coefficients[1], 1.0, epsilon = 1e-10);
        assert_eq!(fit.n_obs, 3);
    }

    #[test]
    // Purpose
    // -------
    // A singular stacked design is a replication-level failure.
    //
    // Given
    // -----
    // - Two individuals whose lags are all equal to 1.
    //
    // Expect
    // ------
    // - `SingularDesign { context: "pooled OLS" }`.
    fn pooled_singular_design_is_an_error() {
        let parts = [moments(&[1.0, 1.0], &[2.0, 3.0]), moments(&[1.0], &[4.0])];

        assert_eq!(fit_pooled(&parts), Err(PanelError::SingularDesign { context: "pooled OLS" }));
    }
}
