//! Fixed-effects (within) estimator: common slope, individual intercepts.
//!
//! The slope is estimated from deviations around each individual's means,
//! `ρ̂ = Σ_i S_xy,i / Σ_i S_xx,i` with `S_xy,i = Σxy - Σx·Σy / n_i`, and each
//! intercept is recovered as `α̂_i = ȳ_i - ρ̂ x̄_i`. Individuals without
//! estimation rows get no intercept (and no forecast).
//!
//! With short T the within slope carries the Nickell bias, which is exactly
//! what makes it an interesting competitor next to the shrinkage methods.
use crate::{
    estimators::moments::{Coefficients, IndividualMoments, SINGULAR_TOL},
    panel::errors::{PanelError, PanelResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct FixedEffectsFit {
    pub slope: f64,
    pub intercepts: Vec<Option<f64>>,
    /// `1 - RSS_within / TSS_within`.
    pub within_r_squared: Option<f64>,
}

impl FixedEffectsFit {
    pub fn coefficients(&self, i: usize) -> Option<Coefficients> {
        self.intercepts[i].map(|a| Coefficients::new(a, self.slope))
    }
}

/// Within estimator over all individuals with at least one row.
///
/// Errors
/// ------
/// - `PanelError::InsufficientData` when no individual has a row.
/// - `PanelError::SingularDesign` when the lagged outcome has no
///   within-individual variation.
pub fn fit_fixed_effects(moments: &[IndividualMoments]) -> PanelResult<FixedEffectsFit> {
    let (mut sxx, mut sxy, mut syy, mut raw_xx) = (0.0, 0.0, 0.0, 0.0);
    let mut rows = 0;
    for m in moments.iter().filter(|m| m.n_obs > 0) {
        let n = m.n_obs as f64;
        sxx += m.xtx[(1, 1)] - m.sum_lagged().powi(2) / n;
        sxy += m.xty[1] - m.sum_lagged() * m.sum_outcome() / n;
        syy += m.centered_tss();
        raw_xx += m.xtx[(1, 1)];
        rows += m.n_obs;
    }
    if rows == 0 {
        return Err(PanelError::InsufficientData { context: "fixed effects", required: 1, available: 0 });
    }
    if sxx.is_nan() || sxx <= SINGULAR_TOL * raw_xx {
        return Err(PanelError::SingularDesign { context: "fixed effects" });
    }

    let slope = sxy / sxx;
    let intercepts = moments
        .iter()
        .map(|m| {
            (m.n_obs > 0).then(|| (m.sum_outcome() - slope * m.sum_lagged()) / m.n_obs as f64)
        })
        .collect();
    let rss = (syy - slope * sxy).max(0.0);
    let within_r_squared = (syy > 0.0).then(|| 1.0 - rss / syy);
    Ok(FixedEffectsFit { slope, intercepts, within_r_squared })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::ArrayView1;

    fn moments(x: &[f64], y: &[f64]) -> IndividualMoments {
        IndividualMoments::from_rows(ArrayView1::from(x), ArrayView1::from(y))
    }

    #[test]
    // Purpose
    // -------
    // Parallel lines with different intercepts are recovered exactly.
    //
    // Given
    // -----
    // - Individual 0 on y = 1 + 0.5x, individual 1 on y = 3 + 0.5x, and an
    //   individual with no rows.
    //
    // Expect
    // ------
    // - slope 0.5, intercepts (1, 3, None), within R² = 1.
    fn parallel_lines_are_recovered() {
        let parts = [
            moments(&[0.0, 2.0, 4.0], &[1.0, 2.0, 3.0]),
            moments(&[1.0, 3.0], &[3.5, 4.5]),
            IndividualMoments::zeros(),
        ];

        let fit = fit_fixed_effects(&parts).unwrap();

        assert_relative_eq!(fit.slope, 0.5, epsilon = 1e-12);
        assert_relative_eq!(fit.intercepts[0].unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(fit.intercepts[1].unwrap(), 3.0, epsilon = 1e-12);
        assert_eq!(fit.intercepts[2], None);
        assert_eq!(fit.coefficients(2), None);
        assert_relative_eq!(fit.within_r_squared.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Single-row individuals carry no within variation.
    //
    // Given
    // -----
    // - Two individuals with one row each.
    //
    // Expect
    // ------
    // - `SingularDesign`.
    fn no_within_variation_is_singular() {
        let parts = [moments(&[1.0], &[2.0]), moments(&[3.0], &[1.0])];

        assert_eq!(
            fit_fixed_effects(&parts),
            Err(PanelError::SingularDesign { context: "fixed effects" })
        );
    }
}
