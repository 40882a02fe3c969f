//! battery — run every estimator on one panel and collect forecasts.
//!
//! Purpose
//! -------
//! Given a [`PanelData`], fit no pooling, full pooling, fixed effects,
//! partial pooling and empirical Bayes from one shared set of
//! [`IndividualMoments`], and turn each method's coefficients into a
//! one-step-ahead forecast of every individual's held-out period.
//!
//! Key behaviors
//! -------------
//! - Per-individual failures (too few rows, singular design, no residual
//!   variance) leave a `None` in that method's column only.
//! - A singular empirical prior is logged at `warn` and blanks the EB
//!   column; the other methods are unaffected.
//! - A failed fixed-effects fit (no within-individual variation) is logged
//!   and blanks the FE column.
//! - Pooled OLS and the REML fit are replication-level: if either fails the
//!   whole battery returns the error.
//!
//! Conventions
//! -----------
//! - Columns of [`ForecastTable`] are keyed by [`Method`] in a `BTreeMap`,
//!   so iteration order is the reporting order.
use std::collections::BTreeMap;

use crate::{
    estimators::{
        empirical_bayes::{NormalPrior, shrink},
        fixed_effects::fit_fixed_effects,
        method::Method,
        mixed::{RandomCoefficientsFit, fit_random_coefficients, start_values},
        moments::{Coefficients, forecast, panel_moments},
        ols::{fit_per_individual, fit_pooled},
    },
    optimization::loglik_optimizer::MLEOptions,
    panel::{data::PanelData, errors::PanelResult},
};
use tracing::{debug, warn};

/// Forecasts of every method for the held-out period, plus the targets.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastTable {
    pub actuals: Vec<f64>,
    pub forecasts: BTreeMap<Method, Vec<Option<f64>>>,
}

impl ForecastTable {
    pub fn column(&self, method: Method) -> Option<&[Option<f64>]> {
        self.forecasts.get(&method).map(Vec::as_slice)
    }
}

/// Everything the battery produced for one panel.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryOutput {
    /// Coefficients per method and individual.
    pub estimates: BTreeMap<Method, Vec<Option<Coefficients>>>,
    pub forecasts: ForecastTable,
    /// Centered R² of the pooled regression (`NaN` if undefined).
    pub pooled_r_squared: f64,
    pub random_coefficients: RandomCoefficientsFit,
    pub prior: Option<NormalPrior>,
}

/// Configured set of estimators.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EstimatorBattery {
    pub mle_opts: MLEOptions,
}

impl EstimatorBattery {
    pub fn new(mle_opts: MLEOptions) -> Self {
        Self { mle_opts }
    }

    /// Fit all methods and forecast every individual's held-out period.
    ///
    /// Errors
    /// ------
    /// - Pooled OLS or REML failures (see module docs).
    pub fn run(&self, data: &PanelData) -> PanelResult<BatteryOutput> {
        let moments = panel_moments(data);
        let per_individual = fit_per_individual(&moments);
        let pooled = fit_pooled(&moments)?;
        let fixed_effects = match fit_fixed_effects(&moments) {
            Ok(fit) => Some(fit),
            Err(err) => {
                warn!(error = %err, "fixed-effects fit unavailable; FE forecasts are missing");
                None
            }
        };
        let theta0 = start_values(&per_individual, &pooled);
        let random_coefficients = fit_random_coefficients(&moments, theta0, &self.mle_opts)?;
        let eb = shrink(&moments, &per_individual);
        if let Some(err) = &eb.prior_error {
            warn!(error = %err, "empirical Bayes prior unavailable; EB forecasts are missing");
        }

        let n = data.n_individuals();
        let mut estimates = BTreeMap::new();
        estimates.insert(
            Method::PerIndividual,
            per_individual.iter().map(|f| f.map(|f| f.coefficients)).collect::<Vec<_>>(),
        );
        estimates.insert(Method::Pooled, vec![Some(pooled.coefficients); n]);
        estimates.insert(
            Method::FixedEffects,
            match &fixed_effects {
                Some(fe) => (0..n).map(|i| fe.coefficients(i)).collect(),
                None => vec![None; n],
            },
        );
        estimates.insert(
            Method::PartialPooling,
            random_coefficients.blups.iter().copied().map(Some).collect(),
        );
        estimates.insert(Method::EmpiricalBayes, eb.estimates);

        let lagged: Vec<f64> = (0..n).map(|i| data.forecast_row(i).0).collect();
        let forecasts: BTreeMap<Method, Vec<Option<f64>>> = estimates
            .iter()
            .map(|(&method, coefs)| {
                let column: Vec<Option<f64>> = coefs
                    .iter()
                    .zip(&lagged)
                    .map(|(c, &x)| c.as_ref().map(|c| forecast(c, x)))
                    .collect();
                (method, column)
            })
            .collect();

        debug!(
            individuals = n,
            rows = data.total_estimation_rows(),
            per_individual_valid = per_individual.iter().flatten().count(),
            "estimator battery finished"
        );
        Ok(BatteryOutput {
            estimates,
            forecasts: ForecastTable { actuals: data.forecast_targets(), forecasts },
            pooled_r_squared: pooled.r_squared.unwrap_or(f64::NAN),
            random_coefficients,
            prior: eb.prior,
        })
    }
}
