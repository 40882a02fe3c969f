//! estimators — the forecasting methods compared in the experiment.
//!
//! Purpose
//! -------
//! Fit five AR(1) forecasting methods to a [`PanelData`](crate::panel::PanelData)
//! and produce one held-out forecast per individual and method:
//!
//! | [`Method`]         | Coefficients                                   |
//! |--------------------|------------------------------------------------|
//! | `PerIndividual`    | OLS per individual ([`ols`])                   |
//! | `Pooled`           | one OLS on all rows ([`ols`])                  |
//! | `FixedEffects`     | within slope, own intercepts ([`fixed_effects`]) |
//! | `PartialPooling`   | REML random coefficients, BLUPs ([`mixed`])    |
//! | `EmpiricalBayes`   | posterior mean under an estimated normal prior ([`empirical_bayes`]) |
//!
//! Key behaviors
//! -------------
//! - All methods share the per-individual sufficient statistics in
//!   [`moments`]; the raw series are read once.
//! - [`EstimatorBattery::run`] orchestrates the fits and returns a
//!   [`BatteryOutput`] with estimates, forecasts and diagnostics.
//!
//! Conventions
//! -----------
//! - Missing estimates are `None`, never NaN.
//! - Fallible operations return [`PanelResult`](crate::panel::PanelResult).

pub mod battery;
pub mod empirical_bayes;
pub mod fixed_effects;
pub mod method;
pub mod mixed;
pub mod moments;
pub mod ols;

pub use self::battery::{BatteryOutput, EstimatorBattery, ForecastTable};
pub use self::empirical_bayes::{EmpiricalBayesFit, NormalPrior, posterior_mean, shrink};
pub use self::fixed_effects::{FixedEffectsFit, fit_fixed_effects};
pub use self::method::Method;
pub use self::mixed::{RandomCoefficientsFit, RemlObjective, fit_random_coefficients};
pub use self::moments::{Coefficients, IndividualMoments, forecast, panel_moments};
pub use self::ols::{OlsFit, fit_ols, fit_per_individual, fit_pooled};
