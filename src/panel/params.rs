//! Data-generating process settings and realized individual parameters.
//!
//! Purpose
//! -------
//! Describe the heterogeneous AR(1) panel
//! `y_{i,t} = α_i + ρ_i y_{i,t-1} + σ_i ε_{i,t}` at two levels: the
//! population-level [`DgpSpec`] that a grid cell fixes, and the
//! [`IndividualParams`] the simulator draws from it.
//!
//! Invariants & assumptions
//! ------------------------
//! - `n_individuals ≥ 1`, `n_periods ≥ 2`.
//! - `intercept_var ≥ 0`, `slope_range ≥ 0`, all values finite.
//! - Every slope in `[base_slope - r/2, base_slope + r/2]` is stationary:
//!   `|base_slope| + r/2 < 1`. [`DgpSpec::new`] rejects anything else with
//!   [`PanelError::UnstableProcess`] instead of simulating explosive paths.
use crate::panel::{
    errors::{PanelError, PanelResult},
    innovations::Innovation,
};
use serde::{Deserialize, Serialize};

/// Realized AR(1) parameters of one individual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndividualParams {
    pub intercept: f64,
    pub slope: f64,
    pub noise_scale: f64,
}

impl IndividualParams {
    /// Mean of the stationary distribution, `α / (1 - ρ)`.
    pub fn stationary_mean(&self) -> f64 {
        self.intercept / (1.0 - self.slope)
    }

    /// Standard deviation of the stationary distribution, `σ / sqrt(1 - ρ²)`.
    pub fn stationary_sd(&self) -> f64 {
        self.noise_scale / (1.0 - self.slope * self.slope).sqrt()
    }
}

/// Population-level settings for one simulated panel.
///
/// Fields
/// ------
/// - `n_individuals`: N, number of individuals.
/// - `n_periods`: T, estimation periods per individual. The simulator
///   produces `T + 1` periods; the last one is the forecast target.
/// - `intercept_var`: variance of `α_i` around `base_intercept`.
/// - `slope_range`: width of the uniform band of `ρ_i` around `base_slope`.
/// - `base_intercept`, `base_slope`: population centers.
/// - `innovation`: shock law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DgpSpec {
    pub n_individuals: usize,
    pub n_periods: usize,
    pub intercept_var: f64,
    pub slope_range: f64,
    pub base_intercept: f64,
    pub base_slope: f64,
    pub innovation: Innovation,
}

impl DgpSpec {
    /// Build and validate a data-generating process.
    ///
    /// Errors
    /// ------
    /// - `PanelError::InvalidDimension` for `N = 0` or `T < 2`.
    /// - `PanelError::InvalidParameter` for negative or non-finite
    ///   variances/ranges and non-finite bases.
    /// - `PanelError::UnstableProcess` when `|base_slope| + slope_range/2 ≥ 1`.
    pub fn new(
        n_individuals: usize, n_periods: usize, intercept_var: f64, slope_range: f64,
        base_intercept: f64, base_slope: f64, innovation: Innovation,
    ) -> PanelResult<Self> {
        let spec = Self {
            n_individuals,
            n_periods,
            intercept_var,
            slope_range,
            base_intercept,
            base_slope,
            innovation,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> PanelResult<()> {
        if self.n_individuals == 0 {
            return Err(PanelError::InvalidDimension {
                name: "n_individuals",
                value: self.n_individuals,
                reason: "At least one individual is required.",
            });
        }
        if self.n_periods < 2 {
            return Err(PanelError::InvalidDimension {
                name: "n_periods",
                value: self.n_periods,
                reason: "At least two estimation periods are required.",
            });
        }
        verify_non_negative("intercept_var", self.intercept_var)?;
        verify_non_negative("slope_range", self.slope_range)?;
        verify_finite("base_intercept", self.base_intercept)?;
        verify_finite("base_slope", self.base_slope)?;
        verify_stable(self.base_slope, self.slope_range)
    }

    /// Largest |ρ_i| the process can draw.
    pub fn max_abs_slope(&self) -> f64 {
        self.base_slope.abs() + 0.5 * self.slope_range
    }
}

pub(crate) fn verify_finite(name: &'static str, value: f64) -> PanelResult<()> {
    if !value.is_finite() {
        return Err(PanelError::InvalidParameter { name, value, reason: "Value must be finite." });
    }
    Ok(())
}

pub(crate) fn verify_non_negative(name: &'static str, value: f64) -> PanelResult<()> {
    verify_finite(name, value)?;
    if value < 0.0 {
        return Err(PanelError::InvalidParameter {
            name,
            value,
            reason: "Value must be non-negative.",
        });
    }
    Ok(())
}

/// Stationarity of every slope in the band `base ± range/2`.
pub(crate) fn verify_stable(base_slope: f64, slope_range: f64) -> PanelResult<()> {
    if base_slope.abs() + 0.5 * slope_range >= 1.0 {
        return Err(PanelError::UnstableProcess { base_slope, slope_range });
    }
    Ok(())
}
