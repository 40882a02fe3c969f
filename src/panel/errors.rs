//! Errors for the panel simulation and estimation stack (configuration
//! checks, data validation, linear-algebra failures, and REML optimizer
//! failures).
//!
//! This module defines [`PanelError`], the error type shared by the
//! simulator, the estimator battery and the grid driver. It implements
//! `Display`/`Error` and converts to `PyErr` when the `python-bindings`
//! feature is enabled.
//!
//! ## Conventions
//! - **Individuals and periods are 0-based** in every payload.
//! - Configuration errors are raised before any replication runs; the grid
//!   driver never reports them per cell.
//! - Per-replication failures (singular pooled design, REML non-convergence)
//!   are counted by the grid driver and do not abort the run.
//! - Optimizer errors are wrapped as [`PanelError::Optimization`] and keep
//!   the original [`OptError`].
use crate::{evaluation::errors::ScoreError, optimization::errors::OptError};

#[cfg(feature = "python-bindings")]
use pyo3::{PyErr, exceptions::PyValueError};

/// Crate-wide result alias for panel operations that may produce
/// [`PanelError`].
pub type PanelResult<T> = Result<T, PanelError>;

/// Unified error type for panel simulation, estimation and grid runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelError {
    // ---- Configuration ----
    /// A count-valued setting is out of range (N, T, B, ...).
    InvalidDimension { name: &'static str, value: usize, reason: &'static str },

    /// A real-valued setting is negative or non-finite.
    InvalidParameter { name: &'static str, value: f64, reason: &'static str },

    /// `|base_slope| + slope_range / 2` must stay below one.
    UnstableProcess { base_slope: f64, slope_range: f64 },

    /// A grid axis has no values.
    EmptyGridAxis { axis: &'static str },

    /// A configuration file could not be parsed.
    InvalidConfig { reason: String },

    // ---- Simulation ----
    /// A drawn slope left the stationary region.
    NonStationarySlope { individual: usize, slope: f64 },

    /// A `statrs` distribution rejected its parameters.
    InvalidDistribution { name: &'static str },

    // ---- Panel data ----
    /// The panel has no individuals.
    EmptyPanel,

    /// A series needs at least two periods (one estimation row + target).
    SeriesTooShort { individual: usize, len: usize },

    /// An outcome is NaN/±inf.
    NonFiniteOutcome { individual: usize, period: usize, value: f64 },

    // ---- Estimation ----
    /// Too few rows for the requested fit.
    InsufficientData { context: &'static str, required: usize, available: usize },

    /// A design (cross-product) matrix is singular.
    SingularDesign { context: &'static str },

    /// The empirical prior covariance could not be formed or inverted.
    SingularPrior { valid_individuals: usize },

    /// A residual variance was non-positive or non-finite.
    InvalidResidualVariance { value: f64 },

    /// Wrapped optimizer failure.
    Optimization { source: OptError },

    /// Forecasts could not be scored (malformed forecast table).
    Scoring { source: ScoreError },
}

impl std::error::Error for PanelError {}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Configuration ----
            PanelError::InvalidDimension { name, value, reason } => {
                write!(f, "Invalid {name} = {value}: {reason}")
            }
            PanelError::InvalidParameter { name, value, reason } => {
                write!(f, "Invalid {name} = {value}: {reason}")
            }
            PanelError::UnstableProcess { base_slope, slope_range } => {
                write!(
                    f,
                    "Slopes drawn around {base_slope} with range {slope_range} can reach |slope| >= 1"
                )
            }
            PanelError::EmptyGridAxis { axis } => {
                write!(f, "Grid axis '{axis}' must contain at least one value")
            }
            PanelError::InvalidConfig { reason } => {
                write!(f, "Invalid configuration: {reason}")
            }

            // ---- Simulation ----
            PanelError::NonStationarySlope { individual, slope } => {
                write!(f, "Individual {individual} drew non-stationary slope {slope}")
            }
            PanelError::InvalidDistribution { name } => {
                write!(f, "Invalid parameters for {name} distribution")
            }

            // ---- Panel data ----
            PanelError::EmptyPanel => write!(f, "Panel contains no individuals"),
            PanelError::SeriesTooShort { individual, len } => {
                write!(f, "Series of individual {individual} has {len} periods, at least 2 required")
            }
            PanelError::NonFiniteOutcome { individual, period, value } => {
                write!(f, "Non-finite outcome {value} for individual {individual} at period {period}")
            }

            // ---- Estimation ----
            PanelError::InsufficientData { context, required, available } => {
                write!(f, "{context}: {available} rows available, {required} required")
            }
            PanelError::SingularDesign { context } => {
                write!(f, "Singular design matrix in {context}")
            }
            PanelError::SingularPrior { valid_individuals } => {
                write!(
                    f,
                    "Empirical prior is singular or undefined ({valid_individuals} valid individuals)"
                )
            }
            PanelError::InvalidResidualVariance { value } => {
                write!(f, "Residual variance must be finite and positive, got {value}")
            }
            PanelError::Optimization { source } => {
                write!(f, "Optimization failed: {source}")
            }
            PanelError::Scoring { source } => {
                write!(f, "Scoring failed: {source}")
            }
        }
    }
}

impl From<OptError> for PanelError {
    fn from(source: OptError) -> PanelError {
        PanelError::Optimization { source }
    }
}

impl From<ScoreError> for PanelError {
    fn from(source: ScoreError) -> PanelError {
        PanelError::Scoring { source }
    }
}

/// Convert a [`PanelError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl From<PanelError> for PyErr {
    fn from(err: PanelError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Optimizer failures keep their original payload when lifted into
    // `PanelError`.
    //
    // Given
    // -----
    // - `OptError::MissingThetaHat`.
    //
    // Expect
    // ------
    // - `PanelError::Optimization { source }` with the same variant, and a
    //   message that mentions the optimizer error.
    fn opt_error_is_wrapped_unchanged() {
        let err: PanelError = OptError::MissingThetaHat.into();

        assert_eq!(err, PanelError::Optimization { source: OptError::MissingThetaHat });
        assert!(err.to_string().contains("theta hat"));
    }

    #[test]
    // Purpose
    // -------
    // Display for the stability check names both offending settings.
    //
    // Given
    // -----
    // - base_slope 0.8, slope_range 0.5.
    //
    // Expect
    // ------
    // - Message contains "0.8" and "0.5".
    fn unstable_process_message_names_settings() {
        let msg = PanelError::UnstableProcess { base_slope: 0.8, slope_range: 0.5 }.to_string();

        assert!(msg.contains("0.8") && msg.contains("0.5"));
    }
}
