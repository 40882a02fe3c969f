//! Errors raised while scoring forecasts.
//!
//! [`ScoreError::DegenerateBaseline`] is not a failure of the caller: it
//! marks a replication whose relative MSEs are undefined and is carried
//! inside [`ScoreCard::Undefined`](super::scorer::ScoreCard). The other
//! variants reject malformed inputs.
use crate::estimators::Method;

/// Result alias for scoring operations.
pub type ScoreResult<T> = Result<T, ScoreError>;

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreError {
    /// Baseline has no forecasts (`baseline_mse = None`) or a zero MSE.
    DegenerateBaseline { baseline_mse: Option<f64> },

    /// The baseline column is absent from the forecast table.
    MissingBaseline,

    /// A forecast column does not have one entry per individual.
    LengthMismatch { method: Method, expected: usize, actual: usize },

    /// A held-out target is NaN/±inf.
    NonFiniteActual { index: usize, value: f64 },

    /// A present forecast is NaN/±inf.
    NonFiniteForecast { method: Method, index: usize, value: f64 },
}

impl std::error::Error for ScoreError {}

impl std::fmt::Display for ScoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoreError::DegenerateBaseline { baseline_mse: Some(mse) } => {
                write!(f, "Baseline MSE {mse} is not positive; relative MSE undefined")
            }
            ScoreError::DegenerateBaseline { baseline_mse: None } => {
                write!(f, "Baseline produced no forecasts; relative MSE undefined")
            }
            ScoreError::MissingBaseline => {
                write!(f, "Forecast table has no {} column", Method::BASELINE)
            }
            ScoreError::LengthMismatch { method, expected, actual } => {
                write!(f, "Column {method} has {actual} forecasts, expected {expected}")
            }
            ScoreError::NonFiniteActual { index, value } => {
                write!(f, "Non-finite actual {value} for individual {index}")
            }
            ScoreError::NonFiniteForecast { method, index, value } => {
                write!(f, "Non-finite {method} forecast {value} for individual {index}")
            }
        }
    }
}
