//! panel_shrinkage — Monte Carlo comparison of panel forecasting estimators.
//!
//! Purpose
//! -------
//! Measure how much pooling helps one-step-ahead forecasts in dynamic
//! panels. Each replication simulates a heterogeneous AR(1) panel, fits
//! no pooling, full pooling, fixed effects, REML partial pooling and
//! empirical-Bayes shrinkage, and scores every method's held-out forecasts
//! relative to per-individual OLS. The grid driver repeats this over a
//! Cartesian grid of panel shapes and heterogeneity levels.
//!
//! Key behaviors
//! -------------
//! - [`panel`]: data-generating process, simulator, panel container.
//! - [`estimators`]: the estimator battery and its building blocks.
//! - [`evaluation`]: relative MSE scoring and slope bias.
//! - [`grid`]: configuration, seeding, replication loop, result table.
//! - [`optimization`]: the L-BFGS log-likelihood maximizer used by REML.
//! - With the `python-bindings` feature, a `_panel_shrinkage` extension
//!   module exposes `run_grid`, returning the result table as JSON.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every replication owns its random generator; results depend only on
//!   the master seed and the grid, not on execution order.
//! - Missing estimates and forecasts are typed `None` throughout.
//!
//! Conventions
//! -----------
//! - Errors are layer-specific enums ([`PanelError`], [`ScoreError`],
//!   [`OptError`](optimization::OptError)) converted with `From` at layer
//!   boundaries and to `PyErr` at the Python boundary.
//! - Logging goes through `tracing`; installing a subscriber is left to the
//!   binary or the embedding application.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/integration_grid_pipeline.rs`
//!   runs the concrete homogeneous and heterogeneous scenarios end to end.

pub mod estimators;
pub mod evaluation;
pub mod grid;
pub mod optimization;
pub mod panel;

pub use crate::estimators::{EstimatorBattery, Method};
pub use crate::evaluation::{ScoreCard, ScoreError, score};
pub use crate::grid::{GridCellResult, GridConfig, GridResultTable, run_grid, run_replication};
pub use crate::panel::{DgpSpec, PanelData, PanelError, PanelResult, simulate};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

#[cfg(feature = "python-bindings")]
use crate::optimization::loglik_optimizer::LineSearcher;

/// Run a Monte Carlo grid from Python and return the result table as JSON.
///
/// Parameters mirror [`GridConfig`]; the shock law and optimizer tolerances
/// keep their defaults. `line_searcher` accepts `"MoreThuente"` or
/// `"HagerZhang"` (case-insensitive).
///
/// Errors
/// ------
/// - `ValueError` for an invalid grid or line-search name, or if the table
///   cannot be serialized.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(
    name = "run_grid",
    signature = (
        n_individuals, n_periods, intercept_vars, slope_ranges, replications,
        base_intercept = 1.0, base_slope = 0.8, seed = 1, line_searcher = None
    )
)]
#[allow(clippy::too_many_arguments)]
fn py_run_grid(
    py: Python<'_>, n_individuals: Vec<usize>, n_periods: Vec<usize>, intercept_vars: Vec<f64>,
    slope_ranges: Vec<f64>, replications: usize, base_intercept: f64, base_slope: f64, seed: u64,
    line_searcher: Option<&str>,
) -> PyResult<String> {
    let mut config = GridConfig::new(
        n_individuals,
        n_periods,
        intercept_vars,
        slope_ranges,
        replications,
        base_intercept,
        base_slope,
        seed,
    )?;
    if let Some(name) = line_searcher {
        let ls: LineSearcher = name.parse().map_err(|e: optimization::OptError| {
            PyValueError::new_err(e.to_string())
        })?;
        config.mle_opts = config.mle_opts.with_line_searcher(ls);
    }
    let table = py.allow_threads(|| run_grid(&config))?;
    table.to_json_pretty().map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Python extension module `_panel_shrinkage`.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _panel_shrinkage(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_run_grid, m)?)?;
    Ok(())
}
