//! Panel data containers for AR(1) forecasting experiments.
//!
//! Purpose
//! -------
//! Hold one outcome series per individual and expose the two views every
//! estimator needs: the **estimation rows** `(y_{i,t-1}, y_{i,t})` for
//! `t = 2..T_i` and the **forecast row** `(y_{i,T_i}, y_{i,T_i+1})` whose
//! target is held out.
//!
//! Key behaviors
//! -------------
//! - [`PanelData::new`] validates raw series (non-empty panel, at least two
//!   periods per individual, finite outcomes).
//! - [`PanelData::observations`] flattens the panel into [`PanelObs`]
//!   records `(individual, period, outcome, lagged)`, with `lagged = None`
//!   in each individual's first period.
//! - Row accessors return `ndarray` views into the stored series; nothing is
//!   copied.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every stored series has length `T_i + 1 ≥ 2`, so each individual has
//!   `T_i - 1 ≥ 0` estimation rows and exactly one forecast row.
//! - Unbalanced panels are allowed; simulated panels are balanced.
//!
//! Conventions
//! -----------
//! - Individuals and periods are 0-based: period `p` of individual `i` is
//!   `series(i)[p]`. The last stored period is the forecast target.
//!
//! Testing notes
//! -------------
//! - Unit tests cover construction failures, the row views on a short
//!   hand-written panel, and the flattened observation records.
use crate::panel::errors::{PanelError, PanelResult};
use ndarray::{Array1, ArrayView1, s};

/// One panel observation: outcome and (when it exists) its lag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelObs {
    pub individual: usize,
    pub period: usize,
    pub outcome: f64,
    pub lagged: Option<f64>,
}

/// `PanelData`: validated outcome series, one per individual.
///
/// Fields
/// ------
/// - `series`: `Vec<Array1<f64>>`
///   Outcome path of each individual, periods `0..=T_i`. The final entry is
///   the held-out forecast target.
///
/// Invariants
/// ----------
/// - `series.len() > 0`.
/// - `series[i].len() >= 2` and all entries finite.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelData {
    series: Vec<Array1<f64>>,
}

impl PanelData {
    /// Construct a validated panel from raw per-individual series.
    ///
    /// Errors
    /// ------
    /// - `PanelError::EmptyPanel` when `series` is empty.
    /// - `PanelError::SeriesTooShort` when a series has fewer than 2 periods.
    /// - `PanelError::NonFiniteOutcome` for the first NaN/±∞ found.
    pub fn new(series: Vec<Array1<f64>>) -> PanelResult<Self> {
        if series.is_empty() {
            return Err(PanelError::EmptyPanel);
        }
        for (individual, path) in series.iter().enumerate() {
            if path.len() < 2 {
                return Err(PanelError::SeriesTooShort { individual, len: path.len() });
            }
            if let Some((period, &value)) = path.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(PanelError::NonFiniteOutcome { individual, period, value });
            }
        }
        Ok(Self { series })
    }

    pub fn n_individuals(&self) -> usize {
        self.series.len()
    }

    /// Full stored path of individual `i`, forecast target included.
    pub fn series(&self, i: usize) -> ArrayView1<'_, f64> {
        self.series[i].view()
    }

    /// Number of estimation rows `T_i - 1` of individual `i`.
    pub fn n_estimation_rows(&self, i: usize) -> usize {
        self.series[i].len() - 2
    }

    /// Total estimation rows across the panel.
    pub fn total_estimation_rows(&self) -> usize {
        (0..self.n_individuals()).map(|i| self.n_estimation_rows(i)).sum()
    }

    /// True when every individual has the same number of periods.
    pub fn is_balanced(&self) -> bool {
        let len = self.series[0].len();
        self.series.iter().all(|s| s.len() == len)
    }

    /// `(lagged, outcome)` views over the estimation rows of individual `i`.
    ///
    /// Both views have length `T_i - 1`; entry `k` pairs `y_{k}` with
    /// `y_{k+1}`.
    pub fn estimation_rows(&self, i: usize) -> (ArrayView1<'_, f64>, ArrayView1<'_, f64>) {
        let path = &self.series[i];
        let last = path.len() - 1;
        (path.slice(s![..last - 1]), path.slice(s![1..last]))
    }

    /// `(lagged, target)` for the held-out forecast of individual `i`.
    pub fn forecast_row(&self, i: usize) -> (f64, f64) {
        let path = &self.series[i];
        let last = path.len() - 1;
        (path[last - 1], path[last])
    }

    /// Held-out targets `y_{i,T_i+1}` in individual order.
    pub fn forecast_targets(&self) -> Vec<f64> {
        (0..self.n_individuals()).map(|i| self.forecast_row(i).1).collect()
    }

    /// Flatten the panel into observation records, individual-major.
    pub fn observations(&self) -> impl Iterator<Item = PanelObs> + '_ {
        self.series.iter().enumerate().flat_map(|(individual, path)| {
            path.iter().enumerate().map(move |(period, &outcome)| PanelObs {
                individual,
                period,
                outcome,
                lagged: period.checked_sub(1).map(|p| path[p]),
            })
        })
    }
}
