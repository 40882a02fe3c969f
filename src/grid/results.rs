//! Per-cell aggregation and the result table.
//!
//! [`CellAccumulator`] folds replication outcomes in replication-index
//! order into a [`GridCellResult`]:
//!
//! - relative MSE per non-baseline method, averaged over replications with
//!   a defined value for that method;
//! - pooled R² and slope bias per method, averaged over every replication
//!   whose pipeline succeeded;
//! - counters for failed (pipeline error) and undefined (degenerate
//!   baseline) replications.
//!
//! A cell without any defined replication reports `None` for every
//! relative MSE. [`GridResultTable`] collects the rows in grid order and
//! serializes to JSON.
use std::collections::BTreeMap;

use crate::{
    estimators::Method,
    grid::{config::GridCell, driver::ReplicationOutcome},
};
use serde::{Deserialize, Serialize};

/// Aggregated results of one grid cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCellResult {
    pub n_individuals: usize,
    pub n_periods: usize,
    pub intercept_var: f64,
    pub slope_range: f64,
    /// Replications attempted (B).
    pub replications: usize,
    /// Replications whose pipeline returned an error.
    pub failed: usize,
    /// Replications with an undefined score card.
    pub undefined: usize,
    /// Mean relative MSE per non-baseline method.
    pub relative_mse: BTreeMap<Method, Option<f64>>,
    /// Mean in-sample R² of pooled OLS.
    pub pooled_r_squared: Option<f64>,
    /// Mean slope bias per method.
    pub slope_bias: BTreeMap<Method, Option<f64>>,
}

impl GridCellResult {
    pub fn cell(&self) -> GridCell {
        GridCell {
            n_individuals: self.n_individuals,
            n_periods: self.n_periods,
            intercept_var: self.intercept_var,
            slope_range: self.slope_range,
        }
    }

    /// Replications that produced a defined score card.
    pub fn defined(&self) -> usize {
        self.replications - self.failed - self.undefined
    }

    pub fn relative_mse(&self, method: Method) -> Option<f64> {
        self.relative_mse.get(&method).copied().flatten()
    }
}

/// Running sum and count.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn push(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Streaming aggregation of one cell's replications.
#[derive(Debug, Clone, PartialEq)]
pub struct CellAccumulator {
    cell: GridCell,
    replications: usize,
    failed: usize,
    undefined: usize,
    relative_mse: BTreeMap<Method, Mean>,
    pooled_r_squared: Mean,
    slope_bias: BTreeMap<Method, Mean>,
}

impl CellAccumulator {
    pub fn new(cell: GridCell) -> Self {
        Self {
            cell,
            replications: 0,
            failed: 0,
            undefined: 0,
            relative_mse: Method::competitors().map(|m| (m, Mean::default())).collect(),
            pooled_r_squared: Mean::default(),
            slope_bias: Method::ALL.into_iter().map(|m| (m, Mean::default())).collect(),
        }
    }

    pub fn record_failure(&mut self) {
        self.replications += 1;
        self.failed += 1;
    }

    pub fn record(&mut self, outcome: &ReplicationOutcome) {
        self.replications += 1;
        if outcome.pooled_r_squared.is_finite() {
            self.pooled_r_squared.push(outcome.pooled_r_squared);
        }
        for (method, bias) in &outcome.slope_bias {
            if let (Some(b), Some(acc)) = (bias, self.slope_bias.get_mut(method)) {
                acc.push(*b);
            }
        }
        if !outcome.score.is_defined() {
            self.undefined += 1;
            return;
        }
        for (method, acc) in self.relative_mse.iter_mut() {
            if let Some(r) = outcome.score.relative_mse(*method) {
                acc.push(r);
            }
        }
    }

    pub fn finish(self) -> GridCellResult {
        GridCellResult {
            n_individuals: self.cell.n_individuals,
            n_periods: self.cell.n_periods,
            intercept_var: self.cell.intercept_var,
            slope_range: self.cell.slope_range,
            replications: self.replications,
            failed: self.failed,
            undefined: self.undefined,
            relative_mse: self.relative_mse.iter().map(|(m, acc)| (*m, acc.value())).collect(),
            pooled_r_squared: self.pooled_r_squared.value(),
            slope_bias: self.slope_bias.iter().map(|(m, acc)| (*m, acc.value())).collect(),
        }
    }
}

/// One row per grid cell, in grid order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GridResultTable {
    pub cells: Vec<GridCellResult>,
}

impl GridResultTable {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Row whose coordinates equal `cell`.
    pub fn get(&self, cell: &GridCell) -> Option<&GridCellResult> {
        self.cells.iter().find(|r| r.cell() == *cell)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
