//! Grid configuration: axes, replications, population centers, seed.
//!
//! Purpose
//! -------
//! Describe a full Monte Carlo experiment. [`GridConfig`] lists the values
//! of the four grid axes (N, T, intercept variance, slope range), the
//! number of replications B per cell, the population centers, the master
//! seed, the shock law, and optimizer options for the REML fit.
//!
//! Key behaviors
//! -------------
//! - [`GridConfig::validate`] checks every cell up front (including the
//!   stationarity of every slope band), so a run never starts on an invalid
//!   grid.
//! - [`GridConfig::cells`] enumerates the Cartesian product with N
//!   outermost and slope range innermost.
//! - Configs load from TOML or JSON through serde; missing optional
//!   sections fall back to [`Default`].
//!
//! Conventions
//! -----------
//! - Field names match the TOML keys, e.g.
//!
//! ```toml
//! n_individuals = [50, 100]
//! n_periods = [20]
//! intercept_vars = [0.0, 0.5]
//! slope_ranges = [0.0, 0.4]
//! replications = 100
//! base_intercept = 1.0
//! base_slope = 0.5
//! seed = 1
//!
//! [mle_opts]
//! line_searcher = "HagerZhang"
//! ```
use crate::{
    optimization::loglik_optimizer::MLEOptions,
    panel::{
        errors::{PanelError, PanelResult},
        innovations::Innovation,
        params::{DgpSpec, verify_finite, verify_non_negative, verify_stable},
    },
};
use serde::{Deserialize, Serialize};

/// Coordinates of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    pub n_individuals: usize,
    pub n_periods: usize,
    pub intercept_var: f64,
    pub slope_range: f64,
}

/// Full description of a Monte Carlo grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    pub n_individuals: Vec<usize>,
    pub n_periods: Vec<usize>,
    pub intercept_vars: Vec<f64>,
    pub slope_ranges: Vec<f64>,
    pub replications: usize,
    pub base_intercept: f64,
    pub base_slope: f64,
    pub seed: u64,
    #[serde(default)]
    pub innovation: Innovation,
    #[serde(default)]
    pub mle_opts: MLEOptions,
}

impl Default for GridConfig {
    /// One homogeneous cell: N = 50, T = 20, base (1, 0.8), B = 5, seed 1.
    fn default() -> Self {
        Self {
            n_individuals: vec![50],
            n_periods: vec![20],
            intercept_vars: vec![0.0],
            slope_ranges: vec![0.0],
            replications: 5,
            base_intercept: 1.0,
            base_slope: 0.8,
            seed: 1,
            innovation: Innovation::default(),
            mle_opts: MLEOptions::default(),
        }
    }
}

impl GridConfig {
    /// Validated constructor with default shock law and optimizer options.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        n_individuals: Vec<usize>, n_periods: Vec<usize>, intercept_vars: Vec<f64>,
        slope_ranges: Vec<f64>, replications: usize, base_intercept: f64, base_slope: f64,
        seed: u64,
    ) -> PanelResult<Self> {
        let config = Self {
            n_individuals,
            n_periods,
            intercept_vars,
            slope_ranges,
            replications,
            base_intercept,
            base_slope,
            seed,
            innovation: Innovation::default(),
            mle_opts: MLEOptions::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every axis value and the optimizer options.
    ///
    /// Errors
    /// ------
    /// - `PanelError::EmptyGridAxis` for an empty axis.
    /// - `PanelError::InvalidDimension` for `B = 0`, `N = 0` or `T < 2`.
    /// - `PanelError::InvalidParameter` for negative/non-finite variances,
    ///   ranges or bases.
    /// - `PanelError::UnstableProcess` for any slope range that lets
    ///   `|ρ_i|` reach one.
    /// - `PanelError::Optimization` for invalid `mle_opts`.
    pub fn validate(&self) -> PanelResult<()> {
        let axes = [
            ("n_individuals", self.n_individuals.is_empty()),
            ("n_periods", self.n_periods.is_empty()),
            ("intercept_vars", self.intercept_vars.is_empty()),
            ("slope_ranges", self.slope_ranges.is_empty()),
        ];
        if let Some(&(axis, _)) = axes.iter().find(|(_, empty)| *empty) {
            return Err(PanelError::EmptyGridAxis { axis });
        }
        if self.replications == 0 {
            return Err(PanelError::InvalidDimension {
                name: "replications",
                value: 0,
                reason: "At least one replication per cell is required.",
            });
        }
        verify_finite("base_intercept", self.base_intercept)?;
        verify_finite("base_slope", self.base_slope)?;
        for &v in &self.intercept_vars {
            verify_non_negative("intercept_var", v)?;
        }
        for &r in &self.slope_ranges {
            verify_non_negative("slope_range", r)?;
            verify_stable(self.base_slope, r)?;
        }
        for cell in self.cells() {
            self.dgp_spec(&cell)?;
        }
        self.mle_opts.validate()?;
        Ok(())
    }

    /// Cartesian product of the axes, N outermost, slope range innermost.
    pub fn cells(&self) -> Vec<GridCell> {
        let mut cells = Vec::with_capacity(self.n_cells());
        for &n_individuals in &self.n_individuals {
            for &n_periods in &self.n_periods {
                for &intercept_var in &self.intercept_vars {
                    for &slope_range in &self.slope_ranges {
                        cells.push(GridCell { n_individuals, n_periods, intercept_var, slope_range });
                    }
                }
            }
        }
        cells
    }

    pub fn n_cells(&self) -> usize {
        self.n_individuals.len()
            * self.n_periods.len()
            * self.intercept_vars.len()
            * self.slope_ranges.len()
    }

    /// Data-generating process of one cell.
    pub fn dgp_spec(&self, cell: &GridCell) -> PanelResult<DgpSpec> {
        DgpSpec::new(
            cell.n_individuals,
            cell.n_periods,
            cell.intercept_var,
            cell.slope_range,
            self.base_intercept,
            self.base_slope,
            self.innovation,
        )
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> PanelResult<Self> {
        let config: GridConfig =
            toml::from_str(s).map_err(|e| PanelError::InvalidConfig { reason: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> PanelResult<Self> {
        let config: GridConfig = serde_json::from_str(s)
            .map_err(|e| PanelError::InvalidConfig { reason: e.to_string() })?;
        config.validate()?;
        Ok(config)
    }
}
