//! grid — Monte Carlo experiment over a grid of panel configurations.
//!
//! Purpose
//! -------
//! Drive the simulate → estimate → score pipeline over the Cartesian
//! product of (N, T, intercept variance, slope range) with B replications
//! per cell, and collect one aggregated row per cell.
//!
//! Key behaviors
//! -------------
//! - [`GridConfig`] holds and validates the experiment; it loads from TOML
//!   or JSON.
//! - [`run_grid`] / [`run_cell`] / [`run_replication`] form the loop, with
//!   per-replication seeds from [`replication_seed`].
//! - [`GridResultTable`] is the serializable output.
//!
//! Conventions
//! -----------
//! - Configuration errors abort [`run_grid`]; replication errors are
//!   counted per cell.

pub mod config;
pub mod driver;
pub mod results;

pub use self::config::{GridCell, GridConfig};
pub use self::driver::{ReplicationOutcome, replication_seed, run_cell, run_grid, run_replication};
pub use self::results::{CellAccumulator, GridCellResult, GridResultTable};
