//! evaluation — scoring forecasts and estimates of one replication.
//!
//! Purpose
//! -------
//! Turn a battery's output into numbers the grid driver can average: the
//! relative forecast MSE of each method ([`scorer`]) and the mean slope
//! error against the simulated truth ([`bias`]).
//!
//! Conventions
//! -----------
//! - Missing values are skipped, never imputed.
//! - All means use [`scorer::order_invariant_mean`], so results do not
//!   depend on the order of individuals.

pub mod bias;
pub mod errors;
pub mod scorer;

pub use self::bias::slope_bias;
pub use self::errors::{ScoreError, ScoreResult};
pub use self::scorer::{MethodScore, ScoreCard, order_invariant_mean, score};
