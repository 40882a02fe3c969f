//! loglik_optimizer — argmin-powered log-likelihood maximization.
//!
//! Purpose
//! -------
//! Provide an L-BFGS optimizer for **maximizing log-likelihoods** `ℓ(θ)`.
//! Models implement [`LogLikelihood`] and call [`maximize`]; in this crate
//! the only such model is the REML objective of the random-coefficients
//! (partial pooling) estimator.
//!
//! Key behaviors
//! -------------
//! - Convert `ℓ(θ)` into an argmin cost `c(θ) = -ℓ(θ)` via
//!   [`adapter::ArgMinAdapter`], finite-differencing the cost when no
//!   analytic gradient exists.
//! - Select the L-BFGS line search from [`MLEOptions`] ([`builders`]) and run
//!   it ([`run::run_lbfgs`]).
//! - Normalize the final solver state into an [`OptimOutcome`] expressed in
//!   log-likelihood units.
//!
//! Invariants & assumptions
//! ------------------------
//! - [`LogLikelihood::value`] treats invalid inputs as recoverable
//!   [`OptError`](crate::optimization::errors::OptError) values, never panics.
//! - [`Tolerances`] and [`MLEOptions`] are validated on construction (and by
//!   `MLEOptions::validate` after deserialization).
//!
//! Testing notes
//! -------------
//! - Unit tests cover sign conventions in [`adapter`], solver construction in
//!   [`builders`], validation helpers, and an end-to-end Gaussian MLE in
//!   [`api`]. The REML objective is tested in `estimators::mixed`.

pub mod adapter;
pub mod api;
pub mod builders;
pub mod run;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::api::maximize;
pub use self::traits::{LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Tolerances};
pub use self::types::{Cost, DEFAULT_LBFGS_MEM, FnEvalMap, Grad, Theta};
