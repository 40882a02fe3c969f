//! optimization — MLE stack, numerical helpers, and unified error surface.
//!
//! Purpose
//! -------
//! Provide the optimization layer used to fit likelihood-based estimators:
//! an argmin-backed L-BFGS log-likelihood maximizer, stable positive
//! transforms for variance parameters, and a single error/result surface.
//!
//! Conventions
//! -----------
//! - All solvers maximize `ℓ(θ)` by minimizing `c(θ) = -ℓ(θ)`; user-facing
//!   outcomes are expressed in terms of `ℓ`.
//! - Public entry points that can fail return [`OptResult<T>`]; callers never
//!   see raw argmin errors.
//! - Nothing here logs; callers decide what to report.

pub mod errors;
pub mod loglik_optimizer;
pub mod numerical_stability;

pub use self::errors::{OptError, OptResult};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::{
        LineSearcher, LogLikelihood, MLEOptions, OptimOutcome, Theta, Tolerances, maximize,
    };
    pub use super::numerical_stability::{safe_softplus, safe_softplus_inv};
}
