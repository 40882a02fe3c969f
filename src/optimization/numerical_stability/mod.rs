//! numerical_stability — guarded transforms for constrained parameters.
//!
//! The optimizer works in unconstrained θ-space; model code maps θ into
//! positive variance components with [`safe_softplus`] and seeds θ₀ from
//! moment estimates with [`safe_softplus_inv`].

pub mod transformations;

pub use self::transformations::{VARIANCE_FLOOR, safe_softplus, safe_softplus_inv};
