//! loglik_optimizer::types — shared numeric aliases and solver wiring.
//!
//! Purpose
//! -------
//! Keep the numeric shapes used by the optimizer in one place so the rest of
//! the layer does not spell out `ndarray` or Argmin generics. Parameter and
//! gradient vectors are `ndarray` arrays because `argmin-math` provides the
//! vector-space operations L-BFGS needs for them.
//!
//! Conventions
//! -----------
//! - `Theta` and `Grad` are column vectors whose length is the number of free
//!   parameters (four for the random-coefficients REML problem).
//! - `Cost` is a scalar `f64`; sign flips between cost and log-likelihood
//!   happen in the adapter, never here.
//! - `DEFAULT_LBFGS_MEM` is the history size used when `MLEOptions` does not
//!   override it.
use argmin::solver::{
    linesearch::{HagerZhangLineSearch, MoreThuenteLineSearch},
    quasinewton::LBFGS,
};
use ndarray::Array1;
use std::collections::HashMap;

pub type Theta = Array1<f64>;

pub type Grad = Array1<f64>;

pub type Cost = f64;

pub type FnEvalMap = HashMap<String, u64>;

pub const DEFAULT_LBFGS_MEM: usize = 7;

pub type HagerZhangLS = HagerZhangLineSearch<Theta, Grad, Cost>;

pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

pub type LbfgsHagerZhang = LBFGS<HagerZhangLS, Theta, Grad, Cost>;

pub type LbfgsMoreThuente = LBFGS<MoreThuenteLS, Theta, Grad, Cost>;
