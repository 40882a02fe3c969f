//! panel — simulated heterogeneous AR(1) panels.
//!
//! Purpose
//! -------
//! Own everything about the data side of the experiment: the data-generating
//! process settings ([`DgpSpec`]), the shock laws ([`Innovation`]), the
//! validated panel container ([`PanelData`]) and the seeded simulator
//! ([`simulate`]).
//!
//! Key behaviors
//! -------------
//! - [`simulate`] draws individual parameters and outcome paths of length
//!   `T + 1`; the final period is reserved as the forecast target.
//! - [`PanelData`] exposes estimation rows and the forecast row per
//!   individual as zero-copy views.
//!
//! Conventions
//! -----------
//! - Randomness is always injected as `&mut impl Rng`; this module never
//!   seeds a generator itself.
//! - Fallible operations return [`PanelResult`].

pub mod data;
pub mod errors;
pub mod innovations;
pub mod params;
pub mod simulate;

pub use self::data::{PanelData, PanelObs};
pub use self::errors::{PanelError, PanelResult};
pub use self::innovations::{Innovation, ShockSampler};
pub use self::params::{DgpSpec, IndividualParams};
pub use self::simulate::{SimulatedPanel, simulate};
