//! Innovation laws for the simulated AR(1) panel.
//!
//! [`Innovation`] enumerates the shock distributions the simulator can use.
//! The default, [`Innovation::CenteredChiSquare`], is the skewed law
//! `ε = (z² - 1) / √2` with `z ~ N(0, 1)`: mean 0, variance 1, and a long
//! right tail. [`Innovation::Gaussian`] is kept as a symmetric reference
//! point for comparing estimator behavior.
//!
//! ## Scales
//! Each individual carries its own noise scale `σ_i` with
//! `σ_i² = 0.5 + 0.5 · χ²(1)`, so `E[σ_i²] = 1` and `σ_i² ≥ 0.5`.
//!
//! ## Sampling
//! Draws go through `statrs` distributions sampled with a caller-supplied
//! `rand::Rng`; nothing here owns a generator.
use crate::panel::errors::{PanelError, PanelResult};
use rand::{Rng, distributions::Distribution};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, Normal};

/// Lower end of the per-individual noise variance.
pub const NOISE_VARIANCE_FLOOR: f64 = 0.5;

/// Shock distributions for the AR(1) recursion. All have mean 0 and unit
/// variance before scaling by `σ_i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Innovation {
    /// `(z² - 1) / √2`, a centered and standardized χ²(1).
    #[default]
    CenteredChiSquare,
    /// `z ~ N(0, 1)`.
    Gaussian,
}

/// Samplers shared by one simulation run.
///
/// Holds the standard normal and the χ²(1) law so they are built once per
/// panel rather than once per draw.
#[derive(Debug, Clone)]
pub struct ShockSampler {
    innovation: Innovation,
    std_normal: Normal,
    chi_square: ChiSquared,
}

impl ShockSampler {
    pub fn new(innovation: Innovation) -> PanelResult<Self> {
        let std_normal =
            Normal::new(0.0, 1.0).map_err(|_| PanelError::InvalidDistribution { name: "normal" })?;
        let chi_square =
            ChiSquared::new(1.0).map_err(|_| PanelError::InvalidDistribution { name: "chi-squared" })?;
        Ok(Self { innovation, std_normal, chi_square })
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Standard normal draw.
    pub fn standard_normal<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.std_normal.sample(rng)
    }

    /// Noise scale `σ_i = sqrt(0.5 + 0.5 · χ²(1))`.
    pub fn noise_scale<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let chi2: f64 = self.chi_square.sample(rng);
        (NOISE_VARIANCE_FLOOR + 0.5 * chi2).sqrt()
    }

    /// One shock `σ · ε` under the configured law.
    pub fn shock<R: Rng + ?Sized>(&self, rng: &mut R, scale: f64) -> f64 {
        let z = self.standard_normal(rng);
        match self.innovation {
            Innovation::CenteredChiSquare => scale * (z * z - 1.0) / std::f64::consts::SQRT_2,
            Innovation::Gaussian => scale * z,
        }
    }
}
