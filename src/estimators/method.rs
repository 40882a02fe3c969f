//! Estimator identifiers.
use serde::{Deserialize, Serialize};

/// The estimators compared by the battery.
///
/// The ordering is the reporting order; [`Method::PerIndividual`] is the
/// baseline every relative MSE is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    /// Separate OLS per individual (no pooling).
    PerIndividual,
    /// One OLS on all rows (full pooling).
    Pooled,
    /// Common slope with individual intercepts (within estimator).
    FixedEffects,
    /// Random-coefficients model fit by REML; BLUP forecasts.
    PartialPooling,
    /// Normal-normal shrinkage of per-individual OLS toward the panel mean.
    EmpiricalBayes,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::PerIndividual,
        Method::Pooled,
        Method::FixedEffects,
        Method::PartialPooling,
        Method::EmpiricalBayes,
    ];

    pub const BASELINE: Method = Method::PerIndividual;

    pub fn name(self) -> &'static str {
        match self {
            Method::PerIndividual => "per_individual",
            Method::Pooled => "pooled",
            Method::FixedEffects => "fixed_effects",
            Method::PartialPooling => "partial_pooling",
            Method::EmpiricalBayes => "empirical_bayes",
        }
    }

    /// Every method except the baseline.
    pub fn competitors() -> impl Iterator<Item = Method> {
        Method::ALL.into_iter().filter(|m| *m != Method::BASELINE)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
