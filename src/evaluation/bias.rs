//! Slope bias of each method against the simulated truth.
//!
//! For method `m`, `bias_m = mean_i (ρ̂_{m,i} - ρ_i)` over individuals with
//! an estimate. Pooled OLS and fixed effects share one slope across
//! individuals, so their bias mixes estimation error with heterogeneity.
use std::collections::BTreeMap;

use crate::{
    estimators::{Coefficients, Method},
    evaluation::scorer::order_invariant_mean,
    panel::IndividualParams,
};

/// Mean slope error per method; `None` for a method with no estimates.
///
/// `estimates[m][i]` must refer to the same individual as `params[i]`;
/// extra entries on either side are ignored.
pub fn slope_bias(
    estimates: &BTreeMap<Method, Vec<Option<Coefficients>>>, params: &[IndividualParams],
) -> BTreeMap<Method, Option<f64>> {
    estimates
        .iter()
        .map(|(&method, coefs)| {
            let errors: Vec<f64> = coefs
                .iter()
                .zip(params)
                .filter_map(|(c, p)| c.map(|c| c[1] - p.slope))
                .collect();
            (method, order_invariant_mean(errors))
        })
        .collect()
}
