//! scorer — forecast MSE per method, relative to the per-individual baseline.
//!
//! Purpose
//! -------
//! Reduce a [`ForecastTable`] to one [`MethodScore`] per method: the number
//! of present forecasts, the mean squared forecast error over those, and
//! the ratio of that MSE to the per-individual OLS MSE.
//!
//! Key behaviors
//! -------------
//! - Missing forecasts are skipped; each method's MSE is taken over its own
//!   present forecasts.
//! - A baseline with no forecasts or a non-positive MSE turns the whole
//!   card into [`ScoreCard::Undefined`].
//! - A method with no present forecasts has `mse = None` and
//!   `relative_mse = None`.
//! - The baseline's own relative MSE is exactly `1.0`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Squared errors are sorted before summation ([`order_invariant_mean`]),
//!   so reordering individuals never changes a single bit of the output.
//!
//! Testing notes
//! -------------
//! - Hand-computed MSEs, the undefined paths, and a property test that
//!   permuting individuals leaves the card unchanged.
use std::collections::BTreeMap;

use crate::{
    estimators::{ForecastTable, Method},
    evaluation::errors::{ScoreError, ScoreResult},
};
use serde::{Deserialize, Serialize};

/// Score of one method in one replication.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MethodScore {
    pub n_forecasts: usize,
    pub mse: Option<f64>,
    pub relative_mse: Option<f64>,
}

/// Outcome of scoring one replication.
#[derive(Debug, Clone, PartialEq)]
pub enum ScoreCard {
    Defined { scores: BTreeMap<Method, MethodScore> },
    Undefined { reason: ScoreError },
}

impl ScoreCard {
    pub fn is_defined(&self) -> bool {
        matches!(self, ScoreCard::Defined { .. })
    }

    /// Relative MSE of `method`; `None` if undefined or missing.
    pub fn relative_mse(&self, method: Method) -> Option<f64> {
        match self {
            ScoreCard::Defined { scores } => scores.get(&method).and_then(|s| s.relative_mse),
            ScoreCard::Undefined { .. } => None,
        }
    }

    pub fn mse(&self, method: Method) -> Option<f64> {
        match self {
            ScoreCard::Defined { scores } => scores.get(&method).and_then(|s| s.mse),
            ScoreCard::Undefined { .. } => None,
        }
    }
}

/// Mean of `values` summed in ascending order; `None` when empty.
pub fn order_invariant_mean(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len() as f64;
    Some(values.into_iter().sum::<f64>() / n)
}

fn squared_errors(
    method: Method, column: &[Option<f64>], actuals: &[f64],
) -> ScoreResult<Vec<f64>> {
    if column.len() != actuals.len() {
        return Err(ScoreError::LengthMismatch {
            method,
            expected: actuals.len(),
            actual: column.len(),
        });
    }
    let mut out = Vec::with_capacity(column.len());
    for (index, (forecast, &actual)) in column.iter().zip(actuals).enumerate() {
        if let Some(value) = *forecast {
            if !value.is_finite() {
                return Err(ScoreError::NonFiniteForecast { method, index, value });
            }
            out.push((value - actual).powi(2));
        }
    }
    Ok(out)
}

/// Score every column of `forecasts` against `actuals`.
///
/// Errors
/// ------
/// - `ScoreError::MissingBaseline`, `LengthMismatch`, `NonFiniteActual`,
///   `NonFiniteForecast` for malformed inputs. A degenerate baseline is
///   not an error; it yields `Ok(ScoreCard::Undefined { .. })`.
pub fn score(
    forecasts: &BTreeMap<Method, Vec<Option<f64>>>, actuals: &[f64],
) -> ScoreResult<ScoreCard> {
    if let Some((index, &value)) = actuals.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(ScoreError::NonFiniteActual { index, value });
    }
    let baseline = forecasts.get(&Method::BASELINE).ok_or(ScoreError::MissingBaseline)?;
    let baseline_mse = order_invariant_mean(squared_errors(Method::BASELINE, baseline, actuals)?);
    let baseline_mse = match baseline_mse {
        Some(mse) if mse > 0.0 => mse,
        other => {
            return Ok(ScoreCard::Undefined {
                reason: ScoreError::DegenerateBaseline { baseline_mse: other },
            });
        }
    };

    let mut scores = BTreeMap::new();
    for (&method, column) in forecasts {
        let errors = squared_errors(method, column, actuals)?;
        let n_forecasts = errors.len();
        let mse = order_invariant_mean(errors);
        let relative_mse = if method == Method::BASELINE {
            Some(1.0)
        } else {
            mse.map(|m| m / baseline_mse)
        };
        scores.insert(method, MethodScore { n_forecasts, mse, relative_mse });
    }
    Ok(ScoreCard::Defined { scores })
}

impl ForecastTable {
    /// [`score`] applied to this table's columns and targets.
    pub fn score(&self) -> ScoreResult<ScoreCard> {
        score(&self.forecasts, &self.actuals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn table(rows: &[(f64, Option<f64>, Option<f64>)]) -> (BTreeMap<Method, Vec<Option<f64>>>, Vec<f64>) {
        let actuals = rows.iter().map(|r| r.0).collect();
        let mut f = BTreeMap::new();
        f.insert(Method::PerIndividual, rows.iter().map(|r| r.1).collect());
        f.insert(Method::Pooled, rows.iter().map(|r| r.2).collect());
        (f, actuals)
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - MSE and relative MSE on a hand-worked example with missing values.
    // - Degenerate baselines and malformed inputs.
    // - Permutation invariance (property test).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // MSEs skip missing forecasts and the baseline ratio is exactly one.
    //
    // Given
    // -----
    // - actuals (1, 2, 3); baseline (2, 2, None); pooled (1, None, 5).
    //
    // Expect
    // ------
    // - baseline MSE (1 + 0) / 2 = 0.5; pooled MSE (0 + 4) / 2 = 2;
    //   relative 4.0 and 1.0; forecast counts 2 and 2.
    fn mse_skips_missing_forecasts() {
        let (f, a) = table(&[(1.0, Some(2.0), Some(1.0)), (2.0, Some(2.0), None), (3.0, None, Some(5.0))]);

        let card = score(&f, &a).unwrap();

        assert_relative_eq!(card.mse(Method::PerIndividual).unwrap(), 0.5);
        assert_relative_eq!(card.mse(Method::Pooled).unwrap(), 2.0);
        assert_eq!(card.relative_mse(Method::PerIndividual), Some(1.0));
        assert_relative_eq!(card.relative_mse(Method::Pooled).unwrap(), 4.0);
        let ScoreCard::Defined { scores } = &card else { panic!("card should be defined") };
        assert_eq!(scores[&Method::Pooled].n_forecasts, 2);
    }

    #[test]
    // Purpose
    // -------
    // A baseline without forecasts or with zero MSE makes the card undefined;
    // a competitor without forecasts has `None`.
    //
    // Given
    // -----
    // - (a) baseline all `None`; (b) baseline exact; (c) pooled all `None`.
    //
    // Expect
    // ------
    // - (a) `DegenerateBaseline { None }`, (b) `DegenerateBaseline { Some(0) }`,
    //   (c) defined card with pooled relative MSE `None`.
    fn degenerate_baseline_is_undefined() {
        let (f, a) = table(&[(1.0, None, Some(1.5)), (2.0, None, Some(2.5))]);
        assert_eq!(
            score(&f, &a).unwrap(),
            ScoreCard::Undefined { reason: ScoreError::DegenerateBaseline { baseline_mse: None } }
        );

        let (f, a) = table(&[(1.0, Some(1.0), Some(1.5))]);
        assert_eq!(
            score(&f, &a).unwrap(),
            ScoreCard::Undefined {
                reason: ScoreError::DegenerateBaseline { baseline_mse: Some(0.0) }
            }
        );

        let (f, a) = table(&[(1.0, Some(2.0), None)]);
        let card = score(&f, &a).unwrap();
        assert!(card.is_defined());
        assert_eq!(card.relative_mse(Method::Pooled), None);
    }

    #[test]
    // Purpose
    // -------
    // Malformed tables are rejected rather than scored.
    //
    // Given
    // -----
    // - A short pooled column; a NaN actual; no baseline column.
    //
    // Expect
    // ------
    // - `LengthMismatch`, `NonFiniteActual`, `MissingBaseline`.
    fn malformed_inputs_are_errors() {
        let (mut f, a) = table(&[(1.0, Some(2.0), Some(1.0)), (2.0, Some(1.0), Some(1.0))]);
        f.insert(Method::Pooled, vec![Some(1.0)]);
        assert!(matches!(score(&f, &a), Err(ScoreError::LengthMismatch { method: Method::Pooled, .. })));

        let (f, _) = table(&[(1.0, Some(2.0), Some(1.0))]);
        assert!(matches!(score(&f, &[f64::NAN]), Err(ScoreError::NonFiniteActual { index: 0, .. })));

        let mut f = BTreeMap::new();
        f.insert(Method::Pooled, vec![Some(1.0)]);
        assert_eq!(score(&f, &[1.0]), Err(ScoreError::MissingBaseline));
    }

    fn rows_and_permutation()
    -> impl Strategy<Value = (Vec<(f64, Option<f64>, Option<f64>)>, Vec<(f64, Option<f64>, Option<f64>)>)>
    {
        prop::collection::vec(
            (-50.0..50.0f64, (-50.0..50.0f64).prop_map(Some), prop::option::of(-50.0..50.0f64)),
            1..60,
        )
        .prop_flat_map(|rows| (Just(rows.clone()), Just(rows).prop_shuffle()))
    }

    proptest! {
        #[test]
        // Purpose
        // -------
        // Reordering individuals leaves every MSE bit-identical.
        //
        // Given
        // -----
        // - Random tables (baseline always present, pooled sometimes
        //   missing) and a random permutation of their rows.
        //
        // Expect
        // ------
        // - Identical score cards.
        fn score_is_permutation_invariant((rows, shuffled) in rows_and_permutation()) {
            let (f1, a1) = table(&rows);
            let (f2, a2) = table(&shuffled);

            prop_assert_eq!(score(&f1, &a1).unwrap(), score(&f2, &a2).unwrap());
        }
    }
}
