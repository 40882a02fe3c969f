//! mixed — random-coefficients AR(1) model fit by REML (partial pooling).
//!
//! Purpose
//! -------
//! Fit `y_{i,t} = (β + b_i)' w_{i,t} + e_{i,t}` with `w = (1, y_{t-1})'`,
//! `b_i ~ N(0, D)` and `e ~ N(0, σ²)`, then forecast with the BLUP
//! coefficients `β̂ + b̂_i`. Individuals with few rows are pulled toward `β̂`
//! more strongly than data-rich ones.
//!
//! Key behaviors
//! -------------
//! - The variance components are optimized over an unconstrained
//!   θ = `[l₁₁, l₂₁, l₂₂, s]`: `D = LL'` with `L = [[softplus(l₁₁), 0],
//!   [l₂₁, softplus(l₂₂)]]` and `σ² = softplus(s)`. `β` is profiled out by
//!   GLS at every evaluation.
//! - Each evaluation works on the 2×2 [`IndividualMoments`] only. With
//!   `Z = W L` and `M = σ²I + L'W'WL`, Woodbury and the determinant lemma
//!   give
//!   - `log|V_i| = (n_i - 2) log σ² + log|M_i|`,
//!   - `W'V⁻¹W = (S - SL M⁻¹ L'S) / σ²`, `W'V⁻¹y = (g - SL M⁻¹ L'g) / σ²`,
//!   - `r'V⁻¹r = (r'r - q'M⁻¹q) / σ²` with `q = L'(g - Sβ)`,
//!
//!   and the BLUP is `b̂_i = L M⁻¹ q_i`.
//! - [`RemlObjective`] reports the REML log-likelihood divided by the total
//!   number of rows, so gradient tolerances do not depend on panel size.
//! - [`fit_random_coefficients`] retries once with the alternate line search
//!   when the configured one fails; a second failure fails the replication.
//!
//! Invariants & assumptions
//! ------------------------
//! - More than two rows in total and a non-singular GLS system.
//! - σ² is floored at [`VARIANCE_FLOOR`] inside the objective so trial
//!   steps of the line search never produce `log 0`.
//! - Individuals without rows have `S = 0`, contribute nothing to the
//!   likelihood and receive `b̂_i = 0`, i.e. the population coefficients.
//!
//! Testing notes
//! -------------
//! - The Woodbury form of the objective and the BLUPs are checked against a
//!   dense `nalgebra::DMatrix` computation on a tiny panel.
//! - An end-to-end fit on a simulated heterogeneous panel checks that the
//!   population slope and residual variance land near the truth.
use crate::{
    estimators::{
        moments::{Coefficients, IndividualMoments, pooled_moments, solve_spd},
        ols::OlsFit,
    },
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            Cost, LineSearcher, LogLikelihood, MLEOptions, Theta, maximize,
            validation::validate_theta_input,
        },
        numerical_stability::{VARIANCE_FLOOR, safe_softplus, safe_softplus_inv},
    },
    panel::errors::{PanelError, PanelResult},
};
use nalgebra::Matrix2;
use ndarray::array;
use tracing::{debug, warn};

/// Length of θ: three Cholesky entries of `D` and one for `σ²`.
pub const N_VARIANCE_PARAMS: usize = 4;

/// Floor on starting values of the random-effect variances.
const START_VARIANCE_FLOOR: f64 = 1e-4;

/// Moments of every individual plus the total row count.
#[derive(Debug, Clone, PartialEq)]
pub struct RemlData {
    groups: Vec<IndividualMoments>,
    total_obs: usize,
}

impl RemlData {
    /// Errors
    /// ------
    /// - `PanelError::InsufficientData` with two or fewer rows in total.
    /// - `PanelError::SingularDesign` when the stacked design is singular,
    ///   in which case β is not identified for any θ.
    pub fn new(groups: Vec<IndividualMoments>) -> PanelResult<Self> {
        let pooled = pooled_moments(&groups);
        if pooled.n_obs <= 2 {
            return Err(PanelError::InsufficientData {
                context: "REML",
                required: 3,
                available: pooled.n_obs,
            });
        }
        if solve_spd(&pooled.xtx, &pooled.xty).is_none() {
            return Err(PanelError::SingularDesign { context: "REML" });
        }
        Ok(Self { total_obs: pooled.n_obs, groups })
    }

    pub fn total_obs(&self) -> usize {
        self.total_obs
    }
}

/// Variance components in model space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceComponents {
    /// Lower-triangular factor of `D`.
    pub chol: Matrix2<f64>,
    pub residual_variance: f64,
}

impl VarianceComponents {
    /// Map θ to `(L, σ²)`.
    pub fn from_theta(theta: &Theta) -> Self {
        let chol = Matrix2::new(safe_softplus(theta[0]), 0.0, theta[1], safe_softplus(theta[2]));
        let residual_variance = safe_softplus(theta[3]).max(VARIANCE_FLOOR);
        Self { chol, residual_variance }
    }

    /// Map `(D, σ²)` to θ. `D` must be positive definite; diagonal entries
    /// of its factor are floored before inverting softplus.
    pub fn to_theta(random_cov: &Matrix2<f64>, residual_variance: f64) -> Theta {
        let l11 = random_cov[(0, 0)].max(START_VARIANCE_FLOOR).sqrt();
        let l21 = random_cov[(1, 0)] / l11;
        let l22 = (random_cov[(1, 1)] - l21 * l21).max(START_VARIANCE_FLOOR).sqrt();
        array![
            safe_softplus_inv(l11),
            l21,
            safe_softplus_inv(l22),
            safe_softplus_inv(residual_variance)
        ]
    }

    /// `D = LL'`.
    pub fn random_cov(&self) -> Matrix2<f64> {
        self.chol * self.chol.transpose()
    }
}

/// Profiled REML quantities at one θ.
#[derive(Debug, Clone, PartialEq)]
struct RemlProfile {
    beta: Coefficients,
    loglik: f64,
    random_effects: Vec<Coefficients>,
}

/// Inverse and log-determinant of a positive-definite 2×2 matrix.
fn inverse_with_logdet(m: &Matrix2<f64>) -> Option<(Matrix2<f64>, f64)> {
    let det = m.determinant();
    if !det.is_finite() || det <= 0.0 {
        return None;
    }
    m.try_inverse().map(|inv| (inv, det.ln()))
}

fn profile(theta: &Theta, data: &RemlData, with_random_effects: bool) -> OptResult<RemlProfile> {
    let vc = VarianceComponents::from_theta(theta);
    let (l, sigma2) = (vc.chol, vc.residual_variance);
    let lt = l.transpose();

    // GLS pieces and per-individual M⁻¹.
    let mut blocks = Vec::with_capacity(data.groups.len());
    let mut gls_lhs = Matrix2::zeros();
    let mut gls_rhs = Coefficients::zeros();
    let mut logdet_v = 0.0;
    for g in &data.groups {
        let sl = g.xtx * l;
        let m = lt * sl + Matrix2::identity() * sigma2;
        let (m_inv, logdet_m) = inverse_with_logdet(&m)
            .ok_or(OptError::SingularSystem { context: "REML random-effects block" })?;
        gls_lhs += (g.xtx - sl * m_inv * sl.transpose()) / sigma2;
        gls_rhs += (g.xty - sl * (m_inv * (lt * g.xty))) / sigma2;
        logdet_v += (g.n_obs as f64 - 2.0) * sigma2.ln() + logdet_m;
        blocks.push(m_inv);
    }
    let beta = solve_spd(&gls_lhs, &gls_rhs)
        .ok_or(OptError::SingularSystem { context: "REML GLS normal equations" })?;
    let logdet_gls = gls_lhs.determinant().ln();

    let mut quad = 0.0;
    let mut random_effects = Vec::with_capacity(if with_random_effects { blocks.len() } else { 0 });
    for (g, m_inv) in data.groups.iter().zip(&blocks) {
        let resid_cross = g.xty - g.xtx * beta;
        let q = lt * resid_cross;
        let rr = g.rss(&beta);
        quad += (rr - q.dot(&(m_inv * q))) / sigma2;
        if with_random_effects {
            random_effects.push(l * (m_inv * q));
        }
    }

    let n = data.total_obs as f64;
    let loglik = -0.5 * (logdet_v + quad + logdet_gls)
        - 0.5 * (n - 2.0) * (2.0 * std::f64::consts::PI).ln();
    if !loglik.is_finite() {
        return Err(OptError::NonFiniteCost { value: loglik });
    }
    Ok(RemlProfile { beta, loglik, random_effects })
}

/// Average REML log-likelihood of the random-coefficients model.
#[derive(Debug, Clone, Copy, Default)]
pub struct RemlObjective;

impl LogLikelihood for RemlObjective {
    type Data = RemlData;

    fn value(&self, theta: &Theta, data: &RemlData) -> OptResult<Cost> {
        validate_theta_input(theta, N_VARIANCE_PARAMS)?;
        let p = profile(theta, data, false)?;
        Ok(p.loglik / data.total_obs as f64)
    }

    fn check(&self, theta: &Theta, data: &RemlData) -> OptResult<()> {
        validate_theta_input(theta, N_VARIANCE_PARAMS)?;
        if data.total_obs <= 2 {
            return Err(OptError::InvalidLogLikInput {
                reason: format!("REML needs more than 2 rows, got {}", data.total_obs),
            });
        }
        Ok(())
    }
}

/// Fitted random-coefficients model.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomCoefficientsFit {
    /// Population coefficients β̂ (GLS at θ̂).
    pub fixed: Coefficients,
    /// Random-effect covariance D̂.
    pub random_cov: Matrix2<f64>,
    pub residual_variance: f64,
    /// `β̂ + b̂_i` per individual.
    pub blups: Vec<Coefficients>,
    /// Total (not averaged) REML log-likelihood at θ̂.
    pub reml_loglik: f64,
    pub converged: bool,
    pub iterations: usize,
    /// Line search that produced the fit.
    pub line_searcher: LineSearcher,
}

/// Moment-based starting point.
///
/// `σ²₀` is the mean per-individual residual variance (pooled residual
/// variance as fallback); `D₀` is half the diagonal of the sample covariance
/// of per-individual OLS coefficients, floored, or `0.1 σ²₀ I` with fewer
/// than two valid fits.
pub fn start_values(per_individual: &[Option<OlsFit>], pooled: &OlsFit) -> Theta {
    let variances: Vec<f64> = per_individual
        .iter()
        .filter_map(|f| f.and_then(|f| f.residual_variance))
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect();
    let sigma2 = if variances.is_empty() {
        pooled.residual_variance.filter(|v| *v > 0.0).unwrap_or(1.0)
    } else {
        variances.iter().sum::<f64>() / variances.len() as f64
    };

    let coefs: Vec<Coefficients> = per_individual.iter().flatten().map(|f| f.coefficients).collect();
    let random_cov = if coefs.len() >= 2 {
        let k = coefs.len() as f64;
        let mean = coefs.iter().sum::<Coefficients>() / k;
        let var = coefs
            .iter()
            .map(|c| (c - mean).component_mul(&(c - mean)))
            .sum::<Coefficients>()
            / (k - 1.0);
        Matrix2::new(0.5 * var[0], 0.0, 0.0, 0.5 * var[1])
    } else {
        Matrix2::identity() * (0.1 * sigma2)
    };
    VarianceComponents::to_theta(&random_cov, sigma2)
}

/// Fit the random-coefficients model by REML and compute BLUPs.
///
/// Errors
/// ------
/// - Data errors from [`RemlData::new`].
/// - `PanelError::Optimization` when both line searches fail.
pub fn fit_random_coefficients(
    moments: &[IndividualMoments], theta0: Theta, opts: &MLEOptions,
) -> PanelResult<RandomCoefficientsFit> {
    let data = RemlData::new(moments.to_vec())?;
    let (outcome, line_searcher) = match maximize(&RemlObjective, theta0.clone(), &data, opts) {
        Ok(outcome) => (outcome, opts.line_searcher),
        Err(err) => {
            let alternate = opts.line_searcher.alternate();
            warn!(error = %err, ?alternate, "REML fit failed, retrying with alternate line search");
            let outcome =
                maximize(&RemlObjective, theta0, &data, &opts.with_line_searcher(alternate))?;
            (outcome, alternate)
        }
    };
    if !outcome.converged {
        debug!(status = %outcome.status, iterations = outcome.iterations, "REML stopped before convergence");
    }

    let vc = VarianceComponents::from_theta(&outcome.theta_hat);
    let p = profile(&outcome.theta_hat, &data, true)?;
    let blups = p.random_effects.iter().map(|b| p.beta + b).collect();
    debug!(
        intercept = p.beta[0],
        slope = p.beta[1],
        sigma2 = vc.residual_variance,
        loglik = p.loglik,
        "REML fit"
    );
    Ok(RandomCoefficientsFit {
        fixed: p.beta,
        random_cov: vc.random_cov(),
        residual_variance: vc.residual_variance,
        blups,
        reml_loglik: p.loglik,
        converged: outcome.converged,
        iterations: outcome.iterations,
        line_searcher,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        estimators::{
            moments::panel_moments,
            ols::{fit_per_individual, fit_pooled},
        },
        panel::{DgpSpec, Innovation, simulate},
    };
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};
    use ndarray::ArrayView1;
    use rand::{SeedableRng, rngs::StdRng};

    // Tiny unbalanced panel used by the dense cross-checks.
    fn tiny_panel() -> Vec<(Vec<f64>, Vec<f64>)> {
        vec![
            (vec![1.0, 2.0, 1.5], vec![2.0, 1.5, 2.5]),
            (vec![0.5, 3.0, 2.0, 1.0], vec![3.0, 2.0, 1.0, 1.8]),
            (vec![2.0, 2.5], vec![2.5, 2.2]),
        ]
    }

    fn design(x: &[f64]) -> DMatrix<f64> {
        DMatrix::from_fn(x.len(), 2, |r, c| if c == 0 { 1.0 } else { x[r] })
    }

    // Dense REML objective, GLS β and BLUPs using explicit V_i.
    fn dense_reml(theta: &Theta, panel: &[(Vec<f64>, Vec<f64>)]) -> (f64, Vec<DVector<f64>>) {
        let vc = VarianceComponents::from_theta(theta);
        let d = vc.random_cov();
        let d = DMatrix::from_fn(2, 2, |r, c| d[(r, c)]);
        let mut lhs = DMatrix::<f64>::zeros(2, 2);
        let mut rhs = DVector::<f64>::zeros(2);
        let mut logdet = 0.0;
        let mut parts = Vec::new();
        for (x, y) in panel {
            let w = design(x);
            let yv = DVector::from_column_slice(y);
            let v = DMatrix::<f64>::identity(x.len(), x.len()) * vc.residual_variance
                + &w * &d * w.transpose();
            let v_inv = v.clone().try_inverse().unwrap();
            logdet += v.determinant().ln();
            lhs += w.transpose() * &v_inv * &w;
            rhs += w.transpose() * &v_inv * &yv;
            parts.push((w, yv, v_inv));
        }
        let beta = lhs.clone().try_inverse().unwrap() * rhs;
        let mut quad = 0.0;
        let mut blups = Vec::new();
        for (w, yv, v_inv) in &parts {
            let r = yv - w * &beta;
            quad += (r.transpose() * v_inv * &r)[(0, 0)];
            blups.push(&d * w.transpose() * v_inv * &r);
        }
        let n: usize = panel.iter().map(|(x, _)| x.len()).sum();
        let ll = -0.5 * (logdet + quad + lhs.determinant().ln())
            - 0.5 * (n as f64 - 2.0) * (2.0 * std::f64::consts::PI).ln();
        (ll, blups)
    }

    fn tiny_data() -> RemlData {
        let groups = tiny_panel()
            .iter()
            .map(|(x, y)| {
                IndividualMoments::from_rows(ArrayView1::from(&x[..]), ArrayView1::from(&y[..]))
            })
            .collect();
        RemlData::new(groups).unwrap()
    }

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The moment-based REML objective and BLUPs against a dense reference.
    // - The θ ↔ (D, σ²) mapping.
    // - Data preconditions and an end-to-end fit on a simulated panel.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // The Woodbury/determinant-lemma objective equals the dense REML
    // log-likelihood.
    //
    // Given
    // -----
    // - The tiny three-individual panel and θ = (0.3, -0.2, -0.5, 0.1),
    //   which makes D non-diagonal.
    //
    // Expect
    // ------
    // - Total REML log-likelihoods agree to 1e-9; the averaged objective is
    //   the total divided by 9 rows.
    fn reml_objective_matches_dense_computation() {
        let theta = array![0.3, -0.2, -0.5, 0.1];
        let data = tiny_data();

        let p = profile(&theta, &data, false).unwrap();
        let (dense, _) = dense_reml(&theta, &tiny_panel());

        assert_eq!(data.total_obs(), 9);
        assert_relative_eq!(p.loglik, dense, epsilon = 1e-9);
        assert_relative_eq!(
            RemlObjective.value(&theta, &data).unwrap(),
            dense / data.total_obs() as f64,
            epsilon = 1e-9
        );
    }

    #[test]
    // Purpose
    // -------
    // Moment-based BLUPs equal `D W' V⁻¹ r`.
    //
    // Given
    // -----
    // - The tiny panel and θ = (0.0, 0.4, -1.0, -0.3).
    //
    // Expect
    // ------
    // - Each b̂_i matches the dense formula to 1e-9.
    fn blups_match_dense_formula() {
        let theta = array![0.0, 0.4, -1.0, -0.3];

        let p = profile(&theta, &tiny_data(), true).unwrap();
        let (_, dense) = dense_reml(&theta, &tiny_panel());

        for (b, d) in p.random_effects.iter().zip(&dense) {
            assert_relative_eq!(b[0], d[0], epsilon = 1e-9);
            assert_relative_eq!(b[1], d[1], epsilon = 1e-9);
        }
    }

    #[test]
    // Purpose
    // -------
    // θ built from (D, σ²) maps back to the same components.
    //
    // Given
    // -----
    // - D = [[0.5, 0.1], [0.1, 0.05]], σ² = 0.8.
    //
    // Expect
    // ------
    // - `from_theta(to_theta(D, σ²))` reproduces D and σ².
    fn theta_mapping_round_trips_components() {
        let d = Matrix2::new(0.5, 0.1, 0.1, 0.05);

        let vc = VarianceComponents::from_theta(&VarianceComponents::to_theta(&d, 0.8));

        assert_relative_eq!(vc.random_cov(), d, epsilon = 1e-10);
        assert_relative_eq!(vc.residual_variance, 0.8, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Too few rows cannot support REML.
    //
    // Given
    // -----
    // - One individual with two rows.
    //
    // Expect
    // ------
    // - `InsufficientData { context: "REML", .. }`.
    fn reml_data_requires_more_than_two_rows() {
        let m = IndividualMoments::from_rows(
            ArrayView1::from(&[1.0, 2.0][..]),
            ArrayView1::from(&[2.0, 3.0][..]),
        );

        assert!(matches!(
            RemlData::new(vec![m]),
            Err(PanelError::InsufficientData { context: "REML", .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // End-to-end REML on a simulated heterogeneous panel lands near the
    // population values, and an individual without rows gets β̂.
    //
    // Given
    // -----
    // - N = 100, T = 20, intercept_var = 0.2, slope_range = 0.3, base
    //   (1, 0.5), Gaussian shocks, seed 5; an extra empty individual.
    //
    // Expect
    // ------
    // - |β̂_slope - 0.5| < 0.1, σ̂² in (0.6, 1.5), finite log-likelihood,
    //   D̂ positive semi-definite, BLUP of the empty individual equals β̂.
    fn fit_recovers_population_parameters() {
        let spec = DgpSpec::new(100, 20, 0.2, 0.3, 1.0, 0.5, Innovation::Gaussian).unwrap();
        let sim = simulate(&spec, &mut StdRng::seed_from_u64(5)).unwrap();
        let mut moments = panel_moments(&sim.data);
        moments.push(IndividualMoments::zeros());
        let ols = fit_per_individual(&moments);
        let pooled = fit_pooled(&moments).unwrap();

        let fit = fit_random_coefficients(&moments, start_values(&ols, &pooled), &MLEOptions::default())
            .unwrap();

        assert!((fit.fixed[1] - 0.5).abs() < 0.1);
        assert!(fit.residual_variance > 0.6 && fit.residual_variance < 1.5);
        assert!(fit.reml_loglik.is_finite());
        assert!(fit.random_cov[(0, 0)] >= 0.0 && fit.random_cov.determinant() >= -1e-12);
        assert_eq!(fit.blups.len(), 101);
        assert_relative_eq!(fit.blups[100], fit.fixed, epsilon = 1e-12);
    }
}
