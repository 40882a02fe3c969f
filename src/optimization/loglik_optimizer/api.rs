//! High-level entry point for maximizing a [`LogLikelihood`].
//!
//! Validates the starting point with [`LogLikelihood::check`], builds an
//! L-BFGS solver for the configured line search, wraps the model in an
//! [`ArgMinAdapter`] (which *minimizes* `-ℓ(θ)`) and delegates to
//! [`run_lbfgs`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        OptimOutcome, Theta,
        adapter::ArgMinAdapter,
        builders::{build_optimizer_hager_zhang, build_optimizer_more_thuente},
        run::run_lbfgs,
        traits::{LineSearcher, LogLikelihood, MLEOptions},
    },
};

pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let problem = ArgMinAdapter::new(f, data);
    match opts.line_searcher {
        LineSearcher::MoreThuente => {
            let solver = build_optimizer_more_thuente(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
        LineSearcher::HagerZhang => {
            let solver = build_optimizer_hager_zhang(opts)?;
            run_lbfgs(theta0, opts, problem, solver)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{
        errors::OptError,
        loglik_optimizer::{Cost, Tolerances},
    };
    use approx::assert_relative_eq;
    use ndarray::array;

    // Gaussian log-likelihood in (μ, log σ) for a fixed sample.
    struct GaussianLoglik;

    impl LogLikelihood for GaussianLoglik {
        type Data = Vec<f64>;

        fn value(&self, theta: &Theta, data: &Vec<f64>) -> OptResult<Cost> {
            let (mu, log_sigma) = (theta[0], theta[1]);
            let var = (2.0 * log_sigma).exp();
            let ss: f64 = data.iter().map(|x| (x - mu) * (x - mu)).sum();
            Ok(-(data.len() as f64) * log_sigma - 0.5 * ss / var)
        }

        fn check(&self, theta: &Theta, _data: &Vec<f64>) -> OptResult<()> {
            if theta.len() != 2 {
                return Err(OptError::ThetaLengthMismatch { expected: 2, actual: theta.len() });
            }
            Ok(())
        }
    }

    #[test]
    // Purpose
    // -------
    // `maximize` recovers the closed-form Gaussian MLE with both line
    // searches.
    //
    // Given
    // -----
    // - Sample [1, 2, 3, 4, 5]: mean 3, MLE variance 2.
    //
    // Expect
    // ------
    // - μ̂ ≈ 3 and exp(2·log σ̂) ≈ 2 for More–Thuente and Hager–Zhang.
    fn maximize_recovers_gaussian_mle() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let tols = Tolerances::new(Some(1e-8), None, Some(500)).unwrap();
        for ls in [LineSearcher::MoreThuente, LineSearcher::HagerZhang] {
            let opts = MLEOptions::new(tols, ls, false, None).unwrap();

            let out = maximize(&GaussianLoglik, array![0.0, 0.0], &data, &opts).unwrap();

            assert_relative_eq!(out.theta_hat[0], 3.0, epsilon = 1e-4);
            assert_relative_eq!((2.0 * out.theta_hat[1]).exp(), 2.0, epsilon = 1e-3);
        }
    }

    #[test]
    // Purpose
    // -------
    // `check` runs before any solver work.
    //
    // Given
    // -----
    // - A 3-vector starting point for a 2-parameter model.
    //
    // Expect
    // ------
    // - `ThetaLengthMismatch` is returned unchanged.
    fn maximize_runs_check_first() {
        let err = maximize(&GaussianLoglik, array![0.0, 0.0, 0.0], &vec![1.0], &MLEOptions::default())
            .unwrap_err();

        assert_eq!(err, OptError::ThetaLengthMismatch { expected: 2, actual: 3 });
    }
}
