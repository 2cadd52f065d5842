//! Levenberg–Marquardt solver for small dense non-linear least-squares problems.
//!
//! The residual function maps a parameter vector to a residual vector; the Jacobian is
//! obtained by central differences. Each iteration solves the damped normal equations
//!
//! ```text
//! (JᵀJ + λ·diag(JᵀJ)) δ = −Jᵀr
//! ```
//!
//! with a Cholesky factorisation, and adapts λ depending on whether the step lowered the
//! sum of squares.
use std::fmt;

use nalgebra::{DMatrix, DVector};

/// Outcome of an optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitStatus {
    /// One of the tolerance tests was met.
    Converged,
    /// Iteration budget exhausted before convergence.
    MaxIterations,
    /// No step lowered the cost any more (damping exceeded its limit).
    Stalled,
}

impl fmt::Display for FitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitStatus::Converged => write!(f, "converged"),
            FitStatus::MaxIterations => write!(f, "maximum iterations reached"),
            FitStatus::Stalled => write!(f, "stalled"),
        }
    }
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresConfig {
    pub max_iterations: usize,
    /// Relative reduction of the cost below which an accepted step ends the fit.
    pub ftol: f64,
    /// Relative step size below which the fit ends.
    pub xtol: f64,
    /// Largest absolute gradient component below which the fit ends.
    pub gtol: f64,
    pub initial_lambda: f64,
    pub lambda_up: f64,
    pub lambda_down: f64,
    pub max_lambda: f64,
    /// Relative step of the central differences.
    pub diff_step: f64,
}

impl Default for LeastSquaresConfig {
    fn default() -> Self {
        LeastSquaresConfig {
            max_iterations: 200,
            ftol: 1e-12,
            xtol: 1e-10,
            gtol: 1e-30,
            initial_lambda: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            max_lambda: 1e12,
            diff_step: 6e-6,
        }
    }
}

/// Result of [`levenberg_marquardt`].
#[derive(Debug, Clone, PartialEq)]
pub struct LeastSquaresResult {
    pub params: DVector<f64>,
    /// Sum of squared residuals at `params`.
    pub cost: f64,
    pub iterations: usize,
    pub status: FitStatus,
}

/// Central-difference Jacobian of `f` at `p`.
pub fn numerical_jacobian<F>(f: &F, p: &DVector<f64>, r0_len: usize, diff_step: f64) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let mut jacobian = DMatrix::zeros(r0_len, p.len());
    let mut probe = p.clone();

    for j in 0..p.len() {
        let h = diff_step * p[j].abs().max(1.0);
        let original = probe[j];

        probe[j] = original + h;
        let forward = f(&probe);
        probe[j] = original - h;
        let backward = f(&probe);
        probe[j] = original;

        jacobian.set_column(j, &((forward - backward) / (2.0 * h)));
    }
    jacobian
}

/// Minimise `‖f(p)‖²` starting from `initial`.
///
/// Arguments
/// -----------------
/// * `residuals`: the residual function; its output length must not depend on `p`.
/// * `initial`: starting parameters.
/// * `config`: tolerances and damping schedule.
///
/// Return
/// ----------
/// * The best parameters found, their cost, the number of iterations and a [`FitStatus`].
///   Parameters are always the lowest-cost point visited, also when the status is not
///   [`FitStatus::Converged`].
pub fn levenberg_marquardt<F>(
    residuals: F,
    initial: DVector<f64>,
    config: &LeastSquaresConfig,
) -> LeastSquaresResult
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let mut params = initial;
    let mut r = residuals(&params);
    let mut cost = r.norm_squared();
    let mut lambda = config.initial_lambda;

    let done = |params: DVector<f64>, cost: f64, iterations: usize, status: FitStatus| {
        LeastSquaresResult {
            params,
            cost,
            iterations,
            status,
        }
    };

    if cost == 0.0 || params.is_empty() {
        return done(params, cost, 0, FitStatus::Converged);
    }

    let mut iteration = 0;
    while iteration < config.max_iterations {
        iteration += 1;

        let jacobian = numerical_jacobian(&residuals, &params, r.len(), config.diff_step);
        let jtj = jacobian.transpose() * &jacobian;
        let gradient = jacobian.transpose() * &r;

        if gradient.amax() <= config.gtol {
            return done(params, cost, iteration, FitStatus::Converged);
        }

        // Marquardt scaling, floored so unconstrained parameters do not make the system singular
        let diag_floor = jtj.diagonal().max() * 1e-15;
        let scaling = jtj
            .diagonal()
            .map(|d| d.max(diag_floor).max(f64::MIN_POSITIVE));

        let mut damped = jtj.clone();
        for i in 0..damped.nrows() {
            damped[(i, i)] += lambda * scaling[i];
        }

        let Some(cholesky) = damped.cholesky() else {
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                return done(params, cost, iteration, FitStatus::Stalled);
            }
            continue;
        };
        let delta = -cholesky.solve(&gradient);

        let candidate = &params + &delta;
        let r_candidate = residuals(&candidate);
        let cost_candidate = r_candidate.norm_squared();

        let small_step = delta.norm() <= config.xtol * (params.norm() + config.xtol);

        if cost_candidate.is_finite() && cost_candidate < cost {
            let reduction = (cost - cost_candidate) / cost;
            params = candidate;
            r = r_candidate;
            cost = cost_candidate;
            lambda = (lambda * config.lambda_down).max(1e-15);

            if cost == 0.0 || reduction <= config.ftol || small_step {
                return done(params, cost, iteration, FitStatus::Converged);
            }
        } else {
            if small_step {
                return done(params, cost, iteration, FitStatus::Converged);
            }
            lambda *= config.lambda_up;
            if lambda > config.max_lambda {
                return done(params, cost, iteration, FitStatus::Stalled);
            }
        }
    }

    done(params, cost, iteration, FitStatus::MaxIterations)
}

#[cfg(test)]
mod least_squares_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_linear_fit() {
        // y = 2x + 1
        let xs: Vec<f64> = (0..20).map(|i| i as f64 * 0.5).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 1.0).collect();

        let line = |p: &DVector<f64>| {
            DVector::from_iterator(
                xs.len(),
                xs.iter().zip(&ys).map(|(x, y)| y - (p[0] * x + p[1])),
            )
        };
        let result = levenberg_marquardt(
            line,
            DVector::zeros(2),
            &LeastSquaresConfig::default(),
        );

        assert_eq!(result.status, FitStatus::Converged);
        assert_relative_eq!(result.params[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_rosenbrock() {
        let result = levenberg_marquardt(
            |p| DVector::from_vec(vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]]),
            DVector::from_vec(vec![-1.2, 1.0]),
            &LeastSquaresConfig::default(),
        );

        assert_eq!(result.status, FitStatus::Converged);
        assert_relative_eq!(result.params[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(result.params[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_iteration_budget() {
        let config = LeastSquaresConfig {
            max_iterations: 1,
            ..LeastSquaresConfig::default()
        };
        let result = levenberg_marquardt(
            |p| DVector::from_vec(vec![10.0 * (p[1] - p[0] * p[0]), 1.0 - p[0]]),
            DVector::from_vec(vec![-1.2, 1.0]),
            &config,
        );
        assert_eq!(result.status, FitStatus::MaxIterations);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn test_exact_start() {
        let result = levenberg_marquardt(
            |p| DVector::from_vec(vec![p[0] - 3.0]),
            DVector::from_vec(vec![3.0]),
            &LeastSquaresConfig::default(),
        );
        assert_eq!(result.status, FitStatus::Converged);
        assert_eq!(result.iterations, 0);
    }
}
