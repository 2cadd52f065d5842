//! # Fitting
//!
//! Three layers, all blocking and deterministic:
//!
//! - [`least_squares`]: a dense Levenberg–Marquardt solver over an explicit parameter vector.
//! - [`model_fit`]: fits the parameters of a [`PointingModel`](crate::models::PointingModel)
//!   to catalog/mount pairs.
//! - [`projection`]: fits a Gaussian profile to the histogram of residuals along one axis.
//!
//! Non-convergence is never an error: the solvers return their best parameters together with
//! a [`FitStatus`].
pub mod least_squares;
pub mod model_fit;
pub mod projection;

pub use least_squares::{levenberg_marquardt, FitStatus, LeastSquaresConfig, LeastSquaresResult};
pub use model_fit::fit;
pub use projection::{fit_projection, ProjectionFit};
