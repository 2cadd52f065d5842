use std::collections::BTreeSet;
use std::sync::Arc;

use nalgebra::DVector;

use crate::log_context::LogContext;
use crate::models::{FittedModel, PointingModel};
use crate::observations::TransformedPair;
use crate::pointing_errors::PointingError;

use super::least_squares::{levenberg_marquardt, FitStatus, LeastSquaresConfig};

/// Residual vector of `model` at `params`, interleaved `[lon₀, lat₀, lon₁, lat₁, ...]`.
fn stacked_residuals(
    model: &dyn PointingModel,
    pairs: &[&TransformedPair],
    params: &DVector<f64>,
) -> DVector<f64> {
    let p = params.as_slice();
    DVector::from_iterator(
        2 * pairs.len(),
        pairs.iter().flat_map(|pair| {
            let (dlon, dlat) = pair.raw_difference();
            let (lon, lat) = (pair.catalog.lon, pair.catalog.lat);
            [
                model.longitude_residual(p, lon, lat, dlon),
                model.latitude_residual(p, lon, lat, dlat),
            ]
        }),
    )
}

/// Fit the parameters of `model` to a subset of transformed pairs.
///
/// The model is evaluated at the catalog (true) position of each pair, against the raw
/// catalog − mount difference. Both axes of every selected pair enter one joint
/// least-squares problem.
///
/// Arguments
/// -----------------
/// * `pairs`: catalog/mount pairs, in the frame the model works in.
/// * `selected`: indices into `pairs` taking part in the fit. Duplicates count once; indices
///   past the end are ignored with a warning.
/// * `model`: the model variant.
/// * `config`: solver settings.
/// * `ctx`: logging handle.
///
/// Return
/// ----------
/// * A [`FittedModel`]. When the solver does not converge the best parameters found are
///   returned anyway and the status says so.
///
/// Errors
/// ----------
/// * [`PointingError::EmptyInput`] if `pairs` is empty or no valid index remains.
pub fn fit(
    pairs: &[TransformedPair],
    selected: &[usize],
    model: &Arc<dyn PointingModel>,
    config: &LeastSquaresConfig,
    ctx: &LogContext,
) -> Result<FittedModel, PointingError> {
    if pairs.is_empty() {
        return Err(PointingError::EmptyInput("no observation pairs to fit".into()));
    }

    let indices: BTreeSet<usize> = selected.iter().copied().collect();
    let (valid, out_of_range): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| i < pairs.len());

    if !out_of_range.is_empty() {
        log::warn!(
            target: ctx.target(),
            "ignoring {} selected indices past the {} available pairs",
            out_of_range.len(),
            pairs.len()
        );
    }
    if valid.is_empty() {
        return Err(PointingError::EmptyInput(format!(
            "no selected observation for model {}",
            model.name()
        )));
    }

    let subset: Vec<&TransformedPair> = valid.iter().map(|&i| &pairs[i]).collect();

    let result = levenberg_marquardt(
        |p| stacked_residuals(model.as_ref(), &subset, p),
        model.initial_parameters(),
        config,
    );

    let fitted = FittedModel {
        model: Arc::clone(model),
        parameters: result.params,
        status: result.status,
        iterations: result.iterations,
        cost: result.cost,
        n_points: subset.len(),
    };

    match fitted.status {
        FitStatus::Converged => log::info!(
            target: ctx.target(),
            "{} fitted on {} points in {} iterations, rms {:.2}\"",
            model.name(),
            fitted.n_points,
            fitted.iterations,
            fitted.rms().to_degrees() * 3600.0
        ),
        status => log::warn!(
            target: ctx.target(),
            "{} fit on {} points did not converge ({status}), keeping best parameters",
            model.name(),
            fitted.n_points
        ),
    }
    for parameter in fitted.named_parameters() {
        log::debug!(target: ctx.target(), "{parameter}");
    }

    Ok(fitted)
}
