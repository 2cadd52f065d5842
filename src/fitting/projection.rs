use itertools::{Itertools, MinMaxResult};
use nalgebra::DVector;

use crate::pointing_errors::PointingError;

use super::least_squares::{levenberg_marquardt, FitStatus, LeastSquaresConfig};

/// Gaussian profile fitted to a histogram of residuals along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionFit {
    /// Centre of the profile, same unit as the input values.
    pub mean: f64,
    /// Standard deviation of the profile (always ≥ 0).
    pub spread: f64,
    /// Height of the profile, in counts per bin.
    pub peak: f64,
    pub status: FitStatus,
}

/// A histogram over `[min, max]` with equal-width bins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Histogram {
    pub centres: Vec<f64>,
    pub counts: Vec<f64>,
    pub width: f64,
}

impl Histogram {
    /// Bin `values` into `bins` bins spanning their range; the maximum falls in the last bin.
    pub fn new(values: &[f64], min: f64, max: f64, bins: usize) -> Result<Self, PointingError> {
        if bins == 0 {
            return Err(PointingError::InvalidConfiguration(
                "projection histogram needs at least one bin".into(),
            ));
        }
        let width = (max - min) / bins as f64;
        let mut counts = vec![0.0; bins];

        for &v in values {
            let index = (((v - min) / width) as usize).min(bins - 1);
            counts[index] += 1.0;
        }

        let centres = (0..bins)
            .map(|i| min + (i as f64 + 0.5) * width)
            .collect();

        Ok(Histogram {
            centres,
            counts,
            width,
        })
    }

    /// Count-weighted RMS deviation of the bin centres about their weighted mean.
    pub fn weighted_rms(&self) -> f64 {
        let total: f64 = self.counts.iter().sum();
        if total == 0.0 {
            return 0.0;
        }
        let mean = self
            .centres
            .iter()
            .zip(&self.counts)
            .map(|(x, n)| x * n)
            .sum::<f64>()
            / total;

        (self
            .centres
            .iter()
            .zip(&self.counts)
            .map(|(x, n)| (x - mean).powi(2) * n)
            .sum::<f64>()
            / total)
            .sqrt()
    }
}

fn gaussian(x: f64, mean: f64, spread: f64, peak: f64) -> f64 {
    peak * (-(x - mean).powi(2) / (2.0 * spread * spread)).exp()
}

/// Fit a Gaussian profile to the histogram of `values`.
///
/// Arguments
/// -----------------
/// * `values`: signed residuals along one axis (any unit; arcseconds in practice).
/// * `bins`: number of histogram bins over `[min, max]` of the values.
///
/// Return
/// ----------
/// * A [`ProjectionFit`]. The fit starts from mean 0, the weighted RMS of the bin centres
///   and the tallest bin. When all values are equal the result is `(value, 0, count)` without
///   fitting. Non-convergence is reported in `status`, not as an error.
///
/// Errors
/// ----------
/// * [`PointingError::EmptyInput`] if `values` is empty.
/// * [`PointingError::InvalidConfiguration`] if `bins` is zero or a value is not finite.
pub fn fit_projection(values: &[f64], bins: usize) -> Result<ProjectionFit, PointingError> {
    if bins == 0 {
        return Err(PointingError::InvalidConfiguration(
            "projection histogram needs at least one bin".into(),
        ));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(PointingError::InvalidConfiguration(
            "projection values must be finite".into(),
        ));
    }

    let (min, max) = match values.iter().copied().minmax_by(f64::total_cmp) {
        MinMaxResult::NoElements => {
            return Err(PointingError::EmptyInput("no values to project".into()))
        }
        MinMaxResult::OneElement(v) => (v, v),
        MinMaxResult::MinMax(min, max) => (min, max),
    };

    if max - min == 0.0 {
        return Ok(ProjectionFit {
            mean: min,
            spread: 0.0,
            peak: values.len() as f64,
            status: FitStatus::Converged,
        });
    }

    let histogram = Histogram::new(values, min, max, bins)?;
    let peak = histogram.counts.iter().copied().fold(0.0, f64::max);
    let spread = match histogram.weighted_rms() {
        rms if rms > 0.0 => rms,
        _ => histogram.width,
    };

    let residuals = |p: &DVector<f64>| {
        DVector::from_iterator(
            histogram.centres.len(),
            histogram
                .centres
                .iter()
                .zip(&histogram.counts)
                .map(|(&x, &n)| n - gaussian(x, p[0], p[1], p[2])),
        )
    };

    let result = levenberg_marquardt(
        residuals,
        DVector::from_vec(vec![0.0, spread, peak]),
        &LeastSquaresConfig::default(),
    );

    Ok(ProjectionFit {
        mean: result.params[0],
        spread: result.params[1].abs(),
        peak: result.params[2],
        status: result.status,
    })
}

#[cfg(test)]
mod projection_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_histogram_bins() {
        let h = Histogram::new(&[0.0, 0.1, 0.5, 1.0], 0.0, 1.0, 2).unwrap();
        assert_eq!(h.counts, vec![2.0, 2.0]);
        assert_eq!(h.centres, vec![0.25, 0.75]);
    }

    #[test]
    fn test_histogram_without_bins() {
        assert!(matches!(
            Histogram::new(&[0.0, 1.0], 0.0, 1.0, 0),
            Err(PointingError::InvalidConfiguration(_))
        ));
        // a constant sample returns before any binning; zero bins is still refused
        assert!(matches!(
            fit_projection(&[2.0, 2.0], 0),
            Err(PointingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_errors() {
        assert!(fit_projection(&[], 10).unwrap_err().is_empty_input());
        assert!(matches!(
            fit_projection(&[1.0, 2.0], 0),
            Err(PointingError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_degenerate_range() {
        let fit = fit_projection(&[3.5, 3.5, 3.5], 40).unwrap();
        assert_eq!(fit.mean, 3.5);
        assert_eq!(fit.spread, 0.0);
        assert_eq!(fit.peak, 3.0);
    }

    #[test]
    fn test_offset_profile() {
        // triangular sample centred on 0.8
        let values: Vec<f64> = (0..2000)
            .map(|i| {
                let u = (i as f64 + 0.5) / 2000.0;
                let v = ((i * 7919) % 2000) as f64 / 2000.0;
                0.8 + 3.0 * (u + v - 1.0)
            })
            .collect();

        let fit = fit_projection(&values, 30).unwrap();
        assert_eq!(fit.status, FitStatus::Converged);
        assert_relative_eq!(fit.mean, 0.8, epsilon = 0.2);
        assert!(fit.spread > 0.5 && fit.spread < 2.0);
    }
}
