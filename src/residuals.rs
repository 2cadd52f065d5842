//! Per-star raw differences and model residuals.
use crate::constants::{ArcSec, Radian, RADSEC};
use crate::models::FittedModel;
use crate::observations::TransformedPair;
use crate::sky::SkyPosition;

/// Catalog and mount position of one star with its raw difference and its residual after
/// the fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ResidualPoint {
    pub catalog: SkyPosition,
    pub mount: SkyPosition,
    /// Catalog − mount longitude, wrapped to `[-π, π)`.
    pub df_lon: Radian,
    /// Catalog − mount latitude.
    pub df_lat: Radian,
    /// Longitude residual on the sky after the model.
    pub res_lon: Radian,
    pub res_lat: Radian,
    pub nml_id: u64,
    pub image: Option<String>,
}

impl ResidualPoint {
    /// Squared residual distance, rad².
    pub fn dist2(&self) -> f64 {
        self.res_lat * self.res_lat + self.res_lon * self.res_lon
    }
}

/// Which per-point quantity a statistic or a plot axis is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResidualAxis {
    DifferenceLon,
    DifferenceLat,
    ResidualLon,
    ResidualLat,
}

impl ResidualAxis {
    pub const ALL: [ResidualAxis; 4] = [
        ResidualAxis::DifferenceLon,
        ResidualAxis::DifferenceLat,
        ResidualAxis::ResidualLon,
        ResidualAxis::ResidualLat,
    ];

    /// Value of this quantity for a point, radians.
    pub fn value(&self, point: &ResidualPoint) -> Radian {
        match self {
            ResidualAxis::DifferenceLon => point.df_lon,
            ResidualAxis::DifferenceLat => point.df_lat,
            ResidualAxis::ResidualLon => point.res_lon,
            ResidualAxis::ResidualLat => point.res_lat,
        }
    }

    /// Values of this quantity over `points`, arcseconds.
    pub fn arcsec(&self, points: &[ResidualPoint]) -> Vec<ArcSec> {
        points.iter().map(|p| self.value(p) / RADSEC).collect()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ResidualAxis::DifferenceLon => "difference_lon",
            ResidualAxis::DifferenceLat => "difference_lat",
            ResidualAxis::ResidualLon => "residual_lon",
            ResidualAxis::ResidualLat => "residual_lat",
        }
    }
}

/// Evaluate `fitted` on every pair.
///
/// All pairs get a residual, including those left out of the fit, so that the selection
/// filter can reclassify them.
pub fn build_residuals(pairs: &[TransformedPair], fitted: &FittedModel) -> Vec<ResidualPoint> {
    pairs
        .iter()
        .map(|pair| {
            let (df_lon, df_lat) = pair.raw_difference();
            let (lon, lat) = (pair.catalog.lon, pair.catalog.lat);

            ResidualPoint {
                catalog: pair.catalog,
                mount: pair.mount,
                df_lon,
                df_lat,
                res_lon: fitted.longitude_residual(lon, lat, df_lon),
                res_lat: fitted.latitude_residual(lon, lat, df_lat),
                nml_id: pair.nml_id,
                image: pair.image.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod residuals_test {
    use super::*;
    use crate::fitting::FitStatus;
    use crate::models::{Condon1992, PointingModel};
    use crate::sky::{AzimuthConvention, Frame};
    use approx::assert_relative_eq;
    use hifitime::Epoch;
    use nalgebra::DVector;
    use std::sync::Arc;

    #[test]
    fn test_residual_after_index_offsets() {
        let epoch = Epoch::from_gregorian_utc_at_midnight(2021, 1, 1);
        let frame = Frame::Horizon(AzimuthConvention::NorthEast);
        let model: Arc<dyn PointingModel> = Arc::new(Condon1992::new());
        let mut parameters = DVector::zeros(8);
        parameters[5] = 10.0 * RADSEC; // IE

        let fitted = FittedModel {
            model,
            parameters,
            status: FitStatus::Converged,
            iterations: 1,
            cost: 0.0,
            n_points: 1,
        };

        // mount sits 12" below the catalog at azimuth just past north
        let pair = TransformedPair {
            catalog: SkyPosition::new(0.001, 0.8, frame, epoch),
            mount: SkyPosition::new(-0.001, 0.8 - 12.0 * RADSEC, frame, epoch),
            nml_id: 7,
            image: Some("a.fits".into()),
        };

        let points = build_residuals(&[pair], &fitted);
        assert_eq!(points.len(), 1);
        let p = &points[0];
        assert_relative_eq!(p.df_lon, 0.002, epsilon = 1e-12);
        assert_relative_eq!(p.res_lon, 0.002 * 0.8f64.cos(), epsilon = 1e-12);
        assert_relative_eq!(p.res_lat / RADSEC, 2.0, epsilon = 1e-6);
        assert_relative_eq!(
            ResidualAxis::ResidualLat.arcsec(&points)[0],
            2.0,
            epsilon = 1e-6
        );
        assert_eq!(p.nml_id, 7);
    }
}
