use std::fmt;

use crate::log_context::LogContext;
use crate::pointing_errors::PointingError;
use crate::sky::SkyPosition;
use crate::transform::{Atmosphere, FrameTransform};

use super::ObservationRecord;

/// Frame in which catalog and mount positions are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitFrame {
    /// Azimuth / altitude.
    #[default]
    Horizon,
    /// Hour angle / declination.
    HourAngleDec,
}

impl FitFrame {
    /// Axis names used in artifact file names.
    pub fn axes(&self) -> &'static str {
        match self {
            FitFrame::Horizon => "az_alt",
            FitFrame::HourAngleDec => "ha_dec",
        }
    }
}

impl fmt::Display for FitFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitFrame::Horizon => write!(f, "AltAz"),
            FitFrame::HourAngleDec => write!(f, "HA/Dec"),
        }
    }
}

/// Catalog and mount position of one observation, in the same frame.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedPair {
    /// Fully corrected catalog position.
    pub catalog: SkyPosition,
    /// Mount position, converted without corrections.
    pub mount: SkyPosition,
    pub nml_id: u64,
    pub image: Option<String>,
}

impl TransformedPair {
    /// Catalog minus mount, longitude wrapped to `[-π, π)`.
    pub fn raw_difference(&self) -> (f64, f64) {
        (
            crate::sky::normalize_signed(self.catalog.lon - self.mount.lon),
            self.catalog.lat - self.mount.lat,
        )
    }
}

fn to_frame(
    engine: &dyn FrameTransform,
    record: &ObservationRecord,
    position: &SkyPosition,
    atmosphere: &Atmosphere,
    correct: bool,
    frame: FitFrame,
) -> Result<SkyPosition, PointingError> {
    let horizon = engine.to_horizon(position, record.epoch, &record.site, atmosphere, correct)?;
    match frame {
        FitFrame::Horizon => Ok(horizon),
        FitFrame::HourAngleDec => engine.to_hour_angle_dec(&horizon, record.epoch, &record.site),
    }
}

/// Convert every record to a [`TransformedPair`] in `frame`.
///
/// The catalog position gets the full correction (aberration, precession, nutation where
/// the engine applies it, refraction with the record's station pressure). The mount position
/// is converted with no correction and a vacuum atmosphere. The hour-angle path goes through
/// the horizon exactly as the horizon path does.
///
/// Errors
/// ----------
/// * [`PointingError::InvalidSite`] or [`PointingError::InvalidTime`] from the engine.
pub fn transform_batch(
    records: &[ObservationRecord],
    engine: &dyn FrameTransform,
    frame: FitFrame,
    ctx: &LogContext,
) -> Result<Vec<TransformedPair>, PointingError> {
    let pairs = records
        .iter()
        .map(|record| {
            let catalog = to_frame(
                engine,
                record,
                &record.catalog,
                &record.atmosphere,
                true,
                frame,
            )?;
            let mount = to_frame(
                engine,
                record,
                &record.mount,
                &Atmosphere::vacuum(),
                false,
                frame,
            )?;

            Ok(TransformedPair {
                catalog,
                mount,
                nml_id: record.nml_id,
                image: record.image.clone(),
            })
        })
        .collect::<Result<Vec<_>, PointingError>>()?;

    log::info!(
        target: ctx.target(),
        "transformed {} observations to {} with the {} engine",
        pairs.len(),
        frame,
        engine.name()
    );

    Ok(pairs)
}

#[cfg(test)]
mod pairs_test {
    use super::*;
    use crate::observations::observations_test::row;
    use crate::observations::{load, MemoryObservationStore, MountSource};
    use crate::site::SiteLocation;
    use crate::sky::Frame;
    use crate::transform::TransformStrategy;
    use std::sync::Arc;

    fn records() -> Vec<ObservationRecord> {
        let store = MemoryObservationStore::new(vec![row(1, true, true), row(2, true, true)]);
        let site = Arc::new(SiteLocation::new(123.3, -75.1, 3237.0).unwrap());
        let ctx = LogContext::default();
        load(&store, site, None, MountSource::Astrometric, &ctx)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_horizon_pairs() {
        let ctx = LogContext::default();
        let engine = TransformStrategy::Rigorous.engine(None, &ctx);
        let pairs = transform_batch(&records(), engine.as_ref(), FitFrame::Horizon, &ctx).unwrap();

        assert_eq!(pairs.len(), 2);
        assert!(matches!(pairs[0].catalog.frame, Frame::Horizon(_)));
        assert_eq!(pairs[0].catalog.frame, pairs[0].mount.frame);
        assert_eq!(pairs[1].image.as_deref(), Some("img_0002.fits"));

        // precession since J2000 dominates the raw difference
        let (dlon, dlat) = pairs[0].raw_difference();
        assert!(dlon.abs() < 0.02 && dlat.abs() < 0.02);
    }

    #[test]
    fn test_hadec_pairs() {
        let ctx = LogContext::default();
        let engine = TransformStrategy::Legacy.engine(None, &ctx);
        let pairs =
            transform_batch(&records(), engine.as_ref(), FitFrame::HourAngleDec, &ctx).unwrap();

        for pair in &pairs {
            assert_eq!(pair.catalog.frame, Frame::HourAngleDec);
            assert!(pair.catalog.lon >= -std::f64::consts::PI);
            assert!(pair.catalog.lon < std::f64::consts::PI);
        }
    }
}
