use crate::constants::Radian;
use crate::earth_orientation::precession_matrix;
use crate::log_context::LogContext;
use crate::sky::{AzimuthConvention, Frame, SkyPosition};
use crate::time::{mean_sidereal_time_jd, ResolvedTime};

use super::aberration::meeus_aberration;
use super::refraction::bennett_refraction;
use super::{Atmosphere, FrameTransform};

/// Simplified engine following the classical almanac recipes.
///
/// * aberration: Meeus correction from the Sun's true longitude,
/// * precession (IAU 1976), no nutation,
/// * Greenwich mean sidereal time from the UTC Julian Date,
/// * Bennett refraction scaled by `(P/1010)·(283/(273+T))`.
///
/// Horizon positions default to azimuth measured from south through west.
#[derive(Debug, Clone)]
pub struct LegacyTransform {
    convention: AzimuthConvention,
    ctx: LogContext,
}

impl LegacyTransform {
    pub fn new(ctx: LogContext) -> Self {
        LegacyTransform {
            convention: AzimuthConvention::SouthWest,
            ctx,
        }
    }

    pub fn with_azimuth_convention(mut self, convention: AzimuthConvention) -> Self {
        self.convention = convention;
        self
    }
}

impl FrameTransform for LegacyTransform {
    fn name(&self) -> &'static str {
        "legacy"
    }

    fn azimuth_convention(&self) -> AzimuthConvention {
        self.convention
    }

    fn log_context(&self) -> &LogContext {
        &self.ctx
    }

    fn apparent_place_at(&self, equatorial: &SkyPosition, time: &ResolvedTime) -> SkyPosition {
        let (dra, ddec) = meeus_aberration(equatorial.lon, equatorial.lat, time);
        let aberrated = SkyPosition::new(
            equatorial.lon + dra,
            equatorial.lat + ddec,
            equatorial.frame,
            equatorial.epoch,
        );

        let precessed = precession_matrix(time.mjd_tt) * aberrated.unit_vector();
        SkyPosition::from_vector(&precessed, Frame::ApparentEquatorial, time.epoch)
    }

    fn greenwich_sidereal_time(&self, time: &ResolvedTime) -> Radian {
        mean_sidereal_time_jd(time.jd_utc())
    }

    fn refraction(&self, altitude: Radian, atmosphere: &Atmosphere) -> Radian {
        bennett_refraction(altitude, atmosphere.pressure, atmosphere.temperature)
    }
}
