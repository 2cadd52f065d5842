use crate::constants::Radian;
use crate::earth_orientation::{equequ, nutation_matrix, precession_matrix};
use crate::log_context::LogContext;
use crate::sky::{AzimuthConvention, Frame, SkyPosition};
use crate::time::{gmst, ResolvedTime};

use super::aberration::{aberrate, earth_velocity};
use super::refraction::tan_model_refraction;
use super::{Atmosphere, FrameTransform};

/// Full-precision engine.
///
/// * aberration: Earth's orbital velocity added to the J2000 direction,
/// * precession (IAU 1976) then nutation (IAU 1980) to the true equator of date,
/// * Greenwich apparent sidereal time (GMST + equation of the equinoxes),
/// * refraction `A·tan z + B·tan³ z` with humidity and wavelength dependent coefficients.
///
/// Horizon positions default to azimuth measured from north through east.
#[derive(Debug, Clone)]
pub struct RigorousTransform {
    convention: AzimuthConvention,
    ctx: LogContext,
}

impl RigorousTransform {
    pub fn new(ctx: LogContext) -> Self {
        RigorousTransform {
            convention: AzimuthConvention::NorthEast,
            ctx,
        }
    }

    pub fn with_azimuth_convention(mut self, convention: AzimuthConvention) -> Self {
        self.convention = convention;
        self
    }
}

impl FrameTransform for RigorousTransform {
    fn name(&self) -> &'static str {
        "rigorous"
    }

    fn azimuth_convention(&self) -> AzimuthConvention {
        self.convention
    }

    fn log_context(&self) -> &LogContext {
        &self.ctx
    }

    fn apparent_place_at(&self, equatorial: &SkyPosition, time: &ResolvedTime) -> SkyPosition {
        let beta = earth_velocity(time);
        let aberrated = aberrate(&equatorial.unit_vector(), &beta);

        let npb = nutation_matrix(time.mjd_tt) * precession_matrix(time.mjd_tt);
        SkyPosition::from_vector(&(npb * aberrated), Frame::ApparentEquatorial, time.epoch)
    }

    fn greenwich_sidereal_time(&self, time: &ResolvedTime) -> Radian {
        gmst(time.mjd_utc) + equequ(time.mjd_tt)
    }

    fn refraction(&self, altitude: Radian, atmosphere: &Atmosphere) -> Radian {
        tan_model_refraction(
            altitude,
            atmosphere.pressure,
            atmosphere.temperature,
            atmosphere.humidity,
        )
    }
}
