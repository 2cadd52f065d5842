//! # Frame transform engine
//!
//! Conversion of catalog (J2000 equatorial) positions to the local horizon or to
//! hour angle / declination, for a given site and epoch.
//!
//! Two engines implement the [`FrameTransform`] contract:
//!
//! - [`RigorousTransform`]: vector aberration from the Earth's orbital velocity, IAU 1976
//!   precession, IAU 1980 nutation, apparent sidereal time and a two-coefficient
//!   refraction model that accounts for humidity and wavelength.
//! - [`LegacyTransform`]: Meeus annual aberration, IAU 1976 precession, no nutation,
//!   mean sidereal time and the Bennett refraction formula scaled by pressure and
//!   temperature.
//!
//! ## Correction policy
//!
//! With `correct_catalog = true` the position goes through the apparent place
//! (aberration, precession, nutation where the engine applies it), is rotated to the
//! horizon with the local sidereal time, and gets a refraction adjustment computed from
//! the resulting altitude. With `correct_catalog = false` the position is rotated to the
//! horizon as given. The refraction uses the station pressure (QFE), never a sea-level
//! value, so a pressure of zero switches refraction off.
//!
//! ## Agreement between engines
//!
//! For altitudes above 10°, both engines place a star within
//! [`DIVERGENCE_BOUND_ARCSEC`] of each other; [`strategy_divergence`] measures the
//! separation and logs a warning when it is exceeded.
pub mod aberration;
pub mod legacy;
pub mod refraction;
pub mod rigorous;

use std::fmt;
use std::str::FromStr;

use hifitime::Epoch;
use serde::Deserialize;

use crate::constants::{ArcSec, Celsius, HectoPascal, Radian, RADSEC};
use crate::log_context::LogContext;
use crate::pointing_errors::PointingError;
use crate::site::SiteLocation;
use crate::sky::{AzimuthConvention, Frame, SkyPosition};
use crate::time::{resolve_time, ResolvedTime};

pub use legacy::LegacyTransform;
pub use rigorous::RigorousTransform;

/// Largest expected separation between the two engines above 10° altitude.
pub const DIVERGENCE_BOUND_ARCSEC: ArcSec = 120.0;

/// Ambient conditions at the telescope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atmosphere {
    /// Air temperature, °C.
    pub temperature: Celsius,
    /// Station pressure (QFE), hPa.
    pub pressure: HectoPascal,
    /// Relative humidity, 0..1.
    pub humidity: f64,
}

impl Atmosphere {
    pub fn new(temperature: Celsius, pressure: HectoPascal, humidity: f64) -> Self {
        Atmosphere {
            temperature,
            pressure,
            humidity,
        }
    }

    /// Zero pressure: no refraction.
    pub fn vacuum() -> Self {
        Atmosphere::new(0.0, 0.0, 0.0)
    }
}

/// Convert hour angle and declination to (azimuth from north through east, altitude).
pub fn hadec_to_horizon(ha: Radian, dec: Radian, lat: Radian) -> (Radian, Radian) {
    let (sh, ch) = ha.sin_cos();
    let (sd, cd) = dec.sin_cos();
    let (sp, cp) = lat.sin_cos();

    let alt = (sp * sd + cp * cd * ch).clamp(-1.0, 1.0).asin();
    let az = (-cd * sh).atan2(sd * cp - cd * ch * sp);
    (az, alt)
}

/// Convert (azimuth from north through east, altitude) to hour angle and declination.
pub fn horizon_to_hadec(az: Radian, alt: Radian, lat: Radian) -> (Radian, Radian) {
    let (sa, ca) = az.sin_cos();
    let (se, ce) = alt.sin_cos();
    let (sp, cp) = lat.sin_cos();

    let dec = (sp * se + cp * ce * ca).clamp(-1.0, 1.0).asin();
    let ha = (-ce * sa).atan2(cp * se - sp * ce * ca);
    (ha, dec)
}

/// Contract shared by the rigorous and legacy engines.
///
/// Implementors provide the engine-specific pieces (apparent place, sidereal time,
/// refraction); the frame conversions themselves are provided methods, so both engines
/// share the exact same horizon geometry and correction policy.
pub trait FrameTransform {
    /// Short engine name, used in logs and artifact tags.
    fn name(&self) -> &'static str;

    /// Azimuth convention of the horizon positions this engine returns.
    fn azimuth_convention(&self) -> AzimuthConvention;

    fn log_context(&self) -> &LogContext;

    /// Apparent place of a catalog position at a resolved epoch, as a direction of the
    /// equator and equinox of date.
    fn apparent_place_at(&self, equatorial: &SkyPosition, time: &ResolvedTime) -> SkyPosition;

    /// Greenwich sidereal time used by this engine, radians.
    fn greenwich_sidereal_time(&self, time: &ResolvedTime) -> Radian;

    /// Refraction altitude adjustment for a geometric altitude, radians (positive = up).
    fn refraction(&self, altitude: Radian, atmosphere: &Atmosphere) -> Radian;

    /// Apparent place (aberration, precession and nutation where applied) of a catalog position.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::InvalidTime`] if `time` cannot be resolved.
    fn apparent_place(
        &self,
        equatorial: &SkyPosition,
        time: Epoch,
    ) -> Result<SkyPosition, PointingError> {
        let t = resolve_time(time)?;
        Ok(self.apparent_place_at(equatorial, &t))
    }

    /// Local sidereal time at the site, radians.
    fn local_sidereal_time(
        &self,
        time: Epoch,
        site: &SiteLocation,
    ) -> Result<Radian, PointingError> {
        site.validate()?;
        let t = resolve_time(time)?;
        Ok(self.greenwich_sidereal_time(&t) + site.lon_rad())
    }

    /// Convert an equatorial position to the horizon frame.
    ///
    /// Arguments
    /// -----------------
    /// * `equatorial`: catalog position (or an apparent place, when `correct_catalog` is false).
    /// * `time`: observation epoch.
    /// * `site`: telescope location.
    /// * `atmosphere`: ambient conditions; only read when `correct_catalog` is true.
    /// * `correct_catalog`: apply aberration, precession, nutation and refraction.
    ///
    /// Return
    /// ----------
    /// * A [`SkyPosition`] in [`Frame::Horizon`] with this engine's azimuth convention.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::InvalidSite`] or [`PointingError::InvalidTime`].
    fn to_horizon(
        &self,
        equatorial: &SkyPosition,
        time: Epoch,
        site: &SiteLocation,
        atmosphere: &Atmosphere,
        correct_catalog: bool,
    ) -> Result<SkyPosition, PointingError> {
        site.validate()?;
        let t = resolve_time(time)?;

        let position = if correct_catalog {
            self.apparent_place_at(equatorial, &t)
        } else {
            *equatorial
        };

        let last = self.greenwich_sidereal_time(&t) + site.lon_rad();
        let (az, alt) = hadec_to_horizon(last - position.lon, position.lat, site.lat_rad());

        let alt = if correct_catalog {
            let refraction = self.refraction(alt, atmosphere);
            log::trace!(
                target: self.log_context().target(),
                "{}: alt {:.6} rad, refraction {:.2}\"",
                self.name(),
                alt,
                refraction / RADSEC
            );
            alt + refraction
        } else {
            alt
        };

        let convention = self.azimuth_convention();
        Ok(SkyPosition::new(
            convention.from_north_east(az),
            alt,
            Frame::Horizon(convention),
            time,
        ))
    }

    /// Convert a horizon position to hour angle and declination.
    ///
    /// The azimuth convention is read from the position's frame tag; a position in any
    /// other frame is taken to use this engine's convention. No refraction is removed.
    fn to_hour_angle_dec(
        &self,
        horizon: &SkyPosition,
        time: Epoch,
        site: &SiteLocation,
    ) -> Result<SkyPosition, PointingError> {
        site.validate()?;
        resolve_time(time)?;

        let convention = match horizon.frame {
            Frame::Horizon(c) => c,
            _ => self.azimuth_convention(),
        };

        let az = convention.to_north_east(horizon.lon);
        let (ha, dec) = horizon_to_hadec(az, horizon.lat, site.lat_rad());
        Ok(SkyPosition::new(ha, dec, Frame::HourAngleDec, time))
    }
}

/// Which engine implements the frame transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStrategy {
    #[default]
    #[serde(alias = "rg", alias = "astropy")]
    Rigorous,
    #[serde(alias = "lg", alias = "libnova")]
    Legacy,
}

impl TransformStrategy {
    /// Two-letter tag used in artifact names.
    pub fn tag(&self) -> &'static str {
        match self {
            TransformStrategy::Rigorous => "RG",
            TransformStrategy::Legacy => "LG",
        }
    }

    /// Build the engine, optionally overriding its default azimuth convention.
    pub fn engine(
        &self,
        convention: Option<AzimuthConvention>,
        ctx: &LogContext,
    ) -> Box<dyn FrameTransform> {
        let ctx = ctx.child("transform");
        match self {
            TransformStrategy::Rigorous => {
                let engine = RigorousTransform::new(ctx);
                Box::new(match convention {
                    Some(c) => engine.with_azimuth_convention(c),
                    None => engine,
                })
            }
            TransformStrategy::Legacy => {
                let engine = LegacyTransform::new(ctx);
                Box::new(match convention {
                    Some(c) => engine.with_azimuth_convention(c),
                    None => engine,
                })
            }
        }
    }
}

impl fmt::Display for TransformStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformStrategy::Rigorous => write!(f, "rigorous"),
            TransformStrategy::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for TransformStrategy {
    type Err = PointingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rigorous" | "rg" | "astropy" => Ok(TransformStrategy::Rigorous),
            "legacy" | "lg" | "libnova" => Ok(TransformStrategy::Legacy),
            other => Err(PointingError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Separation between the horizon positions two engines give for the same star.
///
/// Both engines must use the same azimuth convention. When the star is above 10° and
/// the separation exceeds [`DIVERGENCE_BOUND_ARCSEC`], a warning is logged; it is never
/// an error.
///
/// Return
/// ----------
/// * The separation in arcseconds.
pub fn strategy_divergence(
    first: &dyn FrameTransform,
    second: &dyn FrameTransform,
    equatorial: &SkyPosition,
    time: Epoch,
    site: &SiteLocation,
    atmosphere: &Atmosphere,
) -> Result<ArcSec, PointingError> {
    let a = first.to_horizon(equatorial, time, site, atmosphere, true)?;
    let b = second.to_horizon(equatorial, time, site, atmosphere, true)?;

    let separation = a.separation(&b) / RADSEC;
    if a.lat > 10f64.to_radians() && separation > DIVERGENCE_BOUND_ARCSEC {
        log::warn!(
            target: first.log_context().target(),
            "{} and {} differ by {:.1}\" at altitude {:.2}°",
            first.name(),
            second.name(),
            separation,
            a.lat.to_degrees()
        );
    }
    Ok(separation)
}

#[cfg(test)]
mod transform_test {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_zenith_and_meridian() {
        let lat = 0.7;
        // a star on the meridian at dec = lat is at the zenith
        let (_, alt) = hadec_to_horizon(0.0, lat, lat);
        assert_relative_eq!(alt, FRAC_PI_2, epsilon = 1e-12);

        // south of the zenith on the meridian: azimuth 180° (north-east convention)
        let (az, alt) = hadec_to_horizon(0.0, 0.2, lat);
        assert_relative_eq!(az.abs(), std::f64::consts::PI, epsilon = 1e-12);
        assert_relative_eq!(alt, FRAC_PI_2 - (lat - 0.2), epsilon = 1e-12);
    }

    #[test]
    fn test_east_is_rising() {
        // negative hour angle: star rises in the east
        let (az, _) = hadec_to_horizon(-1.0, 0.0, 0.5);
        assert!(az > 0.0 && az < std::f64::consts::PI);
    }

    #[test]
    fn test_horizon_round_trip() {
        let lat = -1.3107;
        for (ha, dec) in [(0.3, -0.5), (-2.0, 0.1), (2.9, -1.2)] {
            let (az, alt) = hadec_to_horizon(ha, dec, lat);
            let (ha2, dec2) = horizon_to_hadec(az, alt, lat);
            assert_relative_eq!(ha, ha2, epsilon = 1e-12);
            assert_relative_eq!(dec, dec2, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_strategy_from_str() {
        assert_eq!("LG".parse::<TransformStrategy>().unwrap(), TransformStrategy::Legacy);
        assert_eq!(
            "rigorous".parse::<TransformStrategy>().unwrap(),
            TransformStrategy::Rigorous
        );
        assert!(matches!(
            "foo".parse::<TransformStrategy>(),
            Err(PointingError::UnknownStrategy(_))
        ));
    }

    #[test]
    fn test_engine_conventions() {
        let ctx = LogContext::default();
        assert_eq!(
            TransformStrategy::Rigorous
                .engine(None, &ctx)
                .azimuth_convention(),
            AzimuthConvention::NorthEast
        );
        assert_eq!(
            TransformStrategy::Legacy
                .engine(None, &ctx)
                .azimuth_convention(),
            AzimuthConvention::SouthWest
        );
        assert_eq!(
            TransformStrategy::Legacy
                .engine(Some(AzimuthConvention::NorthEast), &ctx)
                .azimuth_convention(),
            AzimuthConvention::NorthEast
        );
    }
}
