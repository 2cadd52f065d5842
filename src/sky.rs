//! # Sky positions and reference frames
//!
//! A [`SkyPosition`] is a (longitude-like, latitude-like) pair of angles tagged with the
//! [`Frame`] it lives in and the epoch of the observation. Construction normalizes both
//! angles so that downstream code never has to:
//!
//! | Frame                        | longitude              | range      |
//! |------------------------------|------------------------|------------|
//! | [`Frame::Catalog`]           | right ascension        | `[0, 2π)`  |
//! | [`Frame::ApparentEquatorial`]| right ascension        | `[0, 2π)`  |
//! | [`Frame::Horizon`]           | azimuth                | `[0, 2π)`  |
//! | [`Frame::HourAngleDec`]      | hour angle             | `[-π, π)`  |
//!
//! The latitude-like angle (declination or altitude) is clamped to `[-π/2, π/2]`.
use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use hifitime::Epoch;
use serde::Deserialize;

use crate::constants::{Radian, DPI};

/// Origin and direction of azimuth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AzimuthConvention {
    /// North = 0, East = 90°.
    NorthEast,
    /// South = 0, West = 90°.
    SouthWest,
}

impl AzimuthConvention {
    /// Convert an azimuth measured from north through east to this convention.
    pub fn from_north_east(self, az: Radian) -> Radian {
        match self {
            AzimuthConvention::NorthEast => normalize_positive(az),
            AzimuthConvention::SouthWest => normalize_positive(az - PI),
        }
    }

    /// Convert an azimuth expressed in this convention to north-through-east.
    pub fn to_north_east(self, az: Radian) -> Radian {
        match self {
            AzimuthConvention::NorthEast => normalize_positive(az),
            AzimuthConvention::SouthWest => normalize_positive(az + PI),
        }
    }
}

/// Reference frame of a [`SkyPosition`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frame {
    /// Mean equator and equinox J2000 (catalog coordinates).
    Catalog,
    /// True equator and equinox of date, aberration applied.
    ApparentEquatorial,
    /// Local horizon (azimuth, altitude).
    Horizon(AzimuthConvention),
    /// Local hour angle and declination.
    HourAngleDec,
}

impl Frame {
    /// `true` if the longitude is a signed hour angle.
    pub fn signed_longitude(&self) -> bool {
        matches!(self, Frame::HourAngleDec)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Catalog => write!(f, "catalog"),
            Frame::ApparentEquatorial => write!(f, "apparent"),
            Frame::Horizon(AzimuthConvention::NorthEast) => write!(f, "horizon(N=0,E=90)"),
            Frame::Horizon(AzimuthConvention::SouthWest) => write!(f, "horizon(S=0,W=90)"),
            Frame::HourAngleDec => write!(f, "hadec"),
        }
    }
}

/// Wrap an angle to `[0, 2π)`.
pub fn normalize_positive(angle: Radian) -> Radian {
    let a = angle.rem_euclid(DPI);
    // rem_euclid can return exactly 2π for tiny negative inputs
    if a >= DPI {
        0.0
    } else {
        a
    }
}

/// Wrap an angle to `[-π, π)`.
pub fn normalize_signed(angle: Radian) -> Radian {
    normalize_positive(angle + PI) - PI
}

/// Clamp a latitude-like angle to `[-π/2, π/2]`.
pub fn clamp_latitude(angle: Radian) -> Radian {
    angle.clamp(-FRAC_PI_2, FRAC_PI_2)
}

/// A pair of angular coordinates in a given frame at a given epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkyPosition {
    /// Longitude-like angle (RA, azimuth or hour angle), radians.
    pub lon: Radian,
    /// Latitude-like angle (declination or altitude), radians.
    pub lat: Radian,
    pub frame: Frame,
    pub epoch: Epoch,
}

impl SkyPosition {
    /// Build a position, normalizing the angles for the frame.
    pub fn new(lon: Radian, lat: Radian, frame: Frame, epoch: Epoch) -> Self {
        let lon = if frame.signed_longitude() {
            normalize_signed(lon)
        } else {
            normalize_positive(lon)
        };

        SkyPosition {
            lon,
            lat: clamp_latitude(lat),
            frame,
            epoch,
        }
    }

    /// Catalog (J2000 equatorial) position.
    pub fn catalog(ra: Radian, dec: Radian, epoch: Epoch) -> Self {
        SkyPosition::new(ra, dec, Frame::Catalog, epoch)
    }

    /// Unit direction vector `(cos lat cos lon, cos lat sin lon, sin lat)`.
    pub fn unit_vector(&self) -> nalgebra::Vector3<f64> {
        let (sl, cl) = self.lon.sin_cos();
        let (sb, cb) = self.lat.sin_cos();
        nalgebra::Vector3::new(cb * cl, cb * sl, sb)
    }

    /// Position from a direction vector; the vector need not be normalized.
    pub fn from_vector(v: &nalgebra::Vector3<f64>, frame: Frame, epoch: Epoch) -> Self {
        let lon = v.y.atan2(v.x);
        let lat = v.z.atan2(v.x.hypot(v.y));
        SkyPosition::new(lon, lat, frame, epoch)
    }

    /// Great-circle separation from `other`, radians (frames are not checked).
    pub fn separation(&self, other: &SkyPosition) -> Radian {
        let a = self.unit_vector();
        let b = other.unit_vector();
        a.cross(&b).norm().atan2(a.dot(&b))
    }
}
