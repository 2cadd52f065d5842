use ordered_float::NotNan;

use crate::constants::{Degree, Meter, Radian};
use crate::pointing_errors::PointingError;

/// Geographic location of the telescope, fixed for a run.
///
/// Coordinates are stored as `NotNan` so a site that passed construction can be shared
/// across threads and records without further checks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteLocation {
    /// Geographic longitude in degrees, east positive.
    pub longitude: NotNan<f64>,
    /// Geographic latitude in degrees.
    pub latitude: NotNan<f64>,
    /// Height above sea level in meters.
    pub height: NotNan<f64>,
}

impl SiteLocation {
    /// Create a new site.
    ///
    /// Arguments
    /// -----------------
    /// * `longitude`: degrees, east positive.
    /// * `latitude`: degrees, in `[-90, 90]`.
    /// * `height`: meters above sea level.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::InvalidSite`] if any value is not finite or the latitude is out of range.
    pub fn new(longitude: Degree, latitude: Degree, height: Meter) -> Result<Self, PointingError> {
        for (name, value) in [
            ("longitude", longitude),
            ("latitude", latitude),
            ("height", height),
        ] {
            if !value.is_finite() {
                return Err(PointingError::InvalidSite(format!("{name} = {value}")));
            }
        }

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(PointingError::InvalidSite(format!(
                "latitude {latitude} outside [-90, 90]"
            )));
        }

        Ok(SiteLocation {
            longitude: NotNan::new(longitude)?,
            latitude: NotNan::new(latitude)?,
            height: NotNan::new(height)?,
        })
    }

    /// Longitude in radians, east positive.
    pub fn lon_rad(&self) -> Radian {
        self.longitude.into_inner().to_radians()
    }

    /// Latitude in radians.
    pub fn lat_rad(&self) -> Radian {
        self.latitude.into_inner().to_radians()
    }

    /// Re-check the site before a transform.
    ///
    /// Fields are public, so a site can be altered after construction.
    pub fn validate(&self) -> Result<(), PointingError> {
        SiteLocation::new(*self.longitude, *self.latitude, *self.height).map(|_| ())
    }
}
