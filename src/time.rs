use hifitime::Epoch;

use crate::constants::{DAYS_PER_CENTURY, DPI, JDTOMJD, MAX_CENTURIES_FROM_J2000, MJD, T2000};
use crate::pointing_errors::PointingError;

/// An observation epoch expressed in the time scales the frame transforms need.
///
/// UT1 is approximated by UTC (|UT1 − UTC| < 0.9 s), which shifts sidereal time
/// by at most ~13 arcseconds; both transform strategies share this approximation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedTime {
    /// The original epoch.
    pub epoch: Epoch,
    /// Modified Julian Date in the UTC scale (used as UT1).
    pub mjd_utc: MJD,
    /// Modified Julian Date in the TT scale (precession, nutation).
    pub mjd_tt: MJD,
}

impl ResolvedTime {
    /// Julian Date in the UTC scale.
    pub fn jd_utc(&self) -> f64 {
        self.mjd_utc + JDTOMJD
    }

    /// Julian centuries of TT elapsed since J2000.0.
    pub fn centuries_tt(&self) -> f64 {
        (self.mjd_tt - T2000) / DAYS_PER_CENTURY
    }
}

/// Resolve an epoch into UTC and TT Modified Julian Dates.
///
/// Arguments
/// -----------------
/// * `epoch`: the observation time.
///
/// Return
/// ----------
/// * A [`ResolvedTime`] carrying both scales.
///
/// Errors
/// ----------
/// * [`PointingError::InvalidTime`] if the dates are not finite or fall outside
///   [`MAX_CENTURIES_FROM_J2000`] of J2000, where sidereal time and the precession
///   polynomials are no longer meaningful.
pub fn resolve_time(epoch: Epoch) -> Result<ResolvedTime, PointingError> {
    let mjd_utc = epoch.to_mjd_utc_days();
    let mjd_tt = epoch.to_mjd_tt_days();

    if !mjd_utc.is_finite() || !mjd_tt.is_finite() {
        return Err(PointingError::InvalidTime(format!("{epoch}")));
    }

    let centuries = (mjd_tt - T2000) / DAYS_PER_CENTURY;
    if centuries.abs() > MAX_CENTURIES_FROM_J2000 {
        return Err(PointingError::InvalidTime(format!(
            "{epoch} is {centuries:.1} centuries from J2000"
        )));
    }

    Ok(ResolvedTime {
        epoch,
        mjd_utc,
        mjd_tt,
    })
}

/// Parse an ISO-8601 / hifitime date string into an [`Epoch`].
///
/// Strings without an explicit time scale are read as UTC.
pub fn parse_epoch(date: &str) -> Result<Epoch, PointingError> {
    date.trim()
        .parse::<Epoch>()
        .map_err(|e| PointingError::InvalidTime(format!("{date}: {e}")))
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
///
/// # References
/// * IAU 1982, IERS Conventions 1996/2000.
/// * Explanatory Supplement to the Astronomical Almanac (1992).
pub fn gmst(tjm: f64) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / DAYS_PER_CENTURY;

    // GMST at 0h UT1, seconds → radians
    let gmst0 = (((C3 * t + C2) * t + C1) * t + C0) * DPI / 86400.0;

    // rotation accumulated since 0h UT1
    let h = tjm.fract() * DPI;

    (gmst0 + h * RAP).rem_euclid(DPI)
}

/// Greenwich mean sidereal time from a UTC Julian Date, in radians.
///
/// This is the single-expression form (Meeus, *Astronomical Algorithms*, eq. 12.4)
/// evaluated directly on the Julian Date, as used by the legacy transform.
pub fn mean_sidereal_time_jd(jd: f64) -> f64 {
    let d = jd - 2451545.0;
    let t = d / DAYS_PER_CENTURY;
    let theta =
        280.46061837 + 360.98564736629 * d + 0.000387933 * t * t - t * t * t / 38710000.0;
    theta.to_radians().rem_euclid(DPI)
}
