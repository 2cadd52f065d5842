//! Annual aberration.
//!
//! Two formulations are provided: a vector form adding the Earth's orbital velocity
//! (in units of the speed of light) to the star direction, and the classical Meeus
//! correction in right ascension and declination computed from the Sun's true
//! longitude.
use nalgebra::Vector3;

use crate::constants::{Radian, ABERRATION_CONSTANT, DAYS_PER_CENTURY, RADEG, RADSEC, VLIGHT_AU};
use crate::earth_orientation::{obleq, precession_matrix, rot_x};
use crate::time::ResolvedTime;

/// Gaussian gravitational constant, AU^(3/2) / day.
const GAUSS_K: f64 = 0.01720209895;

/// Orbital elements of the Sun seen from the Earth, from Julian centuries of TT.
#[derive(Debug, Clone, Copy)]
pub struct SolarOrbit {
    /// True geometric longitude of the Sun, radians.
    pub true_longitude: Radian,
    /// Eccentricity of the Earth's orbit.
    pub eccentricity: f64,
    /// Longitude of the perihelion of the Earth's orbit, radians.
    pub perihelion: Radian,
}

impl SolarOrbit {
    /// Low-precision solar theory (Meeus, ch. 25), good to ~0.01°.
    pub fn at(t: f64) -> Self {
        let l0 = 280.46646 + (36000.76983 + 0.0003032 * t) * t;
        let m = (357.52911 + (35999.05029 - 0.0001537 * t) * t) * RADEG;
        let eccentricity = 0.016708634 - (0.000042037 + 0.0000001267 * t) * t;

        let c = (1.914602 - (0.004817 + 0.000014 * t) * t) * m.sin()
            + (0.019993 - 0.000101 * t) * (2.0 * m).sin()
            + 0.000289 * (3.0 * m).sin();

        SolarOrbit {
            true_longitude: ((l0 + c) * RADEG).rem_euclid(std::f64::consts::TAU),
            eccentricity,
            perihelion: (102.93735 + (1.71946 + 0.00046 * t) * t) * RADEG,
        }
    }
}

/// Earth's heliocentric velocity in the J2000 equatorial frame, in units of c.
pub fn earth_velocity(time: &ResolvedTime) -> Vector3<f64> {
    let t = (time.mjd_tt - crate::constants::T2000) / DAYS_PER_CENTURY;
    let sun = SolarOrbit::at(t);
    let e = sun.eccentricity;

    // heliocentric longitude of the Earth
    let lon = sun.true_longitude + std::f64::consts::PI;
    let speed = GAUSS_K / (1.0 - e * e).sqrt();

    let v_ecliptic = Vector3::new(
        -speed * (lon.sin() + e * sun.perihelion.sin()),
        speed * (lon.cos() + e * sun.perihelion.cos()),
        0.0,
    );

    // ecliptic of date -> equator of date -> J2000
    let v_equator = rot_x(-obleq(time.mjd_tt)) * v_ecliptic;
    precession_matrix(time.mjd_tt).transpose() * v_equator / VLIGHT_AU
}

/// Apply annual aberration to a J2000 direction, returning the aberrated unit vector.
pub fn aberrate(direction: &Vector3<f64>, beta: &Vector3<f64>) -> Vector3<f64> {
    (direction.normalize() + beta).normalize()
}

/// Meeus (23.2) aberration corrections in right ascension and declination, radians.
///
/// The e-terms are included. Near the celestial poles (cos δ < 1e-9) the right ascension
/// correction is set to zero.
pub fn meeus_aberration(ra: Radian, dec: Radian, time: &ResolvedTime) -> (Radian, Radian) {
    let t = time.centuries_tt();
    let sun = SolarOrbit::at(t);
    let eps = obleq(time.mjd_tt);
    let k = ABERRATION_CONSTANT * RADSEC;
    let e = sun.eccentricity;

    let (sa, ca) = ra.sin_cos();
    let (sd, cd) = dec.sin_cos();
    let (ss, cs) = sun.true_longitude.sin_cos();
    let (sp, cp) = sun.perihelion.sin_cos();
    let (se, ce) = eps.sin_cos();
    let te = se / ce;

    let dra = if cd.abs() < 1e-9 {
        0.0
    } else {
        (-k * (ca * cs * ce + sa * ss) + e * k * (ca * cp * ce + sa * sp)) / cd
    };

    let ddec = -k * (cs * ce * (te * cd - sa * sd) + ca * sd * ss)
        + e * k * (cp * ce * (te * cd - sa * sd) + ca * sd * sp);

    (dra, ddec)
}
