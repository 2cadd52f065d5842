//! # Earth orientation: precession, nutation and sidereal corrections
//!
//! Rotation matrices taking a J2000 equatorial direction to the true equator and equinox of
//! date. All matrices are **passive** (frame) rotations, so a direction expressed in the old
//! frame is mapped to the same direction expressed in the new frame by `m * v`.
//!
//! ## Models
//!
//! - Mean obliquity: IAU 1976 polynomial ([`obleq`]).
//! - Precession: IAU 1976 (Lieske) angles ζ, z, θ ([`precession_matrix`]).
//! - Nutation: leading terms of the IAU 1980 series ([`nutation`], [`nutation_matrix`]),
//!   accurate to a few milliarcseconds against the full series.
//! - Equation of the equinoxes: Δψ·cos ε ([`equequ`]).
use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::{ArcSec, Radian, DAYS_PER_CENTURY, MJD, RADEG, RADSEC, T2000};

/// Passive rotation about the x axis (frame rotated by `angle`).
pub fn rot_x(angle: Radian) -> Matrix3<f64> {
    *Rotation3::from_axis_angle(&Vector3::x_axis(), -angle).matrix()
}

/// Passive rotation about the y axis (frame rotated by `angle`).
pub fn rot_y(angle: Radian) -> Matrix3<f64> {
    *Rotation3::from_axis_angle(&Vector3::y_axis(), -angle).matrix()
}

/// Passive rotation about the z axis (frame rotated by `angle`).
pub fn rot_z(angle: Radian) -> Matrix3<f64> {
    *Rotation3::from_axis_angle(&Vector3::z_axis(), -angle).matrix()
}

fn centuries(tjm: MJD) -> f64 {
    (tjm - T2000) / DAYS_PER_CENTURY
}

/// Compute the mean obliquity of the ecliptic at a given epoch (IAU 1976 model).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * Mean obliquity of the ecliptic in radians.
///
/// The polynomial is evaluated with Horner's method:
///
/// ```text
/// ε = ((ob3 * t + ob2) * t + ob1) * t + ob0
/// ```
pub fn obleq(tjm: MJD) -> Radian {
    let ob0 = ((23.0 * 3600.0 + 26.0 * 60.0) + 21.448) * RADSEC;
    let ob1 = -46.815 * RADSEC;
    let ob2 = -0.00059 * RADSEC;
    let ob3 = 0.001813 * RADSEC;

    let t = centuries(tjm);

    ((ob3 * t + ob2) * t + ob1) * t + ob0
}

/// One periodic term of the nutation series.
///
/// Multipliers of (D, M, M′, F, Ω), then the longitude coefficients (constant, rate)
/// and the obliquity coefficients (constant, rate), in units of 0.0001″.
struct NutationTerm {
    args: [i8; 5],
    psi: (f64, f64),
    eps: (f64, f64),
}

const fn term(args: [i8; 5], psi: (f64, f64), eps: (f64, f64)) -> NutationTerm {
    NutationTerm { args, psi, eps }
}

/// IAU 1980 nutation series, every term of at least 0.0003″ (Meeus, table 22.A).
///
/// The terms left out change Δψ and Δε by a few milliarcseconds at most.
const NUTATION_TERMS: [NutationTerm; 63] = [
    term([0, 0, 0, 0, 1], (-171996.0, -174.2), (92025.0, 8.9)),
    term([-2, 0, 0, 2, 2], (-13187.0, -1.6), (5736.0, -3.1)),
    term([0, 0, 0, 2, 2], (-2274.0, -0.2), (977.0, -0.5)),
    term([0, 0, 0, 0, 2], (2062.0, 0.2), (-895.0, 0.5)),
    term([0, 1, 0, 0, 0], (1426.0, -3.4), (54.0, -0.1)),
    term([0, 0, 1, 0, 0], (712.0, 0.1), (-7.0, 0.0)),
    term([-2, 1, 0, 2, 2], (-517.0, 1.2), (224.0, -0.6)),
    term([0, 0, 0, 2, 1], (-386.0, -0.4), (200.0, 0.0)),
    term([0, 0, 1, 2, 2], (-301.0, 0.0), (129.0, -0.1)),
    term([-2, -1, 0, 2, 2], (217.0, -0.5), (-95.0, 0.3)),
    term([-2, 0, 1, 0, 0], (-158.0, 0.0), (0.0, 0.0)),
    term([-2, 0, 0, 2, 1], (129.0, 0.1), (-70.0, 0.0)),
    term([0, 0, -1, 2, 2], (123.0, 0.0), (-53.0, 0.0)),
    term([2, 0, 0, 0, 0], (63.0, 0.0), (0.0, 0.0)),
    term([0, 0, 1, 0, 1], (63.0, 0.1), (-33.0, 0.0)),
    term([2, 0, -1, 2, 2], (-59.0, 0.0), (26.0, 0.0)),
    term([0, 0, -1, 0, 1], (-58.0, -0.1), (32.0, 0.0)),
    term([0, 0, 1, 2, 1], (-51.0, 0.0), (27.0, 0.0)),
    term([-2, 0, 2, 0, 0], (48.0, 0.0), (0.0, 0.0)),
    term([0, 0, -2, 2, 1], (46.0, 0.0), (-24.0, 0.0)),
    term([2, 0, 0, 2, 2], (-38.0, 0.0), (16.0, 0.0)),
    term([0, 0, 2, 2, 2], (-31.0, 0.0), (13.0, 0.0)),
    term([0, 0, 2, 0, 0], (29.0, 0.0), (0.0, 0.0)),
    term([-2, 0, 1, 2, 2], (29.0, 0.0), (-12.0, 0.0)),
    term([0, 0, 0, 2, 0], (26.0, 0.0), (0.0, 0.0)),
    term([-2, 0, 0, 2, 0], (-22.0, 0.0), (0.0, 0.0)),
    term([0, 0, -1, 2, 1], (21.0, 0.0), (-10.0, 0.0)),
    term([0, 2, 0, 0, 0], (17.0, -0.1), (0.0, 0.0)),
    term([2, 0, -1, 0, 1], (16.0, 0.0), (-8.0, 0.0)),
    term([-2, 2, 0, 2, 2], (-16.0, 0.1), (7.0, 0.0)),
    term([0, 1, 0, 0, 1], (-15.0, 0.0), (9.0, 0.0)),
    term([-2, 0, 1, 0, 1], (-13.0, 0.0), (7.0, 0.0)),
    term([0, -1, 0, 0, 1], (-12.0, 0.0), (6.0, 0.0)),
    term([0, 0, 2, -2, 0], (11.0, 0.0), (0.0, 0.0)),
    term([2, 0, -1, 2, 1], (-10.0, 0.0), (5.0, 0.0)),
    term([2, 0, 1, 2, 2], (-8.0, 0.0), (3.0, 0.0)),
    term([0, 1, 0, 2, 2], (7.0, 0.0), (-3.0, 0.0)),
    term([-2, 1, 1, 0, 0], (-7.0, 0.0), (0.0, 0.0)),
    term([0, -1, 0, 2, 2], (-7.0, 0.0), (3.0, 0.0)),
    term([2, 0, 0, 2, 1], (-7.0, 0.0), (3.0, 0.0)),
    term([2, 0, 1, 0, 0], (6.0, 0.0), (0.0, 0.0)),
    term([-2, 0, 2, 2, 2], (6.0, 0.0), (-3.0, 0.0)),
    term([-2, 0, 1, 2, 1], (6.0, 0.0), (-3.0, 0.0)),
    term([2, 0, -2, 0, 1], (-6.0, 0.0), (3.0, 0.0)),
    term([2, 0, 0, 0, 1], (-6.0, 0.0), (3.0, 0.0)),
    term([0, -1, 1, 0, 0], (5.0, 0.0), (0.0, 0.0)),
    term([-2, -1, 0, 2, 1], (-5.0, 0.0), (3.0, 0.0)),
    term([-2, 0, 0, 0, 1], (-5.0, 0.0), (3.0, 0.0)),
    term([0, 0, 2, 2, 1], (-5.0, 0.0), (3.0, 0.0)),
    term([-2, 0, 2, 0, 1], (4.0, 0.0), (0.0, 0.0)),
    term([-2, 1, 0, 2, 1], (4.0, 0.0), (0.0, 0.0)),
    term([0, 0, 1, -2, 0], (4.0, 0.0), (0.0, 0.0)),
    term([-1, 0, 1, 0, 0], (-4.0, 0.0), (0.0, 0.0)),
    term([-2, 1, 0, 0, 0], (-4.0, 0.0), (0.0, 0.0)),
    term([1, 0, 0, 0, 0], (-4.0, 0.0), (0.0, 0.0)),
    term([0, 0, 1, 2, 0], (3.0, 0.0), (0.0, 0.0)),
    term([0, 0, -2, 2, 2], (-3.0, 0.0), (0.0, 0.0)),
    term([-1, -1, 1, 0, 0], (-3.0, 0.0), (0.0, 0.0)),
    term([0, 1, 1, 0, 0], (-3.0, 0.0), (0.0, 0.0)),
    term([0, -1, 1, 2, 2], (-3.0, 0.0), (0.0, 0.0)),
    term([2, -1, -1, 2, 2], (-3.0, 0.0), (0.0, 0.0)),
    term([0, 0, 3, 2, 2], (-3.0, 0.0), (0.0, 0.0)),
    term([2, -1, 0, 2, 2], (-3.0, 0.0), (0.0, 0.0)),
];

/// Compute the nutation angles in longitude and obliquity (IAU 1980).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale).
///
/// Returns
/// --------
/// * A tuple `(Δψ, Δε)` in arcseconds.
///
/// The five fundamental arguments are the mean elongation of the Moon (D), the mean anomaly
/// of the Sun (M) and of the Moon (M′), the Moon's argument of latitude (F) and the longitude
/// of its ascending node (Ω), all cubic polynomials in Julian centuries of TT.
pub fn nutation(tjm: MJD) -> (ArcSec, ArcSec) {
    let t = centuries(tjm);
    let t2 = t * t;
    let t3 = t2 * t;

    let fundamental = [
        297.85036 + 445267.111480 * t - 0.0019142 * t2 + t3 / 189474.0,
        357.52772 + 35999.050340 * t - 0.0001603 * t2 - t3 / 300000.0,
        134.96298 + 477198.867398 * t + 0.0086972 * t2 + t3 / 56250.0,
        93.27191 + 483202.017538 * t - 0.0036825 * t2 + t3 / 327270.0,
        125.04452 - 1934.136261 * t + 0.0020708 * t2 + t3 / 450000.0,
    ];

    let (dpsi, deps) = NUTATION_TERMS
        .iter()
        .fold((0.0, 0.0), |(dpsi, deps), term| {
            let arg: f64 = term
                .args
                .iter()
                .zip(fundamental.iter())
                .map(|(&k, &a)| f64::from(k) * a)
                .sum::<f64>()
                * RADEG;
            (
                dpsi + (term.psi.0 + term.psi.1 * t) * arg.sin(),
                deps + (term.eps.0 + term.eps.1 * t) * arg.cos(),
            )
        });

    (dpsi * 1e-4, deps * 1e-4)
}

/// Precession matrix from the J2000 mean equator and equinox to the mean equator and
/// equinox of date (IAU 1976).
///
/// Arguments
/// ---------
/// * `tjm`: Modified Julian Date (TT scale) of the target equinox.
///
/// Returns
/// --------
/// * `P = R3(−z) · R2(θ) · R3(−ζ)`.
pub fn precession_matrix(tjm: MJD) -> Matrix3<f64> {
    let t = centuries(tjm);

    let zeta = (0.6406161 + (0.0000839 + 0.0000050 * t) * t) * t * RADEG;
    let z = (0.6406161 + (0.0003041 + 0.0000051 * t) * t) * t * RADEG;
    let theta = (0.5567530 - (0.0001185 + 0.0000116 * t) * t) * t * RADEG;

    rot_z(-z) * rot_y(theta) * rot_z(-zeta)
}

/// Nutation matrix from the mean equator and equinox of date to the true ones.
///
/// `N = R1(−(ε + Δε)) · R3(−Δψ) · R1(ε)`
pub fn nutation_matrix(tjm: MJD) -> Matrix3<f64> {
    let epsm = obleq(tjm);
    let (dpsi, deps) = nutation(tjm);
    let epst = epsm + deps * RADSEC;

    rot_x(-epst) * rot_z(-dpsi * RADSEC) * rot_x(epsm)
}

/// Equation of the equinoxes (difference between apparent and mean sidereal time), radians.
pub fn equequ(tjm: MJD) -> Radian {
    let (dpsi, _) = nutation(tjm);
    dpsi * RADSEC * obleq(tjm).cos()
}

#[cfg(test)]
mod earth_orientation_test {
    use super::*;
    use crate::constants::JDTOMJD;
    use approx::assert_relative_eq;

    #[test]
    fn test_obliquity() {
        assert_relative_eq!(obleq(T2000), 0.40909280422232897, epsilon = 1e-12);
    }

    #[test]
    fn test_nutation_j2000() {
        // full IAU 1980 series: Δψ = -13.923385″, Δε = -5.773808″
        let (dpsi, deps) = nutation(T2000);
        assert_relative_eq!(dpsi, -13.923385, epsilon = 0.01);
        assert_relative_eq!(deps, -5.773808, epsilon = 0.01);
    }

    #[test]
    fn test_nutation_meeus_example() {
        // 1987 April 10, 0h TD
        let (dpsi, deps) = nutation(2446895.5 - JDTOMJD);
        assert_relative_eq!(dpsi, -3.788, epsilon = 0.002);
        assert_relative_eq!(deps, 9.443, epsilon = 0.002);
    }

    #[test]
    fn test_rotations_are_passive() {
        let v = Vector3::new(1.0, 0.0, 0.0);
        // rotating the frame by +90° about z moves x onto -y
        let r = rot_z(std::f64::consts::FRAC_PI_2) * v;
        assert_relative_eq!(r, Vector3::new(0.0, -1.0, 0.0), epsilon = 1e-15);
    }

    #[test]
    fn test_precession_identity_at_j2000() {
        assert_relative_eq!(
            precession_matrix(T2000),
            Matrix3::identity(),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_precession_of_equinox_direction() {
        // after one century an equatorial star on the equinox gains ζ + z ≈ 4614″ of RA
        let p = precession_matrix(T2000 + DAYS_PER_CENTURY);
        let v = p * Vector3::new(1.0, 0.0, 0.0);
        let ra = v.y.atan2(v.x);
        assert_relative_eq!(ra / RADSEC, 4614.0, epsilon = 2.0);
    }

    #[test]
    fn test_equequ_magnitude() {
        let eq = equequ(T2000);
        assert_relative_eq!(eq / RADSEC, -13.923385 * obleq(T2000).cos(), epsilon = 0.1);
    }
}
