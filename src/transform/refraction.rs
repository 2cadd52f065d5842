//! Atmospheric refraction.
//!
//! Both models return the amount by which refraction raises a star, in radians, to be
//! added to its geometric altitude. Pressure is the station pressure (QFE).
use crate::constants::{Celsius, HectoPascal, Radian, OBSERVING_WAVELENGTH};

/// Coefficients of the `A·tan z + B·tan³ z` refraction model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefractionCoefficients {
    pub a: Radian,
    pub b: Radian,
}

impl RefractionCoefficients {
    /// Coefficients for optical/IR wavelengths (Hohenkerk & Sinclair, Stone 1996).
    ///
    /// Arguments
    /// -----------------
    /// * `pressure`: station pressure, hPa (clamped to `[0, 10000]`).
    /// * `temperature`: °C (clamped to `[-150, 200]`).
    /// * `humidity`: relative humidity (clamped to `[0, 1]`).
    /// * `wavelength`: micrometers (clamped to `[0.1, 100]`).
    ///
    /// A pressure of zero yields zero coefficients.
    pub fn compute(
        pressure: HectoPascal,
        temperature: Celsius,
        humidity: f64,
        wavelength: f64,
    ) -> Self {
        let t = temperature.clamp(-150.0, 200.0);
        let p = pressure.clamp(0.0, 10000.0);
        let r = humidity.clamp(0.0, 1.0);
        let w = wavelength.clamp(0.1, 100.0);

        // water vapour pressure at the observer
        let pw = if p > 0.0 {
            let ps = 10f64.powf((0.7859 + 0.03477 * t) / (1.0 + 0.00412 * t))
                * (1.0 + p * (4.5e-6 + 6e-10 * t * t));
            r * ps / (1.0 - (1.0 - r) * ps / p)
        } else {
            0.0
        };

        let tk = t + 273.15;
        let wlsq = w * w;
        let dispersion = 77.53484e-6 + (4.39108e-7 + 3.666e-9 / wlsq) / wlsq;
        let gamma = (dispersion * p - 11.2684e-6 * pw) / tk;
        let beta = 4.4474e-6 * tk;

        RefractionCoefficients {
            a: gamma * (1.0 - beta),
            b: -gamma * (beta - gamma / 2.0),
        }
    }

    /// Refraction for a geometric altitude.
    ///
    /// Below ~3° the zenith distance is capped so the correction stays finite.
    pub fn correction(&self, altitude: Radian) -> Radian {
        let r = altitude.cos().max(1e-6);
        let z = altitude.sin().max(0.05);
        let tz = r / z;
        let w = self.b * tz * tz;
        (self.a + w) * tz / (1.0 + (self.a + 3.0 * w) / (z * z))
    }
}

/// Two-coefficient refraction at the default observing wavelength.
pub fn tan_model_refraction(
    altitude: Radian,
    pressure: HectoPascal,
    temperature: Celsius,
    humidity: f64,
) -> Radian {
    RefractionCoefficients::compute(pressure, temperature, humidity, OBSERVING_WAVELENGTH)
        .correction(altitude)
}

/// Bennett's refraction formula with Saemundsson's small correction, scaled for
/// pressure and temperature.
///
/// Returns zero below −2°, where the formula diverges.
pub fn bennett_refraction(altitude: Radian, pressure: HectoPascal, temperature: Celsius) -> Radian {
    let h = altitude.to_degrees();
    if h < -2.0 {
        return 0.0;
    }

    // arcminutes
    let mut r = 1.0 / (h + 7.31 / (h + 4.4)).to_radians().tan();
    r -= 0.06 * (14.7 * r / 60.0 + 13.0).to_radians().sin();
    r *= (pressure / 1010.0) * (283.0 / (273.0 + temperature));

    (r / 60.0).to_radians()
}

#[cfg(test)]
mod refraction_test {
    use super::*;
    use crate::constants::RADSEC;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_pressure() {
        let coefs = RefractionCoefficients::compute(0.0, 10.0, 0.5, 0.5);
        assert_eq!(coefs.a, 0.0);
        assert_eq!(coefs.b, 0.0);
        assert_eq!(coefs.correction(0.3), 0.0);
        assert_eq!(bennett_refraction(0.3, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_standard_coefficients() {
        // roughly 58″ tan z at sea level
        let coefs = RefractionCoefficients::compute(1013.25, 10.0, 0.5, 0.5);
        assert_relative_eq!(coefs.a / RADSEC, 58.0, epsilon = 1.5);
        assert!(coefs.b < 0.0);
    }

    #[test]
    fn test_models_agree_above_ten_degrees() {
        for alt_deg in [10.0_f64, 20.0, 45.0, 80.0] {
            let alt = alt_deg.to_radians();
            let a = tan_model_refraction(alt, 1010.0, 10.0, 0.5) / RADSEC;
            let b = bennett_refraction(alt, 1010.0, 10.0) / RADSEC;
            assert!((a - b).abs() < 20.0, "{alt_deg}°: {a} vs {b}");
        }
    }

    #[test]
    fn test_horizon_refraction_magnitude() {
        let r = bennett_refraction(0.0, 1010.0, 10.0).to_degrees() * 60.0;
        assert_relative_eq!(r, 34.5, epsilon = 0.5);
    }
}
