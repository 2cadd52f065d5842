//! Equatorial mount model after M. Buie (2003), in TPOINT notation.
//!
//! Terms along hour angle, on the sky (`Δh·cos δ`), for site latitude φ:
//!
//! | term | `Δh·cos δ`                               | `Δδ`                              |
//! |------|------------------------------------------|-----------------------------------|
//! | IH   | `cos δ`                                  |                                   |
//! | ID   |                                          | `1`                               |
//! | CH   | `1`                                      |                                   |
//! | NP   | `sin δ`                                  |                                   |
//! | MA   | `−cos h·sin δ`                           | `sin h`                           |
//! | ME   | `sin h·sin δ`                            | `cos h`                           |
//! | TF   | `cos φ·sin h`                            | `cos φ·cos h·sin δ − sin φ·cos δ` |
//! | FO   |                                          | `cos h`                           |
//! | DAF  | `−(cos φ·cos h·cos δ + sin φ·sin δ)`     |                                   |
use std::sync::Arc;

use crate::constants::Radian;
use crate::observations::FitFrame;

use super::{ModelOptions, PointingModel};

pub const NAME: &str = "buie2003";

const PARAMETERS: [&str; 9] = ["IH", "ID", "CH", "NP", "MA", "ME", "TF", "FO", "DAF"];

/// Buie (2003) hour-angle/declination model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buie2003 {
    /// Site latitude, radians.
    latitude: Radian,
}

impl Buie2003 {
    pub fn new(latitude: Radian) -> Self {
        Buie2003 { latitude }
    }
}

pub fn factory(options: &ModelOptions) -> Arc<dyn PointingModel> {
    Arc::new(Buie2003::new(options.site_latitude))
}

impl PointingModel for Buie2003 {
    fn name(&self) -> &'static str {
        NAME
    }

    fn tag(&self) -> &'static str {
        "buie2003"
    }

    fn frame(&self) -> FitFrame {
        FitFrame::HourAngleDec
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        &PARAMETERS
    }

    fn model_longitude(&self, p: &[f64], ha: Radian, dec: Radian) -> Radian {
        let (sh, ch) = ha.sin_cos();
        let (sd, cd) = dec.sin_cos();
        let (sp, cp) = self.latitude.sin_cos();

        p[0] * cd + p[2] + p[3] * sd - p[4] * ch * sd + p[5] * sh * sd + p[6] * cp * sh
            - p[8] * (cp * ch * cd + sp * sd)
    }

    fn model_latitude(&self, p: &[f64], ha: Radian, dec: Radian) -> Radian {
        let (sh, ch) = ha.sin_cos();
        let (sd, cd) = dec.sin_cos();
        let (sp, cp) = self.latitude.sin_cos();

        p[1] + p[4] * sh + p[5] * ch + p[6] * (cp * ch * sd - sp * cd) + p[7] * ch
    }
}

#[cfg(test)]
mod buie2003_test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polar_axis_terms() {
        let model = Buie2003::new(-1.3);
        let mut p = [0.0; 9];
        p[4] = 1e-4; // MA
        let ha = 0.5_f64;
        let dec = -0.4_f64;

        assert_relative_eq!(
            model.model_longitude(&p, ha, dec),
            -1e-4 * ha.cos() * dec.sin()
        );
        assert_relative_eq!(model.model_latitude(&p, ha, dec), 1e-4 * ha.sin());
    }

    #[test]
    fn test_fork_flexure_on_meridian() {
        let model = Buie2003::new(0.0);
        let mut p = [0.0; 9];
        p[7] = 1e-4; // FO
        assert_relative_eq!(model.model_latitude(&p, 0.0, 0.3), 1e-4);
        assert_eq!(model.model_longitude(&p, 0.0, 0.3), 0.0);
    }
}
