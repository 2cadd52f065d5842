//! Altitude-azimuth mount model after J. Condon (1992), GBT memo 92.
//!
//! Terms along azimuth (on the sky, `Δaz·cos el`):
//!
//! ```text
//! IA·cos el + CA + NPAE·sin el + AN·cos az·sin el + AW·sin az·sin el
//! ```
//!
//! and along elevation:
//!
//! ```text
//! IE + TF·cos el − AN·sin az + AW·cos az + RF·cot el
//! ```
//!
//! The polynomial flavour adds the second azimuth harmonics `sin 2az`, `cos 2az` on both axes,
//! which absorb azimuth-track irregularities.
use std::sync::Arc;

use crate::constants::Radian;
use crate::observations::FitFrame;

use super::{ModelOptions, PointingModel};

pub const NAME: &str = "condon1992";
pub const POLY_NAME: &str = "condon1992_poly";

const PARAMETERS: [&str; 8] = ["IA", "CA", "NPAE", "AN", "AW", "IE", "TF", "RF"];
const POLY_PARAMETERS: [&str; 12] = [
    "IA", "CA", "NPAE", "AN", "AW", "IE", "TF", "RF", "AS2A", "AC2A", "ES2A", "EC2A",
];

/// Condon (1992) azimuth/altitude model, optionally with azimuth harmonics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Condon1992 {
    polynomial: bool,
}

impl Condon1992 {
    pub fn new() -> Self {
        Condon1992 { polynomial: false }
    }

    pub fn with_polynomial() -> Self {
        Condon1992 { polynomial: true }
    }
}

pub fn factory(_: &ModelOptions) -> Arc<dyn PointingModel> {
    Arc::new(Condon1992::new())
}

pub fn poly_factory(_: &ModelOptions) -> Arc<dyn PointingModel> {
    Arc::new(Condon1992::with_polynomial())
}

impl PointingModel for Condon1992 {
    fn name(&self) -> &'static str {
        if self.polynomial {
            POLY_NAME
        } else {
            NAME
        }
    }

    fn tag(&self) -> &'static str {
        if self.polynomial {
            "c_plus_poly"
        } else {
            "condon1992"
        }
    }

    fn frame(&self) -> FitFrame {
        FitFrame::Horizon
    }

    fn parameter_names(&self) -> &'static [&'static str] {
        if self.polynomial {
            &POLY_PARAMETERS
        } else {
            &PARAMETERS
        }
    }

    fn model_longitude(&self, p: &[f64], az: Radian, el: Radian) -> Radian {
        let (sa, ca) = az.sin_cos();
        let (se, ce) = el.sin_cos();

        let base = p[0] * ce + p[1] + p[2] * se + p[3] * ca * se + p[4] * sa * se;
        if self.polynomial {
            let (s2, c2) = (2.0 * az).sin_cos();
            base + p[8] * s2 + p[9] * c2
        } else {
            base
        }
    }

    fn model_latitude(&self, p: &[f64], az: Radian, el: Radian) -> Radian {
        let (sa, ca) = az.sin_cos();
        let (se, ce) = el.sin_cos();

        let base = p[5] + p[6] * ce - p[3] * sa + p[4] * ca + p[7] * ce / se;
        if self.polynomial {
            let (s2, c2) = (2.0 * az).sin_cos();
            base + p[10] * s2 + p[11] * c2
        } else {
            base
        }
    }
}
