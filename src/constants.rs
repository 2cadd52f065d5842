//! # Constants and type definitions for pointfit
//!
//! This module centralizes the **astronomical constants**, **unit conversion factors**, and
//! **angle type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Time origins (J2000, MJD ↔ JD)
//! - Unit conversions (degrees, arcseconds ↔ radians)
//! - Constants of the aberration and refraction models
//! - Type aliases documenting the unit carried by a bare `f64`

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Number of seconds in a Julian day
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Astronomical Unit in kilometers (IAU 2012)
pub const AU: f64 = 149_597_870.7;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Conversion factor between Julian Date and Modified Julian Date
pub const JDTOMJD: f64 = 2400000.5;

/// Number of days in a Julian century
pub const DAYS_PER_CENTURY: f64 = 36525.0;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Arcseconds → radians
pub const RADSEC: f64 = std::f64::consts::PI / 648000.0;

/// Speed of light in km/s
pub const VLIGHT: f64 = 2.99792458e5;

/// Speed of light in astronomical units per day
pub const VLIGHT_AU: f64 = VLIGHT / AU * SECONDS_PER_DAY;

/// Constant of annual aberration κ, in arcseconds
pub const ABERRATION_CONSTANT: ArcSec = 20.49552;

/// Effective wavelength used for optical refraction, in micrometers
pub const OBSERVING_WAVELENGTH: f64 = 0.5;

/// Time span (Julian centuries around J2000) over which the precession and nutation
/// series are trusted. Epochs outside this window cannot be resolved to sidereal time.
pub const MAX_CENTURIES_FROM_J2000: f64 = 10.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in arcseconds
pub type ArcSec = f64;
/// Angle in radians
pub type Radian = f64;
/// Distance in meters
pub type Meter = f64;
/// Temperature in degrees Celsius
pub type Celsius = f64;
/// Pressure in hectopascal (millibar)
pub type HectoPascal = f64;

/// Modified Julian Date (days)
pub type MJD = f64;
