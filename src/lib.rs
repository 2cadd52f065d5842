//! # pointfit
//!
//! Telescope pointing-model fitting from recorded star observations.
//!
//! Catalog positions of stars and the positions a mount reported for them are brought to a
//! common frame (azimuth/altitude or hour angle/declination) by a [`transform`] engine, then
//! a [`models`] variant is fitted to the differences by non-linear least squares
//! ([`fitting`]). The residuals are summarised per axis and classified by magnitude, and the
//! results go to a [`sink`].
//!
//! [`pointing::PointingRun`] drives the whole sequence from a [`config::RunConfig`].
pub mod config;
pub mod constants;
pub mod earth_orientation;
pub mod fitting;
pub mod log_context;
pub mod models;
pub mod observations;
pub mod pointing;
pub mod pointing_errors;
pub mod residuals;
pub mod selection;
pub mod sink;
pub mod site;
pub mod sky;
pub mod time;
pub mod transform;
