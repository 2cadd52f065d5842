//! # Pointing model variants
//!
//! A pointing model explains the difference between where a star should be (catalog position
//! after all corrections) and where the mount says it is, as a sum of a few physically
//! motivated terms (index offsets, collimation, axis tilts, flexure, ...). Each term has one
//! scalar parameter; the parameters are fitted by [`fit`](crate::fitting::fit).
//!
//! ## Contract
//!
//! A variant implements [`PointingModel`]: it names its parameters, declares the frame it
//! works in and provides the two model offsets, on the sky, for a true position:
//!
//! ```text
//! longitude_residual = Δlon · cos(lat) − model_lon(p, lon, lat)
//! latitude_residual  = Δlat            − model_lat(p, lon, lat)
//! ```
//!
//! where `Δlon`, `Δlat` are the raw catalog − mount differences. Parameters are passed in as
//! plain slices; a model holds no fitted state.
//!
//! ## Registered variants
//!
//! | name               | frame            | parameters                                    |
//! |--------------------|------------------|-----------------------------------------------|
//! | `condon1992`       | azimuth/altitude | IA, CA, NPAE, AN, AW, IE, TF, RF              |
//! | `condon1992_poly`  | azimuth/altitude | the above + second azimuth harmonics          |
//! | `buie2003`         | hour angle/dec   | IH, ID, CH, NP, MA, ME, TF, FO, DAF           |
//!
//! New variants are added to a [`ModelRegistry`] under a name with a factory function.
pub mod buie2003;
pub mod condon1992;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;

use crate::constants::Radian;
use crate::fitting::FitStatus;
use crate::observations::FitFrame;
use crate::pointing_errors::PointingError;

pub use buie2003::Buie2003;
pub use condon1992::Condon1992;

/// A named scalar parameter, for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub value: f64,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:.3}\"", self.name, self.value.to_degrees() * 3600.0)
    }
}

/// A pointing model variant.
pub trait PointingModel: fmt::Debug + Send + Sync {
    /// Registry name.
    fn name(&self) -> &'static str;

    /// Short tag for artifact names.
    fn tag(&self) -> &'static str;

    /// Frame in which the model is expressed.
    fn frame(&self) -> FitFrame;

    fn parameter_names(&self) -> &'static [&'static str];

    fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    /// Starting point of the fit; all zero unless a variant knows better.
    fn initial_parameters(&self) -> DVector<f64> {
        DVector::zeros(self.parameter_count())
    }

    /// Modelled offset along the longitude axis, on the sky (already scaled by cos lat).
    fn model_longitude(&self, params: &[f64], lon: Radian, lat: Radian) -> Radian;

    /// Modelled offset along the latitude axis.
    fn model_latitude(&self, params: &[f64], lon: Radian, lat: Radian) -> Radian;

    /// Longitude residual of a raw difference after the model correction, on the sky.
    fn longitude_residual(
        &self,
        params: &[f64],
        lon: Radian,
        lat: Radian,
        raw_diff: Radian,
    ) -> Radian {
        raw_diff * lat.cos() - self.model_longitude(params, lon, lat)
    }

    /// Latitude residual of a raw difference after the model correction.
    fn latitude_residual(
        &self,
        params: &[f64],
        lon: Radian,
        lat: Radian,
        raw_diff: Radian,
    ) -> Radian {
        raw_diff - self.model_latitude(params, lon, lat)
    }
}

/// Options handed to model factories.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModelOptions {
    /// Site latitude, radians (used by equatorial models).
    pub site_latitude: Radian,
}

/// Builds a model variant.
pub type ModelFactory = fn(&ModelOptions) -> Arc<dyn PointingModel>;

/// Name → factory map of the available model variants.
#[derive(Clone)]
pub struct ModelRegistry {
    factories: BTreeMap<String, ModelFactory>,
}

impl ModelRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        ModelRegistry {
            factories: BTreeMap::new(),
        }
    }

    /// Register (or replace) a variant.
    pub fn register(&mut self, name: impl Into<String>, factory: ModelFactory) {
        self.factories.insert(name.into(), factory);
    }

    /// Build the variant registered under `name`.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::UnknownModel`] if no variant has that name.
    pub fn create(
        &self,
        name: &str,
        options: &ModelOptions,
    ) -> Result<Arc<dyn PointingModel>, PointingError> {
        self.factories
            .get(name)
            .map(|factory| factory(options))
            .ok_or_else(|| {
                PointingError::UnknownModel(format!(
                    "{name} (available: {})",
                    self.names().collect::<Vec<_>>().join(", ")
                ))
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        let mut registry = ModelRegistry::new();
        registry.register(condon1992::NAME, condon1992::factory);
        registry.register(condon1992::POLY_NAME, condon1992::poly_factory);
        registry.register(buie2003::NAME, buie2003::factory);
        registry
    }
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}

/// Parameters of a model after a fit, with the fit diagnostics.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: Arc<dyn PointingModel>,
    pub parameters: DVector<f64>,
    pub status: FitStatus,
    pub iterations: usize,
    /// Final sum of squared residuals, rad².
    pub cost: f64,
    /// Number of observations used.
    pub n_points: usize,
}

impl FittedModel {
    pub fn longitude_residual(&self, lon: Radian, lat: Radian, raw_diff: Radian) -> Radian {
        self.model
            .longitude_residual(self.parameters.as_slice(), lon, lat, raw_diff)
    }

    pub fn latitude_residual(&self, lon: Radian, lat: Radian, raw_diff: Radian) -> Radian {
        self.model
            .latitude_residual(self.parameters.as_slice(), lon, lat, raw_diff)
    }

    /// Fitted parameters with their names.
    pub fn named_parameters(&self) -> Vec<Parameter> {
        self.model
            .parameter_names()
            .iter()
            .zip(self.parameters.iter())
            .map(|(&name, &value)| Parameter { name, value })
            .collect()
    }

    /// Root mean square of the per-axis residuals, radians.
    pub fn rms(&self) -> Radian {
        if self.n_points == 0 {
            return 0.0;
        }
        (self.cost / (2 * self.n_points) as f64).sqrt()
    }

    pub fn converged(&self) -> bool {
        self.status == FitStatus::Converged
    }
}
