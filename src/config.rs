//! # Run configuration
//!
//! [`RunConfig`] gathers every option of a pointing run. It can be built in code, read from
//! a YAML file with [`RunConfig::from_file`] (missing keys take their defaults) or filled by
//! the command line front end.
//!
//! ```yaml
//! base_path: /tmp/u_point/
//! analyzed_positions: analyzed_positions.anl
//! strategy: rigorous
//! site:
//!   longitude: 123.2994166666666
//!   latitude: -75.1
//!   height: 3237.0
//! fit_astr: false
//! fit_eq: false
//! bins: 40
//! threshold_arcsec: 30.0
//! ```
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;

use crate::constants::{ArcSec, Degree, Meter, Radian, RADSEC};
use crate::models::{buie2003, condon1992, ModelOptions, ModelRegistry, PointingModel};
use crate::observations::{FitFrame, MountSource};
use crate::pointing_errors::PointingError;
use crate::site::SiteLocation;
use crate::sky::AzimuthConvention;
use crate::transform::TransformStrategy;

/// Geographic location of the telescope, degrees east / degrees / meters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub longitude: Degree,
    pub latitude: Degree,
    pub height: Meter,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            longitude: 123.2994166666666,
            latitude: -75.1,
            height: 3237.0,
        }
    }
}

/// Options of one pointing run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Directory holding the observation file and receiving the outputs.
    pub base_path: Utf8PathBuf,
    /// Observation file name, relative to `base_path` unless absolute.
    pub analyzed_positions: String,
    pub strategy: TransformStrategy,
    /// Overrides the engine's default azimuth convention.
    pub azimuth_convention: Option<AzimuthConvention>,
    /// Registered model name; derived from the fit flags when absent.
    pub model: Option<String>,
    pub site: SiteConfig,
    /// Use the astrometric solution as mount position instead of the centroid.
    pub fit_astr: bool,
    /// Fit in hour angle / declination.
    pub fit_eq: bool,
    /// TPOINT-style equatorial fit; implies `fit_eq`.
    pub t_point: bool,
    /// Add the azimuth harmonics to the alt/az model.
    pub fit_plus_poly: bool,
    /// Histogram bins of the projection fits.
    pub bins: usize,
    /// Maximum number of stored entries read.
    pub break_after: usize,
    /// Residual distance above which a star is selected.
    pub threshold_arcsec: ArcSec,
    /// Refit the model separately on the selected and on the dropped stars.
    pub refit_subsets: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            base_path: Utf8PathBuf::from("/tmp/u_point/"),
            analyzed_positions: "analyzed_positions.anl".to_string(),
            strategy: TransformStrategy::default(),
            azimuth_convention: None,
            model: None,
            site: SiteConfig::default(),
            fit_astr: false,
            fit_eq: false,
            t_point: false,
            fit_plus_poly: false,
            bins: 40,
            break_after: 10_000_000,
            threshold_arcsec: 30.0,
            refit_subsets: false,
        }
    }
}

impl RunConfig {
    /// Read a YAML configuration file; absent keys keep their defaults.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::IoError`] if the file cannot be read.
    /// * [`PointingError::YamlError`] if it is not a valid configuration.
    pub fn from_file(path: impl AsRef<Utf8Path>) -> Result<Self, PointingError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Check option consistency. Touches no file.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::ConfigurationConflict`] for an equatorial fit combined with the
    ///   polynomial alt/az model, or a model whose frame differs from the fit frame.
    /// * [`PointingError::InvalidConfiguration`] for zero bins or a negative threshold.
    /// * [`PointingError::InvalidSite`] for an invalid site.
    /// * [`PointingError::UnknownModel`] for an unregistered model name.
    pub fn validate(&self, registry: &ModelRegistry) -> Result<(), PointingError> {
        if self.equatorial() && self.fit_plus_poly {
            return Err(PointingError::ConfigurationConflict(
                "fit_eq (or t_point) and fit_plus_poly are mutually exclusive".into(),
            ));
        }
        if self.bins == 0 {
            return Err(PointingError::InvalidConfiguration(
                "bins must be at least 1".into(),
            ));
        }
        if !(self.threshold_arcsec.is_finite() && self.threshold_arcsec >= 0.0) {
            return Err(PointingError::InvalidConfiguration(format!(
                "selection threshold must be a non-negative number of arcseconds, got {}",
                self.threshold_arcsec
            )));
        }
        self.site()?;
        self.model(registry).map(|_| ())
    }

    /// `true` for a fit in hour angle / declination.
    pub fn equatorial(&self) -> bool {
        self.fit_eq || self.t_point
    }

    pub fn fit_frame(&self) -> FitFrame {
        if self.equatorial() {
            FitFrame::HourAngleDec
        } else {
            FitFrame::Horizon
        }
    }

    pub fn mount_source(&self) -> MountSource {
        if self.fit_astr {
            MountSource::Astrometric
        } else {
            MountSource::Centroid
        }
    }

    /// The configured model name, or the default one for the fit flags.
    pub fn model_name(&self) -> &str {
        match &self.model {
            Some(name) => name.as_str(),
            None if self.equatorial() => buie2003::NAME,
            None if self.fit_plus_poly => condon1992::POLY_NAME,
            None => condon1992::NAME,
        }
    }

    /// Build the configured model and check that it works in the fit frame.
    pub fn model(&self, registry: &ModelRegistry) -> Result<Arc<dyn PointingModel>, PointingError> {
        let options = ModelOptions {
            site_latitude: self.site.latitude.to_radians(),
        };
        let model = registry.create(self.model_name(), &options)?;

        if model.frame() != self.fit_frame() {
            return Err(PointingError::ConfigurationConflict(format!(
                "model {} works in {} but the fit is in {}",
                model.name(),
                model.frame(),
                self.fit_frame()
            )));
        }
        Ok(model)
    }

    pub fn site(&self) -> Result<SiteLocation, PointingError> {
        SiteLocation::new(self.site.longitude, self.site.latitude, self.site.height)
    }

    /// Selection threshold, radians.
    pub fn threshold(&self) -> Radian {
        self.threshold_arcsec * RADSEC
    }

    /// Path of the observation file.
    pub fn analyzed_positions_path(&self) -> Utf8PathBuf {
        self.base_path.join(&self.analyzed_positions)
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RunConfig::default();
        let registry = ModelRegistry::default();

        assert!(config.validate(&registry).is_ok());
        assert_eq!(config.model_name(), "condon1992");
        assert_eq!(config.mount_source(), MountSource::Centroid);
        assert_eq!(
            config.analyzed_positions_path(),
            Utf8PathBuf::from("/tmp/u_point/analyzed_positions.anl")
        );
    }

    #[test]
    fn test_conflicting_flags() {
        let registry = ModelRegistry::default();
        let config = RunConfig {
            t_point: true,
            fit_plus_poly: true,
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(&registry),
            Err(PointingError::ConfigurationConflict(_))
        ));
    }

    #[test]
    fn test_model_frame_mismatch() {
        let registry = ModelRegistry::default();
        let config = RunConfig {
            model: Some("buie2003".into()),
            ..RunConfig::default()
        };
        assert!(matches!(
            config.validate(&registry),
            Err(PointingError::ConfigurationConflict(_))
        ));

        let equatorial = RunConfig {
            fit_eq: true,
            ..RunConfig::default()
        };
        assert_eq!(equatorial.model(&registry).unwrap().name(), "buie2003");
    }

    #[test]
    fn test_invalid_values() {
        let registry = ModelRegistry::default();
        let no_bins = RunConfig {
            bins: 0,
            ..RunConfig::default()
        };
        assert!(matches!(
            no_bins.validate(&registry),
            Err(PointingError::InvalidConfiguration(_))
        ));

        let mut bad_site = RunConfig::default();
        bad_site.site.latitude = 95.0;
        assert!(matches!(
            bad_site.validate(&registry),
            Err(PointingError::InvalidSite(_))
        ));
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("pointing.yaml"))
            .unwrap();
        std::fs::write(
            &path,
            "strategy: libnova\n\
             azimuth_convention: north_east\n\
             fit_astr: true\n\
             site:\n  latitude: 45.0\n\
             bins: 25\n",
        )
        .unwrap();

        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.strategy, TransformStrategy::Legacy);
        assert_eq!(
            config.azimuth_convention,
            Some(AzimuthConvention::NorthEast)
        );
        assert!(config.fit_astr);
        assert_eq!(config.site.latitude, 45.0);
        assert_eq!(config.site.longitude, 123.2994166666666);
        assert_eq!(config.bins, 25);
        assert_eq!(config.threshold_arcsec, 30.0);
    }
}
