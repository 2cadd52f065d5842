//! # Residual sinks
//!
//! A [`ResidualSink`] consumes the outcome of a fit: the per-point residuals, the
//! selection, the fitted parameters and the projection statistics. Plotting front ends
//! implement it; the crate ships [`CsvResidualSink`], which writes the tables such a front
//! end reads.
//!
//! Artifact names follow `<kind>_<axes>_<tag>.png` (see [`artifact_name`]), e.g.
//! `residual_az_alt_condon1992_RG.png`. The CSV sink writes `<kind>_<axes>_<tag>.csv` next to
//! where the image would go.
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::constants::{ArcSec, RADSEC};
use crate::fitting::ProjectionFit;
use crate::log_context::LogContext;
use crate::models::FittedModel;
use crate::observations::FitFrame;
use crate::pointing_errors::PointingError;
use crate::residuals::{ResidualAxis, ResidualPoint};
use crate::selection::Selection;

/// File stem of an artifact, `<kind>_<axes>_<tag>`.
pub fn artifact_stem(kind: &str, axes: &str, tag: &str) -> String {
    format!("{kind}_{axes}_{tag}")
}

/// Name of an image artifact, `<kind>_<axes>_<tag>.png`.
pub fn artifact_name(kind: &str, axes: &str, tag: &str) -> String {
    format!("{}.png", artifact_stem(kind, axes, tag))
}

/// Gaussian profile of one residual quantity, arcseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisProjection {
    pub axis: ResidualAxis,
    pub fit: ProjectionFit,
}

/// Everything a sink receives for one fit.
#[derive(Debug, Clone, Copy)]
pub struct ResidualReport<'a> {
    /// `<model tag>_<strategy tag>`, e.g. `condon1992_RG`.
    pub tag: &'a str,
    pub frame: FitFrame,
    pub fitted: &'a FittedModel,
    pub points: &'a [ResidualPoint],
    pub selection: &'a Selection,
    pub projections: &'a [AxisProjection],
}

/// Consumer of fit results.
pub trait ResidualSink {
    /// Receive the results of one fit.
    ///
    /// Errors
    /// ----------
    /// * Whatever the sink hits while writing; the run reports it at the output stage.
    fn publish(&mut self, report: &ResidualReport<'_>) -> Result<(), PointingError>;
}

#[derive(Serialize)]
struct PointRow<'a> {
    nml_id: u64,
    cat_lon: f64,
    cat_lat: f64,
    mnt_lon: f64,
    mnt_lat: f64,
    df_lon_arcsec: ArcSec,
    df_lat_arcsec: ArcSec,
    res_lon_arcsec: ArcSec,
    res_lat_arcsec: ArcSec,
    selected: bool,
    image_fn: Option<&'a str>,
}

#[derive(Serialize)]
struct ProjectionRow {
    axis: &'static str,
    mean_arcsec: ArcSec,
    spread_arcsec: ArcSec,
    peak: f64,
    status: String,
}

#[derive(Serialize)]
struct ParameterRow {
    name: &'static str,
    value_rad: f64,
    value_arcsec: ArcSec,
}

/// Writes the residual tables of each fit as CSV files under a base directory.
#[derive(Debug, Clone)]
pub struct CsvResidualSink {
    base_path: Utf8PathBuf,
    written: Vec<Utf8PathBuf>,
    ctx: LogContext,
}

impl CsvResidualSink {
    pub fn new(base_path: impl AsRef<Utf8Path>, ctx: &LogContext) -> Self {
        CsvResidualSink {
            base_path: base_path.as_ref().to_path_buf(),
            written: Vec::new(),
            ctx: ctx.child("sink"),
        }
    }

    /// Files written so far, in order.
    pub fn written(&self) -> &[Utf8PathBuf] {
        &self.written
    }

    fn write_rows<T: Serialize>(
        &mut self,
        stem: &str,
        rows: impl IntoIterator<Item = T>,
    ) -> Result<(), PointingError> {
        let path = self.base_path.join(format!("{stem}.csv"));
        let mut writer = csv::Writer::from_path(&path)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        log::debug!(target: self.ctx.target(), "wrote {path}");
        self.written.push(path);
        Ok(())
    }
}

impl ResidualSink for CsvResidualSink {
    fn publish(&mut self, report: &ResidualReport<'_>) -> Result<(), PointingError> {
        fs::create_dir_all(&self.base_path)?;
        let axes = report.frame.axes();

        let points = report.points.iter().enumerate().map(|(i, p)| PointRow {
            nml_id: p.nml_id,
            cat_lon: p.catalog.lon,
            cat_lat: p.catalog.lat,
            mnt_lon: p.mount.lon,
            mnt_lat: p.mount.lat,
            df_lon_arcsec: p.df_lon / RADSEC,
            df_lat_arcsec: p.df_lat / RADSEC,
            res_lon_arcsec: p.res_lon / RADSEC,
            res_lat_arcsec: p.res_lat / RADSEC,
            selected: report.selection.selected.contains(&i),
            image_fn: p.image.as_deref(),
        });
        self.write_rows(&artifact_stem("residual", axes, report.tag), points)?;

        let projections = report.projections.iter().map(|p| ProjectionRow {
            axis: p.axis.name(),
            mean_arcsec: p.fit.mean,
            spread_arcsec: p.fit.spread,
            peak: p.fit.peak,
            status: p.fit.status.to_string(),
        });
        self.write_rows(&artifact_stem("projection", axes, report.tag), projections)?;

        let parameters = report
            .fitted
            .named_parameters()
            .into_iter()
            .map(|p| ParameterRow {
                name: p.name,
                value_rad: p.value,
                value_arcsec: p.value / RADSEC,
            });
        self.write_rows(&artifact_stem("parameters", axes, report.tag), parameters)?;

        log::info!(
            target: self.ctx.target(),
            "{} points ({} selected) for {} written to {}",
            report.points.len(),
            report.selection.selected.len(),
            report.tag,
            self.base_path
        );
        Ok(())
    }
}
