//! # Observation records and batch loading
//!
//! Recorded star measurements are read sequentially from an [`ObservationStore`] and turned
//! into [`ObservationRecord`]s by [`load`]. Each stored entry pairs the catalog position of a
//! star with up to two measurements of where the mount actually pointed:
//!
//! - an **astrometric** solution of the image (`astr_ra`, `astr_dc`),
//! - a **centroid** extraction (`sxtr_ra`, `sxtr_dc`).
//!
//! One of them is chosen per fit with [`MountSource`]; entries lacking it are skipped.
//!
//! ## Storage format
//!
//! [`CsvObservationStore`] reads a header-led CSV file (the "analyzed positions" file):
//!
//! ```text
//! nml_id,cat_ra,cat_dc,astr_ra,astr_dc,sxtr_ra,sxtr_dc,dt_utc,temperature,pressure,humidity,image_fn
//! 1,1.0471,-0.5236,1.0472,-0.5235,,,2021-01-01T03:00:00,-50.2,650.1,0.21,img_0001.fits
//! ```
//!
//! Angles are radians, `dt_utc` an ISO-8601 UTC timestamp, temperature °C, pressure hPa (QFE),
//! humidity a fraction. Empty cells read as missing values.
//!
//! ## Loading
//!
//! [`load`] returns an [`ObservationBatch`], a lazy iterator capped at a number of stored
//! entries read. Rows that fail to decode come out as [`PointingError::SourceUnavailable`] items.
pub mod csv_store;
pub mod pairs;

use std::sync::Arc;

use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::constants::Radian;
use crate::log_context::LogContext;
use crate::pointing_errors::PointingError;
use crate::site::SiteLocation;
use crate::sky::SkyPosition;
use crate::time::parse_epoch;
use crate::transform::Atmosphere;

pub use csv_store::CsvObservationStore;
pub use pairs::{transform_batch, FitFrame, TransformedPair};

/// One row of an observation store, as written on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObservation {
    pub nml_id: u64,
    pub cat_ra: Radian,
    pub cat_dc: Radian,
    pub astr_ra: Option<Radian>,
    pub astr_dc: Option<Radian>,
    pub sxtr_ra: Option<Radian>,
    pub sxtr_dc: Option<Radian>,
    pub dt_utc: String,
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
    pub image_fn: Option<String>,
}

impl StoredObservation {
    /// Mount position (RA, Dec) for the requested source, if both angles are present.
    pub fn mount(&self, source: MountSource) -> Option<(Radian, Radian)> {
        match source {
            MountSource::Astrometric => self.astr_ra.zip(self.astr_dc),
            MountSource::Centroid => self.sxtr_ra.zip(self.sxtr_dc),
        }
    }
}

/// Which measurement stands for the mount position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MountSource {
    /// Astrometric solution of the image.
    Astrometric,
    /// Centroid extraction.
    #[default]
    Centroid,
}

/// A fully decoded star measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRecord {
    pub nml_id: u64,
    /// Catalog position (J2000).
    pub catalog: SkyPosition,
    /// Position reported by the mount, in the same equatorial frame as the catalog.
    pub mount: SkyPosition,
    pub atmosphere: Atmosphere,
    pub site: Arc<SiteLocation>,
    pub epoch: Epoch,
    pub image: Option<String>,
}

/// Sequential reader over stored observations.
pub trait ObservationStore {
    /// Human-readable location of the store, for logs.
    fn describe(&self) -> String;

    /// Open the store for one pass over its entries.
    ///
    /// Errors
    /// ----------
    /// * [`PointingError::SourceUnavailable`] if the store cannot be opened.
    fn open(&self) -> Result<StoredRows<'_>, PointingError>;
}

/// Iterator over the stored entries of one pass.
pub type StoredRows<'a> = Box<dyn Iterator<Item = Result<StoredObservation, PointingError>> + 'a>;

/// In-memory store, mostly for tests and for callers that already hold the rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryObservationStore {
    rows: Vec<StoredObservation>,
}

impl MemoryObservationStore {
    pub fn new(rows: Vec<StoredObservation>) -> Self {
        MemoryObservationStore { rows }
    }

    pub fn push(&mut self, row: StoredObservation) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ObservationStore for MemoryObservationStore {
    fn describe(&self) -> String {
        format!("memory ({} rows)", self.rows.len())
    }

    fn open(&self) -> Result<StoredRows<'_>, PointingError> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

/// Lazy, finite iterator over the decoded records of one load.
///
/// Not restartable: call [`load`] again for a new pass.
pub struct ObservationBatch<'a> {
    rows: StoredRows<'a>,
    site: Arc<SiteLocation>,
    mount_source: MountSource,
    max_count: usize,
    read: usize,
    skipped: usize,
    ctx: LogContext,
}

impl ObservationBatch<'_> {
    /// Stored entries read so far.
    pub fn read(&self) -> usize {
        self.read
    }

    /// Entries skipped because the selected mount field was missing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn decode(
        &self,
        row: StoredObservation,
        mount: (Radian, Radian),
    ) -> Result<ObservationRecord, PointingError> {
        let values = [
            ("cat_ra", row.cat_ra),
            ("cat_dc", row.cat_dc),
            ("mount ra", mount.0),
            ("mount dec", mount.1),
            ("temperature", row.temperature),
            ("pressure", row.pressure),
            ("humidity", row.humidity),
        ];
        if let Some((column, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return Err(PointingError::SourceUnavailable(format!(
                "entry {}: {column} is not a finite number ({value})",
                row.nml_id
            )));
        }

        let epoch = parse_epoch(&row.dt_utc).map_err(|e| {
            PointingError::SourceUnavailable(format!("entry {}: {e}", row.nml_id))
        })?;

        Ok(ObservationRecord {
            nml_id: row.nml_id,
            catalog: SkyPosition::catalog(row.cat_ra, row.cat_dc, epoch),
            mount: SkyPosition::catalog(mount.0, mount.1, epoch),
            atmosphere: Atmosphere::new(row.temperature, row.pressure, row.humidity),
            site: Arc::clone(&self.site),
            epoch,
            image: row.image_fn,
        })
    }
}

impl Iterator for ObservationBatch<'_> {
    type Item = Result<ObservationRecord, PointingError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.read >= self.max_count {
                return None;
            }

            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    self.read += 1;
                    return Some(Err(e));
                }
            };
            self.read += 1;

            match row.mount(self.mount_source) {
                Some(mount) => return Some(self.decode(row, mount)),
                None => {
                    self.skipped += 1;
                    log::debug!(
                        target: self.ctx.target(),
                        "skipping entry {}: no {:?} mount position",
                        row.nml_id,
                        self.mount_source
                    );
                }
            }
        }
    }
}

/// Open `source` and return a lazy batch of decoded records.
///
/// Arguments
/// -----------------
/// * `source`: the observation store.
/// * `site`: telescope location attached to every record.
/// * `max_count`: maximum number of stored entries read (skipped entries count); `None` for all.
/// * `mount_source`: which measurement stands for the mount position.
/// * `ctx`: logging context.
///
/// Return
/// ----------
/// * An [`ObservationBatch`]. An empty batch is not an error at this level.
///
/// Errors
/// ----------
/// * [`PointingError::SourceUnavailable`] if the store cannot be opened.
pub fn load<'a>(
    source: &'a dyn ObservationStore,
    site: Arc<SiteLocation>,
    max_count: Option<usize>,
    mount_source: MountSource,
    ctx: &LogContext,
) -> Result<ObservationBatch<'a>, PointingError> {
    let ctx = ctx.child("loader");
    let rows = source.open()?;

    log::info!(
        target: ctx.target(),
        "reading observations from {} (mount source: {:?})",
        source.describe(),
        mount_source
    );

    Ok(ObservationBatch {
        rows,
        site,
        mount_source,
        max_count: max_count.unwrap_or(usize::MAX),
        read: 0,
        skipped: 0,
        ctx,
    })
}
