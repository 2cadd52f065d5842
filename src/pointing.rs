//! # Pointing run
//!
//! [`PointingRun`] wires the components together for one batch of observations:
//!
//! 1. validate the [`RunConfig`] (no I/O yet),
//! 2. load the records from an [`ObservationStore`],
//! 3. transform catalog and mount positions to the fit frame,
//! 4. fit the model on every pair,
//! 5. build the per-point residuals, their projection statistics and the selection,
//! 6. hand everything to a [`ResidualSink`],
//! 7. optionally refit the model on the selected and on the dropped stars.
//!
//! Any fatal error comes back as a [`RunError`] naming the stage that failed.
//!
//! ```rust, no_run
//! use pointfit::config::RunConfig;
//! use pointfit::log_context::LogContext;
//! use pointfit::pointing::PointingRun;
//! use pointfit::sink::CsvResidualSink;
//!
//! let config = RunConfig::default();
//! let ctx = LogContext::default();
//! let mut sink = CsvResidualSink::new(&config.base_path, &ctx);
//! let summary = PointingRun::new(config, &ctx).run_from_config(&mut sink).unwrap();
//! for parameter in summary.all.fitted.named_parameters() {
//!     println!("{parameter}");
//! }
//! ```
use std::sync::Arc;

use crate::config::RunConfig;
use crate::fitting::{fit, fit_projection, FitStatus, LeastSquaresConfig};
use crate::log_context::LogContext;
use crate::models::{FittedModel, ModelRegistry, PointingModel};
use crate::observations::{
    load, transform_batch, CsvObservationStore, FitFrame, ObservationStore, TransformedPair,
};
use crate::pointing_errors::{AtStage, PointingError, RunError, RunStage};
use crate::residuals::{build_residuals, ResidualAxis, ResidualPoint};
use crate::selection::{select, Selection};
use crate::sink::{AxisProjection, ResidualReport, ResidualSink};

/// Non-converged fits are reported as warnings.
fn status_level(status: FitStatus) -> log::Level {
    match status {
        FitStatus::Converged => log::Level::Info,
        FitStatus::MaxIterations | FitStatus::Stalled => log::Level::Warn,
    }
}

/// Fit of one set of pairs with everything derived from it.
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Artifact tag, `<model>_<strategy>[_<subset>]`.
    pub tag: String,
    pub fitted: FittedModel,
    pub points: Vec<ResidualPoint>,
    pub selection: Selection,
    /// Projection statistics of the raw differences and residuals, arcseconds.
    pub projections: Vec<AxisProjection>,
}

impl FitOutcome {
    pub fn projection(&self, axis: ResidualAxis) -> Option<&AxisProjection> {
        self.projections.iter().find(|p| p.axis == axis)
    }
}

/// Result of a whole run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Stored entries read.
    pub read: usize,
    /// Entries skipped for lack of the selected mount position.
    pub skipped: usize,
    pub pairs: Vec<TransformedPair>,
    /// Fit on every pair.
    pub all: FitOutcome,
    /// Refit on the selected stars, when requested and not empty.
    pub selected: Option<FitOutcome>,
    /// Refit on the dropped stars, when requested and not empty.
    pub dropped: Option<FitOutcome>,
}

/// One configured pointing-model run.
#[derive(Debug, Clone)]
pub struct PointingRun {
    config: RunConfig,
    registry: ModelRegistry,
    solver: LeastSquaresConfig,
    ctx: LogContext,
}

impl PointingRun {
    /// A run with the default model registry and solver settings.
    pub fn new(config: RunConfig, ctx: &LogContext) -> Self {
        PointingRun {
            config,
            registry: ModelRegistry::default(),
            solver: LeastSquaresConfig::default(),
            ctx: ctx.clone(),
        }
    }

    /// Use another registry, e.g. with extra model variants.
    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_solver(mut self, solver: LeastSquaresConfig) -> Self {
        self.solver = solver;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Check the configuration against the registry without touching any file.
    pub fn validate(&self) -> Result<(), RunError> {
        self.config
            .validate(&self.registry)
            .at_stage(RunStage::Configuration)
    }

    /// Remove entries from the configured observation file.
    ///
    /// The configuration is validated first, so an inconsistent run leaves the file as it is.
    ///
    /// Return
    /// ----------
    /// * The number of entries removed; unknown ids are logged and ignored.
    ///
    /// Errors
    /// ----------
    /// * [`RunStage::Configuration`] for inconsistent options.
    /// * [`RunStage::Loading`] if the file cannot be read or rewritten.
    pub fn delete_records(&self, nml_ids: &[u64]) -> Result<usize, RunError> {
        self.validate()?;

        let store = CsvObservationStore::new(self.config.analyzed_positions_path());
        let mut removed = 0;
        for &nml_id in nml_ids {
            if store.delete_record(nml_id).at_stage(RunStage::Loading)? {
                log::info!(target: self.ctx.target(), "deleted entry {nml_id}");
                removed += 1;
            } else {
                log::warn!(target: self.ctx.target(), "no entry {nml_id} to delete");
            }
        }
        Ok(removed)
    }

    /// Run on the CSV observation file named by the configuration.
    pub fn run_from_config(&self, sink: &mut dyn ResidualSink) -> Result<RunSummary, RunError> {
        let store = CsvObservationStore::new(self.config.analyzed_positions_path());
        self.run(&store, sink)
    }

    /// Run on `store`, publishing every fit to `sink`.
    ///
    /// Arguments
    /// -----------------
    /// * `store`: source of the observation records.
    /// * `sink`: receives the fit on all pairs, then the subset refits if enabled.
    ///
    /// Return
    /// ----------
    /// * A [`RunSummary`].
    ///
    /// Errors
    /// ----------
    /// * A [`RunError`] at [`RunStage::Configuration`] for inconsistent options, checked
    ///   before the store is opened.
    /// * [`RunStage::Loading`] for an unreadable store, an undecodable entry, or a batch with
    ///   no usable observation ([`PointingError::EmptyInput`]).
    /// * [`RunStage::Transform`], [`RunStage::ModelFit`], [`RunStage::Projection`] and
    ///   [`RunStage::Output`] for failures of the later steps.
    pub fn run(
        &self,
        store: &dyn ObservationStore,
        sink: &mut dyn ResidualSink,
    ) -> Result<RunSummary, RunError> {
        let config = &self.config;

        self.validate()?;
        let model = config
            .model(&self.registry)
            .at_stage(RunStage::Configuration)?;
        let site = Arc::new(config.site().at_stage(RunStage::Configuration)?);
        let frame = config.fit_frame();

        log::info!(
            target: self.ctx.target(),
            "pointing run: model {}, {} engine, {} frame, mount source {:?}",
            model.name(),
            config.strategy,
            frame,
            config.mount_source()
        );

        let mut batch = load(
            store,
            site,
            Some(config.break_after),
            config.mount_source(),
            &self.ctx,
        )
        .at_stage(RunStage::Loading)?;
        let records = batch
            .by_ref()
            .collect::<Result<Vec<_>, _>>()
            .at_stage(RunStage::Loading)?;
        let (read, skipped) = (batch.read(), batch.skipped());

        if records.is_empty() {
            return Err(RunError::new(
                RunStage::Loading,
                PointingError::EmptyInput(format!(
                    "no usable observation in {} ({read} entries read, {skipped} skipped)",
                    store.describe()
                )),
            ));
        }
        log::info!(
            target: self.ctx.target(),
            "{} observations loaded ({read} entries read, {skipped} skipped)",
            records.len()
        );

        let engine = config
            .strategy
            .engine(config.azimuth_convention, &self.ctx);
        let pairs = transform_batch(&records, engine.as_ref(), frame, &self.ctx)
            .at_stage(RunStage::Transform)?;

        let tag = format!("{}_{}", model.tag(), config.strategy.tag());
        let all = self.analyse(&pairs, &model, tag.clone())?;
        self.publish(sink, frame, &all)?;

        let (selected, dropped) = if config.refit_subsets {
            let selected = all.selection.selected_indices();
            let dropped = all.selection.dropped_indices();
            (
                self.refit(sink, frame, &pairs, &selected, &model, &tag, "selected")?,
                self.refit(sink, frame, &pairs, &dropped, &model, &tag, "dropped")?,
            )
        } else {
            (None, None)
        };

        Ok(RunSummary {
            read,
            skipped,
            pairs,
            all,
            selected,
            dropped,
        })
    }

    /// Fit, residuals, projections and selection for `pairs`.
    fn analyse(
        &self,
        pairs: &[TransformedPair],
        model: &Arc<dyn PointingModel>,
        tag: String,
    ) -> Result<FitOutcome, RunError> {
        let indices: Vec<usize> = (0..pairs.len()).collect();
        let fitted = fit(pairs, &indices, model, &self.solver, &self.ctx.child("fit"))
            .at_stage(RunStage::ModelFit)?;

        let points = build_residuals(pairs, &fitted);

        let projections = ResidualAxis::ALL
            .iter()
            .map(|&axis| {
                fit_projection(&axis.arcsec(&points), self.config.bins)
                    .map(|fit| AxisProjection { axis, fit })
            })
            .collect::<Result<Vec<_>, _>>()
            .at_stage(RunStage::Projection)?;

        for p in &projections {
            log::log!(
                target: self.ctx.target(),
                status_level(p.fit.status),
                "{tag} {}: mean {:.2}\", spread {:.2}\" ({})",
                p.axis.name(),
                p.fit.mean,
                p.fit.spread,
                p.fit.status
            );
        }

        let selection = select(&points, self.config.threshold());
        log::info!(
            target: self.ctx.target(),
            "{tag}: {} stars above {}\", {} below",
            selection.selected.len(),
            self.config.threshold_arcsec,
            selection.dropped.len()
        );

        Ok(FitOutcome {
            tag,
            fitted,
            points,
            selection,
            projections,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn refit(
        &self,
        sink: &mut dyn ResidualSink,
        frame: FitFrame,
        pairs: &[TransformedPair],
        indices: &[usize],
        model: &Arc<dyn PointingModel>,
        tag: &str,
        subset: &str,
    ) -> Result<Option<FitOutcome>, RunError> {
        if indices.is_empty() {
            log::warn!(target: self.ctx.target(), "no {subset} stars, skipping the refit");
            return Ok(None);
        }

        let subset_pairs: Vec<TransformedPair> =
            indices.iter().map(|&i| pairs[i].clone()).collect();
        let outcome = self.analyse(&subset_pairs, model, format!("{tag}_{subset}"))?;
        self.publish(sink, frame, &outcome)?;
        Ok(Some(outcome))
    }

    fn publish(
        &self,
        sink: &mut dyn ResidualSink,
        frame: FitFrame,
        outcome: &FitOutcome,
    ) -> Result<(), RunError> {
        sink.publish(&ResidualReport {
            tag: &outcome.tag,
            frame,
            fitted: &outcome.fitted,
            points: &outcome.points,
            selection: &outcome.selection,
            projections: &outcome.projections,
        })
        .at_stage(RunStage::Output)
    }
}
