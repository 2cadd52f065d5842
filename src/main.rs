use std::fs::File;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

use pointfit::config::RunConfig;
use pointfit::log_context::LogContext;
use pointfit::pointing::PointingRun;
use pointfit::pointing_errors::PointingError;
use pointfit::sink::CsvResidualSink;
use pointfit::transform::TransformStrategy;

/// Parse a number where a leading `m` stands for a minus sign (`m75.1` is `-75.1`).
fn signed_number(s: &str) -> Result<f64, String> {
    let value = match s.strip_prefix('m') {
        Some(rest) => rest.parse::<f64>().map(|v| -v),
        None => s.parse::<f64>(),
    };
    value.map_err(|e| format!("{s}: {e}"))
}

#[derive(Parser, Debug)]
#[command(name = "pointfit")]
#[command(about = "Fit a telescope pointing model to recorded star observations")]
struct Cli {
    /// YAML configuration file; command line options take precedence
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    level: LevelFilter,

    /// Log to the console instead of <base-path>/pointfit.log
    #[arg(long)]
    toconsole: bool,

    /// Directory holding the observation file and receiving the outputs
    #[arg(long)]
    base_path: Option<Utf8PathBuf>,

    /// Observation file, relative to the base path
    #[arg(long)]
    analyzed_positions: Option<String>,

    /// Transform engine: rigorous (astropy) or legacy (libnova)
    #[arg(long)]
    strategy: Option<TransformStrategy>,

    /// Registered pointing model name
    #[arg(long)]
    model: Option<String>,

    /// Site longitude, degrees east (m10 for -10)
    #[arg(long, value_parser = signed_number)]
    obs_longitude: Option<f64>,

    /// Site latitude, degrees (m75.1 for -75.1)
    #[arg(long, value_parser = signed_number)]
    obs_latitude: Option<f64>,

    /// Site height, meters
    #[arg(long, value_parser = signed_number)]
    obs_height: Option<f64>,

    /// Use the astrometric solution as mount position instead of the centroid
    #[arg(long)]
    fit_astr: bool,

    /// Fit in hour angle / declination
    #[arg(long)]
    fit_eq: bool,

    /// TPOINT-style equatorial fit (implies --fit-eq)
    #[arg(long)]
    t_point: bool,

    /// Add azimuth harmonics to the alt/az model
    #[arg(long)]
    fit_plus_poly: bool,

    /// Histogram bins of the projection fits
    #[arg(long)]
    bins: Option<usize>,

    /// Read at most this many stored entries
    #[arg(long)]
    break_after: Option<usize>,

    /// Residual distance above which a star is selected, arcseconds
    #[arg(long)]
    threshold: Option<f64>,

    /// Refit the model on the selected and on the dropped stars
    #[arg(long)]
    refit_subsets: bool,

    /// Remove these entries from the observation file before fitting
    #[arg(long, num_args = 1..)]
    delete: Vec<u64>,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, PointingError> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(base_path) = &self.base_path {
            config.base_path = base_path.clone();
        }
        if let Some(analyzed_positions) = &self.analyzed_positions {
            config.analyzed_positions = analyzed_positions.clone();
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(longitude) = self.obs_longitude {
            config.site.longitude = longitude;
        }
        if let Some(latitude) = self.obs_latitude {
            config.site.latitude = latitude;
        }
        if let Some(height) = self.obs_height {
            config.site.height = height;
        }
        if let Some(bins) = self.bins {
            config.bins = bins;
        }
        if let Some(break_after) = self.break_after {
            config.break_after = break_after;
        }
        if let Some(threshold) = self.threshold {
            config.threshold_arcsec = threshold;
        }

        config.fit_astr |= self.fit_astr;
        config.fit_eq |= self.fit_eq;
        config.t_point |= self.t_point;
        config.fit_plus_poly |= self.fit_plus_poly;
        config.refit_subsets |= self.refit_subsets;

        Ok(config)
    }
}

fn init_logging(level: LevelFilter, to_console: bool, config: &RunConfig) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);

    if !to_console {
        std::fs::create_dir_all(&config.base_path)?;
        let log_file = File::create(config.base_path.join("pointfit.log"))?;
        builder.target(env_logger::Target::Pipe(Box::new(log_file)));
    }

    builder.init();
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match cli.run_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let ctx = LogContext::default();
    let run = PointingRun::new(config, &ctx);

    // nothing is created or rewritten for an inconsistent run
    if let Err(e) = run.validate() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = init_logging(cli.level, cli.toconsole, run.config()) {
        eprintln!("unable to set up logging in {}: {e}", run.config().base_path);
        return ExitCode::FAILURE;
    }

    if !cli.delete.is_empty() {
        if let Err(e) = run.delete_records(&cli.delete) {
            log::error!(target: ctx.target(), "{e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    }

    let mut sink = CsvResidualSink::new(&run.config().base_path, &ctx);

    match run.run_from_config(&mut sink) {
        Ok(summary) => {
            let fitted = &summary.all.fitted;
            println!(
                "{}: {} points, {} ({} iterations), rms {:.2}\"",
                summary.all.tag,
                fitted.n_points,
                fitted.status,
                fitted.iterations,
                fitted.rms().to_degrees() * 3600.0
            );
            for parameter in fitted.named_parameters() {
                println!("  {parameter}");
            }
            for file in sink.written() {
                println!("wrote {file}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!(target: ctx.target(), "{e}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
