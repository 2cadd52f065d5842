use std::fmt;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PointingError {
    #[error("Invalid site location: {0}")]
    InvalidSite(String),

    #[error("Invalid observation time: {0}")]
    InvalidTime(String),

    #[error("Observation source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Mutually exclusive options requested: {0}")]
    ConfigurationConflict(String),

    #[error("Invalid configuration value: {0}")]
    InvalidConfiguration(String),

    #[error("Unknown pointing model: {0}")]
    UnknownModel(String),

    #[error("Unknown transform strategy: {0}")]
    UnknownStrategy(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to parse configuration file: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl From<ordered_float::FloatIsNan> for PointingError {
    fn from(_: ordered_float::FloatIsNan) -> Self {
        PointingError::InvalidSite("NaN coordinate".to_string())
    }
}

impl PartialEq for PointingError {
    fn eq(&self, other: &Self) -> bool {
        use PointingError::*;
        match (self, other) {
            (InvalidSite(a), InvalidSite(b)) => a == b,
            (InvalidTime(a), InvalidTime(b)) => a == b,
            (SourceUnavailable(a), SourceUnavailable(b)) => a == b,
            (EmptyInput(a), EmptyInput(b)) => a == b,
            (ConfigurationConflict(a), ConfigurationConflict(b)) => a == b,
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (UnknownModel(a), UnknownModel(b)) => a == b,
            (UnknownStrategy(a), UnknownStrategy(b)) => a == b,

            // not comparable by payload: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (YamlError(_), YamlError(_)) => true,

            _ => false,
        }
    }
}

impl PointingError {
    /// `true` for the variant, regardless of its message.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, PointingError::EmptyInput(_))
    }
}

/// Stage of a pointing run at which a fatal error happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Configuration,
    Loading,
    Transform,
    ModelFit,
    Projection,
    Output,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Configuration => "configuration",
            RunStage::Loading => "loading",
            RunStage::Transform => "frame transform",
            RunStage::ModelFit => "model fit",
            RunStage::Projection => "projection fit",
            RunStage::Output => "output",
        };
        f.write_str(name)
    }
}

/// A fatal error annotated with the stage that produced it.
#[derive(Error, Debug, PartialEq)]
#[error("{stage} failed: {source}")]
pub struct RunError {
    pub stage: RunStage,
    #[source]
    pub source: PointingError,
}

impl RunError {
    pub fn new(stage: RunStage, source: PointingError) -> Self {
        RunError { stage, source }
    }
}

/// Attach a [`RunStage`] to a fallible step.
pub trait AtStage<T> {
    fn at_stage(self, stage: RunStage) -> Result<T, RunError>;
}

impl<T> AtStage<T> for Result<T, PointingError> {
    fn at_stage(self, stage: RunStage) -> Result<T, RunError> {
        self.map_err(|e| RunError::new(stage, e))
    }
}
