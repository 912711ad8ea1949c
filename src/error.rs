//! Error types for runprep

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for runprep operations
pub type Result<T> = std::result::Result<T, PrepError>;

/// Main error type for runprep
#[derive(Error, Debug)]
pub enum PrepError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Template substitution errors
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Forecast-hour cadence errors
    #[error("Cadence error: {0}")]
    Cadence(#[from] CadenceError),

    /// Staging/sync errors
    #[error("Staging error: {0}")]
    Stage(#[from] StageError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration capture and access errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required runtime key '{0}' is absent from the configuration")]
    MissingRuntimeKey(String),

    #[error("Configuration key '{0}' is not defined")]
    MissingKey(String),

    #[error("Configuration key '{key}' holds '{value}', expected {wanted}")]
    BadCast {
        key: String,
        value: String,
        wanted: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read environment file '{path}': {error}")]
    EnvFile { path: PathBuf, error: String },
}

/// Placeholder resolution errors
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Placeholder '{name}' could not be resolved in \"{within}\"")]
    UnresolvedPlaceholder { name: String, within: String },
}

/// Forecast-hour scheduling errors
#[derive(Error, Debug)]
pub enum CadenceError {
    #[error("Interval '{name}' must be positive, got {value}")]
    InvalidInterval { name: &'static str, value: i64 },
}

/// Staging/sync errors
#[derive(Error, Debug)]
pub enum StageError {
    #[error("Failed to {action} {src:?} -> {dest:?}: {source}")]
    Entry {
        action: &'static str,
        src: Option<PathBuf>,
        dest: PathBuf,
        source: io::Error,
    },

    #[error("{} staging entries failed: {}", .0.len(), summarize(.0))]
    Batch(Vec<StageError>),
}

fn summarize(failures: &[StageError]) -> String {
    failures
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for template substitution
pub type TemplateResult<T> = std::result::Result<T, TemplateError>;

/// Specialized result type for cadence computations
pub type CadenceResult<T> = std::result::Result<T, CadenceError>;

/// Specialized result type for staging operations
pub type StageResult<T> = std::result::Result<T, StageError>;
