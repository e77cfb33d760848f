//! Error hierarchy for the loadwatch I/O boundary
//!
//! The analytics core (normalization, windowing, classification, axis
//! scaling, gauges) is total and never returns these errors. They only arise
//! when decoding payloads from text, loading configuration, or writing output.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for loadwatch operations
#[derive(Debug, Error)]
pub enum LoadWatchError {
    /// Timeseries payload is not valid JSON
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found at specified path
    #[error("Config file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// TOML could not be parsed
    #[error("Invalid TOML in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    /// Gauge range is empty or inverted
    #[error("Invalid gauge range for {metric}: min={min}, max={max}")]
    InvalidRange { metric: String, min: f64, max: f64 },

    /// A threshold or bound is NaN or infinite
    #[error("Non-finite value for {metric}.{field}")]
    NonFinite { metric: String, field: String },

    /// Axis settings that cannot produce a chart
    #[error("Invalid axis setting {parameter}={value}")]
    InvalidAxis { parameter: String, value: String },
}

/// Result type alias for loadwatch operations
pub type Result<T> = std::result::Result<T, LoadWatchError>;

impl LoadWatchError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LoadWatchError::Configuration(ConfigError::FileNotFound { .. }) => {
                ErrorSeverity::Warning
            }
            LoadWatchError::Payload(_) => ErrorSeverity::Error,
            LoadWatchError::Configuration(_) => ErrorSeverity::Error,
            LoadWatchError::Io(_) => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LoadWatchError::Payload(e) => {
                format!(
                    "Timeseries data could not be read (line {}, column {}).",
                    e.line(),
                    e.column()
                )
            }
            LoadWatchError::Configuration(ConfigError::FileNotFound { path }) => {
                format!("Could not find config file: {}", path.display())
            }
            LoadWatchError::Configuration(ConfigError::Parse { path, .. }) => {
                format!("Config file {} is not valid TOML.", path.display())
            }
            LoadWatchError::Configuration(ConfigError::InvalidRange { metric, .. }) => {
                format!(
                    "Gauge for {} has an empty range. Check min and max in your config.",
                    metric
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}
