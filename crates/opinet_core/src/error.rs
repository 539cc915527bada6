//! Error types for the opinion dynamics core.
//!
//! Only configuration problems and I/O on the output sink are errors. Numerical
//! degeneracies inside a step are logged and recovered locally instead.

use thiserror::Error;

/// Main error type for opinet_core operations.
#[derive(Error, Debug)]
pub enum ModelError {
    /// A parameter is outside its admissible range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The TOML document could not be parsed into a configuration
    #[error("Config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// The requested network cannot be built with the given size
    #[error("Network construction error: {0}")]
    Network(String),

    /// Output sink failures
    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),

    /// Snapshot serialization failures
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<ModelError>,
    },
}

/// Result type alias for opinet_core operations.
pub type Result<T> = std::result::Result<T, ModelError>;

impl ModelError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a new network construction error.
    #[must_use]
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

/// Returns early with an [`ModelError::InvalidConfig`] unless `cond` holds.
macro_rules! ensure_config {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::ModelError::invalid_config(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure_config;
