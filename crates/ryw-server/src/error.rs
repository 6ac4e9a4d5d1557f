//! Server error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or starting the server
#[derive(Error, Debug)]
pub enum ServerError {
    /// Consistency protocol misconfiguration
    #[error(transparent)]
    Consistency(#[from] ryw_core::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config file {path:?}: {source}")]
    ConfigFile {
        /// File that failed to parse
        path: PathBuf,
        /// Parser error
        source: toml::de::Error,
    },

    /// Environment variable holds an unusable value
    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv {
        /// Variable name
        var: &'static str,
        /// Offending value
        value: String,
    },

    /// I/O errors (config file reads, socket binding)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    /// Create an invalid environment variable error
    pub fn invalid_env(var: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidEnv {
            var,
            value: value.into(),
        }
    }
}
