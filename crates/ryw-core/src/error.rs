//! Error types for ryw core

use thiserror::Error;

/// Result type alias using ryw Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types
///
/// Only configuration problems are surfaced to callers. Marker and position
/// read failures are logged and folded into defaults, so they never show up
/// here.
#[derive(Error, Debug)]
pub enum Error {
    /// Required path or identifier missing from both overrides and defaults
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for deployment misconfiguration (as opposed to runtime failures)
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
