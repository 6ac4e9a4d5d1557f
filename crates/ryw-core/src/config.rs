//! Consistency configuration
//!
//! Built once at process start and passed explicitly into every component.
//! Nothing in this crate reads environment variables; the server crate does
//! that at the boundary.

use crate::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_POLL_TIMEOUT_MS, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Replication wait tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Pause between position reads, in milliseconds
    pub interval_ms: u64,
    /// Total budget for a single wait, in milliseconds
    pub timeout_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
        }
    }
}

impl PollConfig {
    /// Create a poll configuration from millisecond values
    pub fn new(interval_ms: u64, timeout_ms: u64) -> Self {
        Self {
            interval_ms,
            timeout_ms,
        }
    }

    /// Pause between reads
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Wait budget
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Process-wide defaults for the consistency protocol
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsistencyConfig {
    /// Directory holding the leader marker and position records
    pub marker_dir: Option<PathBuf>,

    /// Database file name; the position record is `<name>-pos`
    pub database_name: Option<String>,

    /// Identity of this process (host name equivalent); empty means unset
    pub current_instance: String,

    /// Replication wait tuning
    pub poll: PollConfig,

    /// Application name, used only for peer address discovery
    pub app_name: Option<String>,

    /// Application port, used only for peer address discovery
    pub port: Option<u16>,
}

impl Default for ConsistencyConfig {
    fn default() -> Self {
        Self {
            marker_dir: None,
            database_name: None,
            current_instance: String::new(),
            poll: PollConfig::default(),
            app_name: None,
            port: None,
        }
    }
}

impl ConsistencyConfig {
    /// Create a configuration for the given instance identity
    pub fn new(current_instance: impl Into<String>) -> Self {
        Self {
            current_instance: current_instance.into(),
            ..Default::default()
        }
    }

    /// Set the marker directory
    pub fn with_marker_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.marker_dir = Some(dir.into());
        self
    }

    /// Set the database name
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = Some(name.into());
        self
    }

    /// Set wait tuning
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Set application name and port for discovery
    pub fn with_app(mut self, app_name: impl Into<String>, port: u16) -> Self {
        self.app_name = Some(app_name.into());
        self.port = Some(port);
        self
    }

    /// Marker directory from an explicit override or the configured default
    pub fn resolve_marker_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf> {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.marker_dir.clone())
            .ok_or_else(|| Error::config("marker directory not supplied and no default configured"))
    }

    /// Database name from an explicit override or the configured default
    pub fn resolve_database_name(&self, override_name: Option<&str>) -> Result<String> {
        override_name
            .map(str::to_string)
            .or_else(|| self.database_name.clone())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::config("database name not supplied and no default configured"))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.current_instance.trim().is_empty() {
            return Err(Error::config("current_instance is not set"));
        }

        if self.poll.interval_ms == 0 {
            return Err(Error::config("poll interval must be at least 1ms"));
        }

        if self.app_name.is_some() != self.port.is_some() {
            return Err(Error::config(
                "app_name and port must be configured together",
            ));
        }

        Ok(())
    }
}
