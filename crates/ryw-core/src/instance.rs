//! Instance role resolution
//!
//! The replication layer maintains a `.primary` marker file in the marker
//! directory naming the current write-primary. The file is absent on the
//! primary itself, so a missing marker means this node holds the write lease.

use crate::config::ConsistencyConfig;
use crate::{PRIMARY_MARKER_FILE, Result};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Snapshot of the current leadership view
///
/// Never cache this across requests; leadership can move at any time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    /// Instance currently allowed to accept writes
    pub primary_instance: String,
    /// Identity of this process
    pub current_instance: String,
    /// Whether this process is the primary
    pub current_is_primary: bool,
}

impl InstanceInfo {
    fn from_marker(marker: Option<String>, current_instance: &str) -> Self {
        match marker {
            Some(primary) => Self {
                current_is_primary: primary == current_instance,
                primary_instance: primary,
                current_instance: current_instance.to_string(),
            },
            None => Self {
                primary_instance: current_instance.to_string(),
                current_instance: current_instance.to_string(),
                current_is_primary: true,
            },
        }
    }
}

/// Reads the leader marker and reports this node's role
#[derive(Debug, Clone)]
pub struct InstanceResolver {
    marker_path: PathBuf,
    current_instance: String,
}

impl InstanceResolver {
    /// Create a resolver for an explicit marker directory
    pub fn new(marker_dir: impl AsRef<Path>, current_instance: impl Into<String>) -> Self {
        Self {
            marker_path: marker_dir.as_ref().join(PRIMARY_MARKER_FILE),
            current_instance: current_instance.into(),
        }
    }

    /// Create a resolver from configuration, with an optional directory override
    ///
    /// Fails with a configuration error when neither the override nor the
    /// configuration names a marker directory.
    pub fn from_config(config: &ConsistencyConfig, marker_dir: Option<&Path>) -> Result<Self> {
        let dir = config.resolve_marker_dir(marker_dir)?;
        Ok(Self::new(dir, config.current_instance.clone()))
    }

    /// Path of the leader marker file
    pub fn marker_path(&self) -> &Path {
        &self.marker_path
    }

    /// Identity of this process
    pub fn current_instance(&self) -> &str {
        &self.current_instance
    }

    /// Resolve the current role
    pub async fn resolve(&self) -> InstanceInfo {
        let marker = tokio::fs::read_to_string(&self.marker_path).await;
        InstanceInfo::from_marker(self.interpret(marker), &self.current_instance)
    }

    /// Resolve the current role without an async runtime
    pub fn resolve_blocking(&self) -> InstanceInfo {
        let marker = std::fs::read_to_string(&self.marker_path);
        InstanceInfo::from_marker(self.interpret(marker), &self.current_instance)
    }

    fn interpret(&self, read: io::Result<String>) -> Option<String> {
        match read {
            Ok(content) => {
                let primary = content.trim();
                if primary.is_empty() {
                    tracing::warn!(
                        path = %self.marker_path.display(),
                        "leader marker is empty, assuming this instance is primary"
                    );
                    None
                } else {
                    Some(primary.to_string())
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.marker_path.display(),
                    "no leader marker, this instance is primary"
                );
                None
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.marker_path.display(),
                    error = %e,
                    "failed to read leader marker, assuming this instance is primary"
                );
                None
            }
        }
    }
}
