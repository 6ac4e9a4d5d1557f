//! Replay directive

use serde::{Deserialize, Serialize};
use std::fmt;

/// Instructs the edge to re-issue the request against another instance
///
/// Rendering this into a header and status code is up to the adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplayDirective {
    /// Instance that should handle the request
    pub target_instance: String,
}

impl ReplayDirective {
    /// Create a directive targeting `instance`
    pub fn to_instance(instance: impl Into<String>) -> Self {
        Self {
            target_instance: instance.into(),
        }
    }
}

impl fmt::Display for ReplayDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance={}", self.target_instance)
    }
}
