//! Peer address discovery
//!
//! Computes the private-network address of a sibling instance so a node can
//! talk to the primary directly. Not involved in the consistency decision.

use crate::config::ConsistencyConfig;
use crate::instance::InstanceInfo;
use crate::{Error, Result};

/// Builds internal addresses for instances of one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceDiscovery {
    app_name: String,
    port: u16,
}

impl InstanceDiscovery {
    /// Create a discovery helper for `app_name` listening on `port`
    pub fn new(app_name: impl Into<String>, port: u16) -> Self {
        Self {
            app_name: app_name.into(),
            port,
        }
    }

    /// Build from configuration; requires both app name and port
    pub fn from_config(config: &ConsistencyConfig) -> Result<Self> {
        let app_name = config
            .app_name
            .clone()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::config("app_name is required for instance discovery"))?;
        let port = config
            .port
            .ok_or_else(|| Error::config("port is required for instance discovery"))?;
        Ok(Self::new(app_name, port))
    }

    /// Internal URL of `instance`
    pub fn internal_address(&self, instance: &str) -> String {
        format!(
            "http://{instance}.vm.{}.internal:{}",
            self.app_name, self.port
        )
    }

    /// Internal URL of the current primary
    pub fn primary_address(&self, info: &InstanceInfo) -> String {
        self.internal_address(&info.primary_instance)
    }
}
