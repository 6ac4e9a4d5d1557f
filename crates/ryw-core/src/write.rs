//! Write-path helpers
//!
//! Writes never wait: a replica hands the request to the primary straight
//! away. After a successful write the primary mints a cookie carrying its
//! position so the client's next read has a floor to wait for.

use crate::config::ConsistencyConfig;
use crate::cookie::{self, CookieAttributes};
use crate::instance::InstanceResolver;
use crate::position::{PositionReader, PositionSource};
use crate::replay::ReplayDirective;
use crate::Result;

/// Primary enforcement and post-write cookie minting
#[derive(Debug, Clone)]
pub struct WriteGate<S = PositionReader> {
    resolver: InstanceResolver,
    source: S,
    cookie: CookieAttributes,
}

impl WriteGate {
    /// Build a file-backed gate from configuration
    pub fn from_config(config: &ConsistencyConfig, cookie: CookieAttributes) -> Result<Self> {
        let resolver = InstanceResolver::from_config(config, None)?;
        let reader = PositionReader::from_config(config, None, None)?;
        Ok(Self::new(resolver, reader, cookie))
    }
}

impl<S: PositionSource> WriteGate<S> {
    /// Assemble a gate from its parts
    pub fn new(resolver: InstanceResolver, source: S, cookie: CookieAttributes) -> Self {
        Self {
            resolver,
            source,
            cookie,
        }
    }

    /// Cookie attributes used for minted cookies
    pub fn cookie_attributes(&self) -> &CookieAttributes {
        &self.cookie
    }

    /// `None` on the primary, otherwise a directive naming the primary
    pub async fn require_primary(&self) -> Option<ReplayDirective> {
        let info = self.resolver.resolve().await;
        if info.current_is_primary {
            None
        } else {
            tracing::debug!(primary = %info.primary_instance, "write on replica, replaying");
            Some(ReplayDirective::to_instance(info.primary_instance))
        }
    }

    /// `None` when running on `instance`, otherwise a directive naming it
    pub fn require_instance(&self, instance: &str) -> Option<ReplayDirective> {
        if self.resolver.current_instance() == instance {
            None
        } else {
            Some(ReplayDirective::to_instance(instance))
        }
    }

    /// `Set-Cookie` value carrying the position read after the write
    ///
    /// Only meaningful on the primary; callers check `require_primary` first.
    pub async fn mint_post_write_cookie(&self) -> String {
        let tx = self.source.tx_number().await;
        cookie::encode(tx, &self.cookie)
    }
}
