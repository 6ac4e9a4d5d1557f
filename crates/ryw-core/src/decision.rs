//! Read-path consistency decision
//!
//! For each inbound read the engine looks at the client's transaction cookie
//! and decides whether the request can be served here:
//!
//! ```text
//! cookie absent ─────────────────────────────► Proceed
//! cookie malformed ──────────────────────────► Stripped
//! this node is primary ──────────────────────► Stripped
//! replica, caught up within the poll budget ─► Stripped
//! replica, still behind at the deadline ─────► Replay(primary)
//! ```
//!
//! Nothing is cached between calls; every decision re-reads the marker and
//! the position record.

use crate::config::{ConsistencyConfig, PollConfig};
use crate::cookie::{self, CookieValue};
use crate::instance::InstanceResolver;
use crate::position::{PositionReader, PositionSource};
use crate::replay::ReplayDirective;
use crate::waiter::{Pause, ReplicationWaiter, TokioPause};
use crate::Result;

/// Outcome of the read-path consistency check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencyDecision {
    /// No cookie, nothing to reconcile
    Proceed,
    /// Serve the request here and clear the cookie
    Stripped,
    /// Re-issue the request against another instance
    Replay(ReplayDirective),
}

impl ConsistencyDecision {
    /// Whether the response must carry a cookie deletion
    pub fn clears_cookie(&self) -> bool {
        matches!(self, Self::Stripped)
    }
}

/// Combines role resolution, cookie decoding and the replication wait
#[derive(Debug, Clone)]
pub struct ConsistencyEngine<S = PositionReader, P = TokioPause> {
    resolver: InstanceResolver,
    waiter: ReplicationWaiter<S, P>,
    poll: PollConfig,
}

impl ConsistencyEngine {
    /// Build a file-backed engine from configuration
    ///
    /// Fails with a configuration error when the marker directory or the
    /// database name is missing.
    pub fn from_config(config: &ConsistencyConfig) -> Result<Self> {
        let resolver = InstanceResolver::from_config(config, None)?;
        let reader = PositionReader::from_config(config, None, None)?;
        Ok(Self::new(resolver, ReplicationWaiter::new(reader), config.poll))
    }
}

impl<S: PositionSource, P: Pause> ConsistencyEngine<S, P> {
    /// Assemble an engine from its parts
    pub fn new(resolver: InstanceResolver, waiter: ReplicationWaiter<S, P>, poll: PollConfig) -> Self {
        Self {
            resolver,
            waiter,
            poll,
        }
    }

    /// Role resolver
    pub fn resolver(&self) -> &InstanceResolver {
        &self.resolver
    }

    /// Position source
    pub fn position(&self) -> &S {
        self.waiter.source()
    }

    /// Wait tuning
    pub fn poll(&self) -> &PollConfig {
        &self.poll
    }

    /// Decide how to handle a read carrying `cookie_header`
    pub async fn decide(&self, cookie_header: Option<&str>) -> ConsistencyDecision {
        let seen = match cookie::decode(cookie_header) {
            CookieValue::Absent => return ConsistencyDecision::Proceed,
            CookieValue::Invalid(raw) => {
                tracing::warn!(value = %raw, "malformed transaction cookie, clearing it");
                return ConsistencyDecision::Stripped;
            }
            CookieValue::Valid(tx) => tx,
        };

        let info = self.resolver.resolve().await;
        if info.current_is_primary {
            let own = self.position().tx_number().await;
            if seen > own {
                tracing::error!(
                    cookie = %seen,
                    primary = %own,
                    instance = %info.current_instance,
                    "client cookie is ahead of the primary's own position"
                );
            }
            return ConsistencyDecision::Stripped;
        }

        if self.waiter.wait_for(seen, &self.poll).await {
            ConsistencyDecision::Stripped
        } else {
            tracing::info!(
                cookie = %seen,
                primary = %info.primary_instance,
                "replica did not catch up in time, replaying to primary"
            );
            ConsistencyDecision::Replay(ReplayDirective::to_instance(info.primary_instance))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::TxNumber;
    use crate::testing::TestContext;
    use std::time::Duration;

    fn engine(ctx: &TestContext, poll: PollConfig) -> ConsistencyEngine {
        let config = ctx.config("thishost").with_poll(poll);
        ConsistencyEngine::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_no_cookie_proceeds() {
        let ctx = TestContext::new();
        ctx.set_primary("otherhost");
        let engine = engine(&ctx, PollConfig::default());

        assert_eq!(engine.decide(None).await, ConsistencyDecision::Proceed);
        assert_eq!(
            engine.decide(Some("session=abc")).await,
            ConsistencyDecision::Proceed
        );
    }

    #[tokio::test]
    async fn test_primary_strips_invalid_cookie() {
        let ctx = TestContext::new();
        let engine = engine(&ctx, PollConfig::default());

        let decision = engine.decide(Some("txnum=invalid")).await;
        assert_eq!(decision, ConsistencyDecision::Stripped);
        assert!(decision.clears_cookie());
    }

    #[tokio::test]
    async fn test_replica_strips_invalid_cookie_without_waiting() {
        let ctx = TestContext::new();
        ctx.set_primary("otherhost");
        let engine = engine(&ctx, PollConfig::new(30, 5_000));

        let start = std::time::Instant::now();
        assert_eq!(
            engine.decide(Some("txnum=abc")).await,
            ConsistencyDecision::Stripped
        );
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_primary_never_replays() {
        let ctx = TestContext::new();
        ctx.set_position(TxNumber(5));
        let engine = engine(&ctx, PollConfig::default());

        for cookie in ["txnum=0", "txnum=5", "txnum=6", "txnum=18446744073709551615"] {
            assert_eq!(
                engine.decide(Some(cookie)).await,
                ConsistencyDecision::Stripped,
                "cookie {cookie}"
            );
        }
    }

    #[tokio::test]
    async fn test_primary_named_in_marker_is_primary() {
        let ctx = TestContext::new();
        ctx.set_primary("thishost");
        let engine = engine(&ctx, PollConfig::default());

        assert_eq!(
            engine.decide(Some("txnum=100")).await,
            ConsistencyDecision::Stripped
        );
    }

    #[tokio::test]
    async fn test_replica_already_caught_up() {
        let ctx = TestContext::new();
        ctx.set_primary("otherhost");
        ctx.set_position(TxNumber(4));
        let engine = engine(&ctx, PollConfig::default());

        assert_eq!(
            engine.decide(Some("txnum=3")).await,
            ConsistencyDecision::Stripped
        );
    }

    #[tokio::test]
    async fn test_replica_behind_replays_to_primary() {
        let ctx = TestContext::new();
        ctx.set_primary("otherhost");
        ctx.set_position(TxNumber(2));
        let engine = engine(&ctx, PollConfig::new(10, 50));

        assert_eq!(
            engine.decide(Some("txnum=3")).await,
            ConsistencyDecision::Replay(ReplayDirective::to_instance("otherhost"))
        );
    }
}
