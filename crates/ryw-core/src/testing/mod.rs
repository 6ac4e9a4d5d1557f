//! Testing infrastructure for ryw core
//!
//! Provides a [`TestContext`] that stands in for the replication layer: it
//! owns a temporary marker directory and writes the leader marker and
//! position record on demand.
//!
//! # Usage
//!
//! ```rust,ignore
//! use ryw_core::testing::TestContext;
//! use ryw_core::{ConsistencyDecision, ConsistencyEngine, TxNumber};
//!
//! # async fn demo() {
//! let ctx = TestContext::new();
//! ctx.set_primary("otherhost");
//! ctx.set_position(TxNumber(2));
//! let engine = ConsistencyEngine::from_config(&ctx.config("thishost")).unwrap();
//! let decision = engine.decide(Some("txnum=3")).await;
//! assert!(matches!(decision, ConsistencyDecision::Replay(_)));
//! # }
//! ```

mod context;

pub use context::TestContext;
