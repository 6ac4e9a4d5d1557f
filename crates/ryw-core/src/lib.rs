//! ryw Core - Read-your-writes consistency for replicated SQLite nodes
//!
//! In a single-writer deployment the replication layer keeps two facts on
//! disk: which instance is primary, and how far this node has replicated.
//! This crate turns those facts into per-request decisions:
//! - Resolve whether this process is the primary or a replica
//! - Read the local replication position (transaction number)
//! - Encode/decode the `txnum` cookie a client carries after writing
//! - Wait a bounded time for a replica to catch up to the client's cookie
//! - Decide to proceed, clear the cookie, or replay to the primary
//!
//! # Architecture
//!
//! ```text
//!        request cookie
//!              │
//! ┌────────────▼────────────┐      ┌────────────────────┐
//! │   ConsistencyEngine     │─────►│  InstanceResolver  │──► <dir>/.primary
//! │ Proceed/Stripped/Replay │      └────────────────────┘
//! └────────────┬────────────┘
//!              │
//! ┌────────────▼────────────┐      ┌────────────────────┐
//! │   ReplicationWaiter     │─────►│   PositionReader   │──► <dir>/<db>-pos
//! └─────────────────────────┘      └────────────────────┘
//! ```
//!
//! Writes go through [`WriteGate`]: replicas replay immediately, the primary
//! mints a fresh cookie once the write is done.
//!
//! Read failures on either file never reach the caller. A missing marker
//! means "this node is primary" and a missing position means zero. Only
//! missing configuration is an error.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod cookie;
pub mod decision;
pub mod discovery;
pub mod error;
pub mod instance;
pub mod position;
pub mod replay;
pub mod waiter;
pub mod write;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConsistencyConfig, PollConfig};
pub use cookie::{CookieAttributes, CookieValue, SameSite};
pub use decision::{ConsistencyDecision, ConsistencyEngine};
pub use discovery::InstanceDiscovery;
pub use error::{Error, Result};
pub use instance::{InstanceInfo, InstanceResolver};
pub use position::{PositionReader, PositionSource, TxNumber};
pub use replay::ReplayDirective;
pub use waiter::{Pause, ReplicationWaiter, TokioPause};
pub use write::WriteGate;

/// Name of the transaction-number cookie
pub const TX_COOKIE_NAME: &str = "txnum";

/// Leader marker file inside the marker directory
pub const PRIMARY_MARKER_FILE: &str = ".primary";

/// Suffix appended to the database name for the position record
pub const POSITION_FILE_SUFFIX: &str = "-pos";

/// Default pause between position reads
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30;

/// Default replication wait budget
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 500;
