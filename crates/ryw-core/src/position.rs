//! Replication position reading
//!
//! The replication layer writes `<database>-pos` next to the leader marker.
//! Its content is `<hex txid>/<hex checksum>`; only the first field matters
//! here.

use crate::config::ConsistencyConfig;
use crate::{POSITION_FILE_SUFFIX, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Replication position: every write up to and including this one is applied
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TxNumber(pub u64);

impl TxNumber {
    /// Position of a store with no replication history
    pub const ZERO: TxNumber = TxNumber(0);

    /// Raw counter value
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for TxNumber {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl fmt::Display for TxNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TxNumber {
    type Err = std::num::ParseIntError;

    /// Parses the decimal form used on the wire
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.parse::<u64>().map(TxNumber)
    }
}

/// Parse a position record, returning the leading hex field
pub fn parse_position(content: &str) -> Option<TxNumber> {
    let head = content.trim().split('/').next()?.trim();
    if head.is_empty() {
        return None;
    }
    u64::from_str_radix(head, 16).ok().map(TxNumber)
}

/// Source of the current replication position
///
/// Implementations must never fail; anything unreadable is position zero.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Read the current position
    async fn tx_number(&self) -> TxNumber;
}

/// Reads the position record from the marker directory
#[derive(Debug, Clone)]
pub struct PositionReader {
    path: PathBuf,
}

impl PositionReader {
    /// Create a reader for an explicit directory and database name
    pub fn new(marker_dir: impl AsRef<Path>, database_name: &str) -> Self {
        Self {
            path: marker_dir
                .as_ref()
                .join(format!("{database_name}{POSITION_FILE_SUFFIX}")),
        }
    }

    /// Create a reader from configuration, with optional overrides
    ///
    /// Fails with a configuration error when the directory or the database
    /// name cannot be resolved.
    pub fn from_config(
        config: &ConsistencyConfig,
        marker_dir: Option<&Path>,
        database_name: Option<&str>,
    ) -> Result<Self> {
        let dir = config.resolve_marker_dir(marker_dir)?;
        let name = config.resolve_database_name(database_name)?;
        Ok(Self::new(dir, &name))
    }

    /// Path of the position record
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current position
    pub async fn read(&self) -> TxNumber {
        let content = tokio::fs::read_to_string(&self.path).await;
        self.interpret(content)
    }

    /// Read the current position without an async runtime
    pub fn read_blocking(&self) -> TxNumber {
        self.interpret(std::fs::read_to_string(&self.path))
    }

    fn interpret(&self, read: io::Result<String>) -> TxNumber {
        match read {
            Ok(content) => parse_position(&content).unwrap_or_else(|| {
                tracing::warn!(
                    path = %self.path.display(),
                    content = %content.trim(),
                    "malformed position record, using 0"
                );
                TxNumber::ZERO
            }),
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    tracing::debug!(path = %self.path.display(), "no position record yet, using 0");
                } else {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "failed to read position record, using 0"
                    );
                }
                TxNumber::ZERO
            }
        }
    }
}

#[async_trait]
impl PositionSource for PositionReader {
    async fn tx_number(&self) -> TxNumber {
        self.read().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestContext;

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("0000000000000003/c1a2b3d4"), Some(TxNumber(3)));
        assert_eq!(parse_position("ff/0"), Some(TxNumber(255)));
        assert_eq!(parse_position("1A\n"), Some(TxNumber(26)));
        assert_eq!(parse_position("  10/abc  \n"), Some(TxNumber(16)));
        assert_eq!(parse_position(""), None);
        assert_eq!(parse_position("/abc"), None);
        assert_eq!(parse_position("zz/00"), None);
    }

    #[tokio::test]
    async fn test_read_position_file() {
        let ctx = TestContext::new();
        ctx.set_position(TxNumber(0x2a));
        let reader = PositionReader::new(ctx.path(), TestContext::DATABASE_NAME);

        assert_eq!(reader.read().await, TxNumber(42));
        assert_eq!(reader.read_blocking(), TxNumber(42));
        assert_eq!(reader.tx_number().await, TxNumber(42));
    }

    #[tokio::test]
    async fn test_missing_file_is_zero() {
        let ctx = TestContext::new();
        let reader = PositionReader::new(ctx.path(), TestContext::DATABASE_NAME);
        assert_eq!(reader.read().await, TxNumber::ZERO);
    }

    #[test]
    fn test_garbage_is_zero() {
        let ctx = TestContext::new();
        ctx.write_position_raw("not a position");
        let reader = PositionReader::new(ctx.path(), TestContext::DATABASE_NAME);
        assert_eq!(reader.read_blocking(), TxNumber::ZERO);
    }

    #[test]
    fn test_path_uses_database_name() {
        let reader = PositionReader::new("/litefs", "sqlite.db");
        assert_eq!(reader.path(), Path::new("/litefs/sqlite.db-pos"));
    }

    #[test]
    fn test_from_config_errors() {
        let config = ConsistencyConfig::new("thishost");
        assert!(PositionReader::from_config(&config, None, Some("db")).unwrap_err().is_config());

        let config = config.with_marker_dir("/litefs");
        assert!(PositionReader::from_config(&config, None, None).unwrap_err().is_config());

        let reader = PositionReader::from_config(&config, None, Some("app.db")).unwrap();
        assert_eq!(reader.path(), Path::new("/litefs/app.db-pos"));
    }

    #[test]
    fn test_tx_number_display_and_parse() {
        assert_eq!(TxNumber(10).to_string(), "10");
        assert_eq!("10".parse::<TxNumber>().unwrap(), TxNumber(10));
        assert!("-1".parse::<TxNumber>().is_err());
        assert!(TxNumber(3) > TxNumber(2));
    }
}
