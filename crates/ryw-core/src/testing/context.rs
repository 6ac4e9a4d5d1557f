//! TestContext - temporary marker directory with replication state helpers

use crate::config::{ConsistencyConfig, PollConfig};
use crate::position::TxNumber;
use crate::{POSITION_FILE_SUFFIX, PRIMARY_MARKER_FILE};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temporary marker directory that plays the part of the replication layer
///
/// The directory and everything written into it is removed on drop.
///
/// # Example
///
/// ```rust,ignore
/// use ryw_core::testing::TestContext;
/// use ryw_core::TxNumber;
///
/// let ctx = TestContext::new();
/// ctx.set_primary("otherhost");
/// ctx.set_position(TxNumber(3));
/// let config = ctx.config("thishost");
/// ```
pub struct TestContext {
    temp_dir: TempDir,
}

impl TestContext {
    /// Database name used for the position record
    pub const DATABASE_NAME: &'static str = "sqlite.db";

    /// Create a context with a fresh, existing temporary directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory");
        std::fs::create_dir_all(temp_dir.path()).expect("Failed to create test directory");
        Self { temp_dir }
    }

    /// Marker directory path
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of the leader marker
    pub fn marker_path(&self) -> PathBuf {
        self.path().join(PRIMARY_MARKER_FILE)
    }

    /// Path of the position record
    pub fn position_path(&self) -> PathBuf {
        self.path()
            .join(format!("{}{POSITION_FILE_SUFFIX}", Self::DATABASE_NAME))
    }

    /// Configuration pointing at this directory, with a short poll budget
    pub fn config(&self, current_instance: &str) -> ConsistencyConfig {
        ConsistencyConfig::new(current_instance)
            .with_marker_dir(self.path())
            .with_database_name(Self::DATABASE_NAME)
            .with_poll(PollConfig::new(10, 100))
    }

    /// Name `instance` as the primary
    pub fn set_primary(&self, instance: &str) {
        std::fs::write(self.marker_path(), instance).expect("Failed to write leader marker");
    }

    /// Remove the leader marker, making every instance think it is primary
    pub fn clear_primary(&self) {
        match std::fs::remove_file(self.marker_path()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => panic!("Failed to remove leader marker: {e}"),
        }
    }

    /// Write a position record the way the replication layer does
    pub fn set_position(&self, tx: TxNumber) {
        self.write_position_raw(&format!("{:016x}/{:016x}", tx.get(), 0xdead_beef_u64));
    }

    /// Write arbitrary content into the position record
    pub fn write_position_raw(&self, content: &str) {
        // Write then rename so concurrent readers never see a torn record.
        let tmp = self.path().join(".pos.tmp");
        std::fs::write(&tmp, content).expect("Failed to write position record");
        std::fs::rename(&tmp, self.position_path()).expect("Failed to move position record");
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
