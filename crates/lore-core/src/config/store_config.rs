use serde::{Deserialize, Serialize};

use super::defaults;

/// Fact store subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Enable WAL journal mode.
    pub wal_mode: bool,
    /// Memory-mapped I/O size in bytes.
    pub mmap_size: u64,
    /// Page cache size (negative = KB).
    pub cache_size: i64,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
    /// Number of read connections in the pool.
    pub read_pool_size: usize,
    /// Change sessions without modification before an entity is Stable.
    pub stable_after_sessions: u64,
    /// Change sessions without modification before an entity is Immutable.
    pub immutable_after_sessions: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            wal_mode: defaults::DEFAULT_WAL_MODE,
            mmap_size: defaults::DEFAULT_MMAP_SIZE,
            cache_size: defaults::DEFAULT_CACHE_SIZE,
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
            stable_after_sessions: defaults::DEFAULT_STABLE_AFTER_SESSIONS,
            immutable_after_sessions: defaults::DEFAULT_IMMUTABLE_AFTER_SESSIONS,
        }
    }
}
