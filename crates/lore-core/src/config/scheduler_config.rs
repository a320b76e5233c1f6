use serde::{Deserialize, Serialize};

use super::defaults;

/// Maintenance scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Window for coalescing rapid successive change notifications.
    pub debounce_ms: u64,
    /// Entities re-extracted per maintenance batch.
    pub maintenance_batch: usize,
    /// Pending-change queue depth past which further events for an
    /// already-queued path collapse instead of queuing.
    pub queue_threshold: usize,
    /// Entries in the assembled-pack cache.
    pub pack_cache_size: u64,
    /// Pack cache time-to-live in seconds.
    pub pack_cache_ttl_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::DEFAULT_DEBOUNCE_MS,
            maintenance_batch: defaults::DEFAULT_MAINTENANCE_BATCH,
            queue_threshold: defaults::DEFAULT_QUEUE_THRESHOLD,
            pack_cache_size: defaults::DEFAULT_PACK_CACHE_SIZE,
            pack_cache_ttl_secs: defaults::DEFAULT_PACK_CACHE_TTL_SECS,
        }
    }
}
