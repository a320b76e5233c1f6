//! What one maintenance pass did, in numbers a host can log or alert on.

use serde::{Deserialize, Serialize};

/// A path that could not be (re)indexed this pass, and why. The rest of
/// the pass proceeds; the gap is disclosed instead of silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionGap {
    pub path: String,
    pub reason: String,
}

/// Ledger of a single `run_maintenance` pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Paths drained from the change queue this pass.
    pub files_processed: usize,
    pub entities_changed: usize,
    /// Entities whose content hash matched; everything downstream skipped.
    pub entities_unchanged: usize,
    pub entities_removed: usize,
    /// Entities marked stale by propagation beyond the edits themselves.
    pub stale_marked: usize,
    pub claims_validated: usize,
    pub claims_quarantined: usize,
    /// Entities whose synthesis attempt failed; their stale flag stays.
    pub synthesis_failures: usize,
    /// Validated claims left without an embedding this pass.
    pub embeddings_failed: usize,
    pub extraction_gaps: Vec<ExtractionGap>,
    pub packs_evicted: usize,
    /// Revision the index is at after this pass.
    pub index_revision: u64,
}

impl MaintenanceReport {
    /// True when the pass changed no entities, so the revision stayed put.
    pub fn is_noop(&self) -> bool {
        self.entities_changed == 0 && self.entities_removed == 0
    }
}
