//! Defeaters: recorded reasons to distrust a claim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ClaimId, DefeaterId};

/// What kind of counter-signal was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeaterKind {
    /// Another validated claim or fact contradicts this one.
    ContradictingEvidence,
    /// A citation no longer matches the content it points at.
    CitationMismatch,
    /// A consumer acted on the claim and the action failed.
    FailedOutcome,
    /// The cited content is older than the staleness horizon.
    StaleEvidence,
}

impl DefeaterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefeaterKind::ContradictingEvidence => "contradicting_evidence",
            DefeaterKind::CitationMismatch => "citation_mismatch",
            DefeaterKind::FailedOutcome => "failed_outcome",
            DefeaterKind::StaleEvidence => "stale_evidence",
        }
    }
}

/// How hard the defeater hits confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DefeaterSeverity {
    /// Confidence may still be reported but never above `cap`.
    CapsConfidence { cap: f64 },
    /// Confidence must be reported as absent and the claim defeated.
    ForcesAbsent,
}

/// An active reason to distrust a claim. Defeaters are resolved, never
/// deleted: resolution is recorded so the history stays auditable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defeater {
    pub id: DefeaterId,
    pub claim_id: ClaimId,
    pub kind: DefeaterKind,
    pub severity: DefeaterSeverity,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Defeater {
    pub fn new(
        claim_id: ClaimId,
        kind: DefeaterKind,
        severity: DefeaterSeverity,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            id: DefeaterId::generate(),
            claim_id,
            kind,
            severity,
            detail: detail.into(),
            recorded_at: Utc::now(),
            resolved_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.resolved_at.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defeaters_are_active() {
        let d = Defeater::new(
            ClaimId::generate(),
            DefeaterKind::FailedOutcome,
            DefeaterSeverity::CapsConfidence { cap: 0.4 },
            "patch based on claim failed review",
        );
        assert!(d.is_active());
    }
}
