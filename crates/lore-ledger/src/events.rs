//! Typed ledger events and their wire form.
//!
//! Events are the only way anything reaches the ledger: evidence,
//! claim transitions, defeaters, agent outcomes, and calibration refits
//! all land here. Rows are append-only; the derived view is rebuilt by
//! replaying them in sequence order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lore_core::errors::{LedgerError, LoreError, LoreResult};
use lore_core::models::{
    ClaimState, DefeaterKind, DefeaterSeverity, ExtractionMethod, FeedbackOutcome,
};
use lore_core::types::{ClaimId, DefeaterId, EntityId, EvidenceId, PackId, QueryId};
use lore_store::queries::ledger_ops::EventRow;

/// What happened. The payload column holds this enum as JSON; the
/// `event_type` column holds [`LedgerEventKind::name`] for SQL-side filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// An evidence record was appended for a claim.
    EvidenceAdded {
        evidence_id: EvidenceId,
        method: ExtractionMethod,
        /// Whether the citation's content hash matched at record time.
        citation_verified: bool,
    },
    /// A claim moved through its lifecycle.
    ClaimStateChanged { from: ClaimState, to: ClaimState },
    /// A reason to distrust a claim became active.
    DefeaterActivated {
        defeater_id: DefeaterId,
        kind: DefeaterKind,
        severity: DefeaterSeverity,
        detail: String,
    },
    /// A previously active defeater was resolved.
    DefeaterResolved { defeater_id: DefeaterId },
    /// An agent reported what happened after acting on a served pack.
    OutcomeRecorded {
        query_id: QueryId,
        pack_id: PackId,
        outcome: FeedbackOutcome,
    },
    /// A calibration curve was refitted for a cohort.
    CalibrationFitted { cohort: String, cohort_size: u32 },
}

impl LedgerEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerEventKind::EvidenceAdded { .. } => "evidence_added",
            LedgerEventKind::ClaimStateChanged { .. } => "claim_state_changed",
            LedgerEventKind::DefeaterActivated { .. } => "defeater_activated",
            LedgerEventKind::DefeaterResolved { .. } => "defeater_resolved",
            LedgerEventKind::OutcomeRecorded { .. } => "outcome_recorded",
            LedgerEventKind::CalibrationFitted { .. } => "calibration_fitted",
        }
    }
}

/// One ledger event. `sequence` is 0 until the store assigns the real
/// number on append; replayed events always carry their stored sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub sequence: u64,
    pub claim_id: Option<ClaimId>,
    pub entity_id: Option<EntityId>,
    pub kind: LedgerEventKind,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEvent {
    /// An event scoped to a claim. The entity id is carried when known so
    /// invalidation can find events by entity without a claim join.
    pub fn for_claim(
        claim_id: ClaimId,
        entity_id: Option<EntityId>,
        kind: LedgerEventKind,
    ) -> Self {
        Self {
            sequence: 0,
            claim_id: Some(claim_id),
            entity_id,
            kind,
            recorded_at: Utc::now(),
        }
    }

    /// An event with no claim scope, e.g. a calibration refit.
    pub fn global(kind: LedgerEventKind) -> Self {
        Self {
            sequence: 0,
            claim_id: None,
            entity_id: None,
            kind,
            recorded_at: Utc::now(),
        }
    }

    /// The JSON payload column value.
    pub fn payload(&self) -> LoreResult<String> {
        Ok(serde_json::to_string(&self.kind)?)
    }

    /// Decode a stored row back into a typed event. A payload that no
    /// longer parses is a replay failure, not a silent skip.
    pub fn from_row(row: EventRow) -> LoreResult<LedgerEvent> {
        let kind: LedgerEventKind = serde_json::from_str(&row.payload).map_err(|e| {
            LoreError::Ledger(LedgerError::ReplayFailed {
                sequence: row.sequence,
                reason: format!("payload: {e}"),
            })
        })?;
        let recorded_at = DateTime::parse_from_rfc3339(&row.recorded_at)
            .map_err(|e| {
                LoreError::Ledger(LedgerError::ReplayFailed {
                    sequence: row.sequence,
                    reason: format!("timestamp '{}': {e}", row.recorded_at),
                })
            })?
            .with_timezone(&Utc);
        Ok(LedgerEvent {
            sequence: row.sequence,
            claim_id: row.claim_id.map(ClaimId::new),
            entity_id: row.entity_id.map(EntityId::new),
            kind,
            recorded_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_a_row() {
        let event = LedgerEvent::for_claim(
            ClaimId::new("c1"),
            Some(EntityId::new("src/calculator.py::divide")),
            LedgerEventKind::EvidenceAdded {
                evidence_id: EvidenceId::new("e1"),
                method: ExtractionMethod::StructuralFact,
                citation_verified: true,
            },
        );
        let row = EventRow {
            sequence: 7,
            event_type: event.kind.name().to_string(),
            claim_id: event.claim_id.as_ref().map(|id| id.as_str().to_string()),
            entity_id: event.entity_id.as_ref().map(|id| id.as_str().to_string()),
            payload: event.payload().unwrap(),
            recorded_at: event.recorded_at.to_rfc3339(),
        };
        let decoded = LedgerEvent::from_row(row).unwrap();
        assert_eq!(decoded.sequence, 7);
        assert_eq!(decoded.kind, event.kind);
        assert_eq!(decoded.claim_id, event.claim_id);
    }

    #[test]
    fn garbage_payload_is_a_replay_failure() {
        let row = EventRow {
            sequence: 3,
            event_type: "evidence_added".to_string(),
            claim_id: None,
            entity_id: None,
            payload: "{not json".to_string(),
            recorded_at: Utc::now().to_rfc3339(),
        };
        let err = LedgerEvent::from_row(row).unwrap_err();
        assert!(err.to_string().contains("sequence 3"));
    }

    #[test]
    fn kind_names_are_stable() {
        let kind = LedgerEventKind::CalibrationFitted {
            cohort: "global".to_string(),
            cohort_size: 40,
        };
        assert_eq!(kind.name(), "calibration_fitted");
    }
}
