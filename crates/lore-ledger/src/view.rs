//! Derived confidence view.
//!
//! The view is a pure fold over the event log: replaying the same events
//! always produces the same view, which is the audit guarantee tests rely
//! on. Nothing here writes; the ledger owns persistence.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use lore_core::errors::{LedgerError, LoreError, LoreResult};
use lore_core::models::{ClaimState, DefeaterKind, DefeaterSeverity, ExtractionMethod, FeedbackOutcome};
use lore_core::types::{ClaimId, DefeaterId};

use crate::events::{LedgerEvent, LedgerEventKind};

/// A defeater currently weighing on a claim.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDefeater {
    pub defeater_id: DefeaterId,
    pub kind: DefeaterKind,
    pub severity: DefeaterSeverity,
}

/// Everything the ledger knows about one claim, folded from its events.
#[derive(Debug, Clone, PartialEq)]
pub struct ClaimLedgerState {
    pub claim_id: ClaimId,
    /// Evidence counts by extraction method.
    pub structural_evidence: u32,
    pub synthesis_evidence: u32,
    /// Citation verification tallies across all evidence.
    pub verified_citations: u32,
    pub unverified_citations: u32,
    /// Agent outcomes in arrival order, with their timestamps.
    pub outcomes: Vec<(FeedbackOutcome, DateTime<Utc>)>,
    pub active_defeaters: Vec<ActiveDefeater>,
    /// Last lifecycle transition seen in the log, if any.
    pub last_state: Option<ClaimState>,
    pub last_evidence_at: Option<DateTime<Utc>>,
}

impl ClaimLedgerState {
    fn new(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            structural_evidence: 0,
            synthesis_evidence: 0,
            verified_citations: 0,
            unverified_citations: 0,
            outcomes: Vec::new(),
            active_defeaters: Vec::new(),
            last_state: None,
            last_evidence_at: None,
        }
    }

    pub fn total_evidence(&self) -> u32 {
        self.structural_evidence + self.synthesis_evidence
    }

    /// Whether any active defeater forces confidence to absent.
    pub fn forced_absent(&self) -> bool {
        self.active_defeaters
            .iter()
            .any(|d| matches!(d.severity, DefeaterSeverity::ForcesAbsent))
    }

    /// Caps from active `CapsConfidence` defeaters.
    pub fn confidence_caps(&self) -> impl Iterator<Item = f64> + '_ {
        self.active_defeaters.iter().filter_map(|d| match d.severity {
            DefeaterSeverity::CapsConfidence { cap } => Some(cap),
            DefeaterSeverity::ForcesAbsent => None,
        })
    }
}

/// Materialized per-claim ledger state, keyed by claim.
///
/// `last_sequence` tracks how far into the log the view has folded, which
/// lets a cached view catch up incrementally via `events_since`. Cloning
/// yields an immutable snapshot a query can score against while the
/// shared view keeps folding new events.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceView {
    claims: HashMap<ClaimId, ClaimLedgerState>,
    last_sequence: u64,
}

impl ConfidenceView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from scratch by folding `events` in order.
    pub fn replay(events: &[LedgerEvent]) -> LoreResult<Self> {
        let mut view = Self::new();
        for event in events {
            view.apply(event)?;
        }
        Ok(view)
    }

    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    pub fn claim(&self, id: &ClaimId) -> Option<&ClaimLedgerState> {
        self.claims.get(id)
    }

    pub fn claims(&self) -> impl Iterator<Item = &ClaimLedgerState> {
        self.claims.values()
    }

    pub fn claim_count(&self) -> usize {
        self.claims.len()
    }

    /// Fold one event. Events must arrive in strictly increasing sequence
    /// order; anything else means the caller lost its place in the log.
    pub fn apply(&mut self, event: &LedgerEvent) -> LoreResult<()> {
        if event.sequence == 0 {
            return Err(replay_err(0, "event was never appended (sequence 0)"));
        }
        if event.sequence <= self.last_sequence {
            return Err(replay_err(
                event.sequence,
                format!("sequence regressed (view at {})", self.last_sequence),
            ));
        }

        match &event.kind {
            LedgerEventKind::EvidenceAdded {
                method,
                citation_verified,
                ..
            } => {
                let state = self.claim_entry(event)?;
                match method {
                    ExtractionMethod::StructuralFact => state.structural_evidence += 1,
                    ExtractionMethod::Synthesis => state.synthesis_evidence += 1,
                }
                if *citation_verified {
                    state.verified_citations += 1;
                } else {
                    state.unverified_citations += 1;
                }
                let at = event.recorded_at;
                state.last_evidence_at = Some(match state.last_evidence_at {
                    Some(prev) if prev > at => prev,
                    _ => at,
                });
            }
            LedgerEventKind::ClaimStateChanged { to, .. } => {
                self.claim_entry(event)?.last_state = Some(*to);
            }
            LedgerEventKind::DefeaterActivated {
                defeater_id,
                kind,
                severity,
                ..
            } => {
                let state = self.claim_entry(event)?;
                if !state
                    .active_defeaters
                    .iter()
                    .any(|d| d.defeater_id == *defeater_id)
                {
                    state.active_defeaters.push(ActiveDefeater {
                        defeater_id: defeater_id.clone(),
                        kind: *kind,
                        severity: *severity,
                    });
                }
            }
            LedgerEventKind::DefeaterResolved { defeater_id } => {
                self.claim_entry(event)?
                    .active_defeaters
                    .retain(|d| d.defeater_id != *defeater_id);
            }
            LedgerEventKind::OutcomeRecorded { outcome, .. } => {
                let at = event.recorded_at;
                self.claim_entry(event)?.outcomes.push((*outcome, at));
            }
            LedgerEventKind::CalibrationFitted { .. } => {
                // Global event; the fitted curve itself lives in its own
                // table. Only the sequence cursor moves.
            }
        }

        self.last_sequence = event.sequence;
        Ok(())
    }

    fn claim_entry(&mut self, event: &LedgerEvent) -> LoreResult<&mut ClaimLedgerState> {
        let claim_id = event.claim_id.clone().ok_or_else(|| {
            replay_err(
                event.sequence,
                format!("{} event without a claim id", event.kind.name()),
            )
        })?;
        Ok(self
            .claims
            .entry(claim_id.clone())
            .or_insert_with(|| ClaimLedgerState::new(claim_id)))
    }
}

fn replay_err(sequence: u64, reason: impl Into<String>) -> LoreError {
    LoreError::Ledger(LedgerError::ReplayFailed {
        sequence,
        reason: reason.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::types::{EvidenceId, PackId, QueryId};

    fn evidence_event(seq: u64, claim: &str, verified: bool) -> LedgerEvent {
        let mut event = LedgerEvent::for_claim(
            ClaimId::new(claim),
            None,
            LedgerEventKind::EvidenceAdded {
                evidence_id: EvidenceId::generate(),
                method: ExtractionMethod::Synthesis,
                citation_verified: verified,
            },
        );
        event.sequence = seq;
        event
    }

    #[test]
    fn evidence_events_tally_counts() {
        let events = vec![
            evidence_event(1, "c1", true),
            evidence_event(2, "c1", false),
            evidence_event(3, "c2", true),
        ];
        let view = ConfidenceView::replay(&events).unwrap();
        let c1 = view.claim(&ClaimId::new("c1")).unwrap();
        assert_eq!(c1.synthesis_evidence, 2);
        assert_eq!(c1.verified_citations, 1);
        assert_eq!(c1.unverified_citations, 1);
        assert!(c1.last_evidence_at.is_some());
        assert_eq!(view.claim_count(), 2);
        assert_eq!(view.last_sequence(), 3);
    }

    #[test]
    fn defeaters_activate_and_resolve() {
        let defeater_id = DefeaterId::new("d1");
        let mut activate = LedgerEvent::for_claim(
            ClaimId::new("c1"),
            None,
            LedgerEventKind::DefeaterActivated {
                defeater_id: defeater_id.clone(),
                kind: DefeaterKind::FailedOutcome,
                severity: DefeaterSeverity::ForcesAbsent,
                detail: "patch failed review".to_string(),
            },
        );
        activate.sequence = 1;
        let mut resolve = LedgerEvent::for_claim(
            ClaimId::new("c1"),
            None,
            LedgerEventKind::DefeaterResolved { defeater_id },
        );
        resolve.sequence = 2;

        let mut view = ConfidenceView::new();
        view.apply(&activate).unwrap();
        assert!(view.claim(&ClaimId::new("c1")).unwrap().forced_absent());
        view.apply(&resolve).unwrap();
        assert!(!view.claim(&ClaimId::new("c1")).unwrap().forced_absent());
    }

    #[test]
    fn duplicate_defeater_activation_is_idempotent() {
        let defeater_id = DefeaterId::new("d1");
        let make = |seq| {
            let mut e = LedgerEvent::for_claim(
                ClaimId::new("c1"),
                None,
                LedgerEventKind::DefeaterActivated {
                    defeater_id: defeater_id.clone(),
                    kind: DefeaterKind::StaleEvidence,
                    severity: DefeaterSeverity::CapsConfidence { cap: 0.5 },
                    detail: String::new(),
                },
            );
            e.sequence = seq;
            e
        };
        let view = ConfidenceView::replay(&[make(1), make(2)]).unwrap();
        assert_eq!(
            view.claim(&ClaimId::new("c1")).unwrap().active_defeaters.len(),
            1
        );
    }

    #[test]
    fn outcomes_accumulate_in_order() {
        let mut worked = LedgerEvent::for_claim(
            ClaimId::new("c1"),
            None,
            LedgerEventKind::OutcomeRecorded {
                query_id: QueryId::new("q1"),
                pack_id: PackId::new("p1"),
                outcome: FeedbackOutcome::Worked,
            },
        );
        worked.sequence = 1;
        let mut failed = worked.clone();
        failed.sequence = 2;
        failed.kind = LedgerEventKind::OutcomeRecorded {
            query_id: QueryId::new("q2"),
            pack_id: PackId::new("p2"),
            outcome: FeedbackOutcome::Failed,
        };
        let view = ConfidenceView::replay(&[worked, failed]).unwrap();
        let outcomes = &view.claim(&ClaimId::new("c1")).unwrap().outcomes;
        assert_eq!(outcomes[0].0, FeedbackOutcome::Worked);
        assert_eq!(outcomes[1].0, FeedbackOutcome::Failed);
    }

    #[test]
    fn out_of_order_replay_is_rejected() {
        let mut view = ConfidenceView::new();
        view.apply(&evidence_event(5, "c1", true)).unwrap();
        let err = view.apply(&evidence_event(5, "c1", true)).unwrap_err();
        assert!(err.to_string().contains("sequence 5"));
        let err = view.apply(&evidence_event(0, "c1", true)).unwrap_err();
        assert!(err.to_string().contains("never appended"));
    }

    #[test]
    fn claim_scoped_event_without_claim_id_fails_replay() {
        let mut event = LedgerEvent::global(LedgerEventKind::ClaimStateChanged {
            from: ClaimState::Synthesized,
            to: ClaimState::Validated,
        });
        event.sequence = 1;
        let err = ConfidenceView::replay(&[event]).unwrap_err();
        assert!(err.to_string().contains("without a claim id"));
    }

    #[test]
    fn calibration_events_only_move_the_cursor() {
        let mut event = LedgerEvent::global(LedgerEventKind::CalibrationFitted {
            cohort: "global".to_string(),
            cohort_size: 40,
        });
        event.sequence = 9;
        let view = ConfidenceView::replay(&[event]).unwrap();
        assert_eq!(view.claim_count(), 0);
        assert_eq!(view.last_sequence(), 9);
    }
}
