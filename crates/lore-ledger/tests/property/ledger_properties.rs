//! Property tests: replay determinism, curve monotonicity, and the
//! no-invented-numbers rule for uncalibrated claims.

use chrono::Utc;
use proptest::prelude::*;

use lore_core::config::LedgerConfig;
use lore_core::models::{
    AbsentReason, ConfidenceValue, Durability, ExtractionMethod, FeedbackOutcome,
};
use lore_core::types::{ClaimId, EvidenceId, PackId, QueryId};
use lore_ledger::{
    compute_confidence, CalibrationCurve, CalibrationSample, ClaimLedgerState, ConfidenceView,
    LedgerEvent, LedgerEventKind, GLOBAL_COHORT,
};

/// Deterministic event stream from compact generator output.
fn build_events(steps: &[(u8, u8, bool)]) -> Vec<LedgerEvent> {
    steps
        .iter()
        .enumerate()
        .map(|(i, (tag, claim, flag))| {
            let claim_id = ClaimId::new(format!("c{}", claim % 6));
            let kind = match tag % 3 {
                0 => LedgerEventKind::EvidenceAdded {
                    evidence_id: EvidenceId::new(format!("e{i}")),
                    method: if *flag {
                        ExtractionMethod::StructuralFact
                    } else {
                        ExtractionMethod::Synthesis
                    },
                    citation_verified: *flag,
                },
                1 => LedgerEventKind::OutcomeRecorded {
                    query_id: QueryId::new(format!("q{i}")),
                    pack_id: PackId::new(format!("p{i}")),
                    outcome: if *flag {
                        FeedbackOutcome::Worked
                    } else {
                        FeedbackOutcome::Failed
                    },
                },
                _ => LedgerEventKind::CalibrationFitted {
                    cohort: GLOBAL_COHORT.to_string(),
                    cohort_size: u32::from(*claim),
                },
            };
            let mut event = if matches!(kind, LedgerEventKind::CalibrationFitted { .. }) {
                LedgerEvent::global(kind)
            } else {
                LedgerEvent::for_claim(claim_id, None, kind)
            };
            event.sequence = (i + 1) as u64;
            event
        })
        .collect()
}

proptest! {
    /// Folding the same log twice produces identical claim states.
    #[test]
    fn prop_replay_is_deterministic(
        steps in prop::collection::vec((any::<u8>(), any::<u8>(), any::<bool>()), 1..120)
    ) {
        let events = build_events(&steps);
        let first = ConfidenceView::replay(&events).unwrap();
        let second = ConfidenceView::replay(&events).unwrap();

        prop_assert_eq!(first.claim_count(), second.claim_count());
        prop_assert_eq!(first.last_sequence(), second.last_sequence());
        for state in first.claims() {
            prop_assert_eq!(Some(state), second.claim(&state.claim_id));
        }
    }

    /// A fitted curve never maps a higher raw score to a lower value.
    #[test]
    fn prop_fitted_curves_are_monotone(
        raws in prop::collection::vec((0.0f64..1.0, any::<bool>()), 30..200)
    ) {
        let samples: Vec<CalibrationSample> = raws
            .iter()
            .map(|(raw, worked)| CalibrationSample::new(*raw, *worked))
            .collect();
        let curve =
            CalibrationCurve::fit(GLOBAL_COHORT, &samples, 10, 30, Utc::now()).unwrap();

        let mut previous = 0.0_f64;
        for i in 0..curve.bin_count() {
            let center = (i as f64 + 0.5) / curve.bin_count() as f64;
            let value = curve.apply(center);
            prop_assert!(value + 1e-12 >= previous);
            prop_assert!((0.0..=1.0).contains(&value));
            previous = value;
        }
    }

    /// Synthesis-touched claims with no fitted curve never get a number.
    #[test]
    fn prop_uncalibrated_synthesis_is_always_absent(
        synthesis in 1u32..10,
        verified in 0u32..10,
        unverified in 0u32..10,
    ) {
        let state = ClaimLedgerState {
            claim_id: ClaimId::new("c1"),
            structural_evidence: 0,
            synthesis_evidence: synthesis,
            verified_citations: verified,
            unverified_citations: unverified,
            outcomes: Vec::new(),
            active_defeaters: Vec::new(),
            last_state: None,
            last_evidence_at: Some(Utc::now()),
        };
        let value = compute_confidence(
            &state,
            Durability::Volatile,
            None,
            Utc::now(),
            &LedgerConfig::default(),
        );
        prop_assert_eq!(value, ConfidenceValue::absent(AbsentReason::Uncalibrated));
    }
}
