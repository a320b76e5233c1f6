//! Property tests for the shared model layer: confidence aggregation
//! stays inside its input envelope and the claim lifecycle admits
//! exactly its documented transitions.

use lore_core::models::confidence::aggregate;
use lore_core::models::{
    AbsentReason, AggregationStrategy, ClaimState, ConfidenceBasis, ConfidenceValue,
};
use proptest::prelude::*;

const STATES: [ClaimState; 6] = [
    ClaimState::Pending,
    ClaimState::Synthesized,
    ClaimState::Validated,
    ClaimState::Quarantined,
    ClaimState::Stale,
    ClaimState::Defeated,
];

const LEGAL: [(ClaimState, ClaimState); 9] = [
    (ClaimState::Pending, ClaimState::Synthesized),
    (ClaimState::Synthesized, ClaimState::Validated),
    (ClaimState::Synthesized, ClaimState::Quarantined),
    (ClaimState::Synthesized, ClaimState::Defeated),
    (ClaimState::Validated, ClaimState::Stale),
    (ClaimState::Validated, ClaimState::Defeated),
    (ClaimState::Quarantined, ClaimState::Stale),
    (ClaimState::Defeated, ClaimState::Stale),
    (ClaimState::Stale, ClaimState::Pending),
];

fn present(value: f64) -> ConfidenceValue {
    ConfidenceValue::present(
        value,
        ConfidenceBasis::DirectEvidence {
            verified_citations: 1,
        },
    )
}

proptest! {
    #[test]
    fn prop_geometric_aggregate_stays_inside_the_input_envelope(
        values in prop::collection::vec(0.0f64..=1.0, 1..8),
    ) {
        let inputs: Vec<ConfidenceValue> = values.iter().copied().map(present).collect();
        let combined = aggregate(&inputs, AggregationStrategy::GeometricMean);

        let min = values.iter().copied().fold(1.0f64, f64::min);
        let max = values.iter().copied().fold(0.0f64, f64::max);
        let got = combined.value().expect("all-present inputs aggregate to present");
        // Zero inputs are floored before the log, so the mean can dip
        // toward the floor but never escape the [min, max] envelope.
        prop_assert!(got >= min - 1e-9, "{got} below min {min}");
        prop_assert!(got <= max + 1e-9, "{got} above max {max}");
    }

    #[test]
    fn prop_minimum_aggregate_equals_the_smallest_input(
        values in prop::collection::vec(0.0f64..=1.0, 1..8),
    ) {
        let inputs: Vec<ConfidenceValue> = values.iter().copied().map(present).collect();
        let combined = aggregate(&inputs, AggregationStrategy::Minimum);

        let min = values.iter().copied().fold(1.0f64, f64::min);
        prop_assert_eq!(combined.value(), Some(min));
    }

    #[test]
    fn prop_an_absent_input_poisons_the_aggregate(
        values in prop::collection::vec(0.0f64..=1.0, 0..5),
        position in 0usize..5,
    ) {
        let mut inputs: Vec<ConfidenceValue> = values.iter().copied().map(present).collect();
        let at = position.min(inputs.len());
        inputs.insert(at, ConfidenceValue::absent(AbsentReason::Uncalibrated));

        let combined = aggregate(&inputs, AggregationStrategy::GeometricMean);
        prop_assert_eq!(combined, ConfidenceValue::absent(AbsentReason::Uncalibrated));
    }

    #[test]
    fn prop_lifecycle_admits_exactly_the_documented_transitions(
        from in 0usize..6,
        to in 0usize..6,
    ) {
        let from = STATES[from];
        let to = STATES[to];
        prop_assert_eq!(
            from.can_transition(to),
            LEGAL.contains(&(from, to)),
            "transition {:?} -> {:?}",
            from,
            to
        );
    }
}
