//! Property tests for fusion and span deduplication: score bounds,
//! deterministic ordering, normalization monotonicity, and the
//! no-overlap guarantee on deduplicated candidates.

use std::collections::{BTreeMap, BTreeSet};

use proptest::prelude::*;

use lore_core::intent::{SignalKind, SignalWeights};
use lore_core::models::{AbsentReason, ConfidenceValue, Entity, EntityKind, SourceLocation};
use lore_core::traits::SignalHit;
use lore_core::types::EntityId;
use lore_retrieval::fuse;
use lore_retrieval::ranking::{dedup_overlapping, RankedCandidate};

fn hit(entity: u8, score: f64) -> SignalHit {
    SignalHit {
        entity_id: EntityId::new(format!("e{entity:02}")),
        claim_id: None,
        score,
    }
}

/// Up to six signal batches of raw hits. Batches may repeat a signal
/// kind and an entity; fusion must collapse both.
fn signals_strategy() -> impl Strategy<Value = Vec<(SignalKind, Vec<SignalHit>)>> {
    prop::collection::vec(
        (
            0usize..SignalKind::ALL.len(),
            prop::collection::vec((0u8..16, 0.0f64..10.0), 0..30),
        ),
        0..6,
    )
    .prop_map(|batches| {
        batches
            .into_iter()
            .map(|(kind, raw)| {
                (
                    SignalKind::ALL[kind],
                    raw.into_iter().map(|(e, s)| hit(e, s)).collect(),
                )
            })
            .collect()
    })
}

fn weights_strategy() -> impl Strategy<Value = SignalWeights> {
    (0.1f64..4.0, 0.1f64..4.0, 0.1f64..4.0, 0.1f64..4.0).prop_map(
        |(semantic, proximity, co_change, lexical)| SignalWeights {
            semantic,
            proximity,
            co_change,
            lexical,
        },
    )
}

fn span_candidate(index: usize, path: &str, start: u32, end: u32, rank: f64) -> RankedCandidate {
    RankedCandidate {
        entity: Entity::new(
            EntityId::new(format!("e{index:02}")),
            EntityKind::Function,
            SourceLocation::new(path, start, end),
            "hash",
        ),
        claims: Vec::new(),
        claim_confidences: Vec::new(),
        confidence: ConfidenceValue::absent(AbsentReason::NoEvidence),
        active_defeaters: Vec::new(),
        fused_score: rank,
        rank_score: rank,
    }
}

proptest! {
    /// Normalization and weighting keep every fused score inside
    /// [0, sum of weights] and every contribution inside its signal's
    /// weight.
    #[test]
    fn prop_fused_scores_stay_bounded(
        signals in signals_strategy(),
        weights in weights_strategy(),
    ) {
        let ceiling =
            weights.semantic + weights.proximity + weights.co_change + weights.lexical;
        for candidate in fuse(&signals, &weights) {
            prop_assert!(candidate.fused_score >= 0.0);
            prop_assert!(
                candidate.fused_score <= ceiling + 1e-9,
                "fused {} above weight ceiling {}",
                candidate.fused_score,
                ceiling
            );
            for (kind, contribution) in &candidate.contributions {
                prop_assert!(*contribution >= 0.0);
                prop_assert!(*contribution <= weights.get(*kind) + 1e-9);
            }
        }
    }

    /// Fusion lists every surfaced entity exactly once, sorted by score
    /// with id tie-breaks, and is bit-identical across runs.
    #[test]
    fn prop_fusion_order_is_deterministic(
        signals in signals_strategy(),
        weights in weights_strategy(),
    ) {
        let first = fuse(&signals, &weights);
        let second = fuse(&signals, &weights);

        prop_assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(&second) {
            prop_assert_eq!(&a.entity_id, &b.entity_id);
            prop_assert_eq!(a.fused_score.to_bits(), b.fused_score.to_bits());
        }

        let mut seen = BTreeSet::new();
        for candidate in &first {
            prop_assert!(
                seen.insert(candidate.entity_id.clone()),
                "entity {} fused twice",
                candidate.entity_id
            );
        }
        for pair in first.windows(2) {
            prop_assert!(pair[0].fused_score >= pair[1].fused_score);
            if pair[0].fused_score == pair[1].fused_score {
                prop_assert!(pair[0].entity_id < pair[1].entity_id);
            }
        }

        let surfaced: BTreeSet<EntityId> = signals
            .iter()
            .flat_map(|(_, hits)| hits.iter().map(|h| h.entity_id.clone()))
            .collect();
        prop_assert_eq!(seen, surfaced);
    }

    /// For a single signal, fused order follows the per-entity best raw
    /// scores: min-max scaling never reorders a signal's own ranking.
    #[test]
    fn prop_normalization_preserves_single_signal_order(
        raw in prop::collection::vec((0u8..6, 0.0f64..10.0), 1..40),
        weights in weights_strategy(),
    ) {
        let hits: Vec<SignalHit> = raw.iter().map(|(e, s)| hit(*e, *s)).collect();

        let mut best: BTreeMap<EntityId, f64> = BTreeMap::new();
        for h in &hits {
            let entry = best.entry(h.entity_id.clone()).or_insert(f64::MIN);
            if h.score > *entry {
                *entry = h.score;
            }
        }
        let mut expected: Vec<(EntityId, f64)> = best.into_iter().collect();
        expected.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        let fused = fuse(&[(SignalKind::Lexical, hits)], &weights);
        prop_assert_eq!(fused.len(), expected.len());
        for (candidate, (entity_id, _)) in fused.iter().zip(&expected) {
            prop_assert_eq!(&candidate.entity_id, entity_id);
        }
    }

    /// Deduplication returns a rank-order subsequence with no two
    /// overlapping spans, and drops a candidate only when a kept one
    /// covers its lines.
    #[test]
    fn prop_dedup_output_never_overlaps(
        spans in prop::collection::vec((0usize..3, 1u32..80, 0u32..20, 0.0f64..1.0), 0..25)
    ) {
        let paths = ["src/a.py", "src/b.py", "src/c.py"];
        let mut ranked: Vec<RankedCandidate> = spans
            .into_iter()
            .enumerate()
            .map(|(i, (path, start, len, rank))| {
                span_candidate(i, paths[path], start, start + len, rank)
            })
            .collect();
        ranked.sort_by(|a, b| b.rank_score.total_cmp(&a.rank_score));

        let kept = dedup_overlapping(ranked.clone());

        for (i, a) in kept.iter().enumerate() {
            for b in kept.iter().skip(i + 1) {
                prop_assert!(
                    !a.entity.location.overlaps(&b.entity.location),
                    "kept packs {} and {} overlap",
                    a.entity.id,
                    b.entity.id
                );
            }
        }

        // Subsequence of the ranked input.
        let mut cursor = ranked.iter();
        for keep in &kept {
            prop_assert!(
                cursor.any(|c| c.entity.id == keep.entity.id),
                "dedup reordered {}",
                keep.entity.id
            );
        }

        // Maximality: anything dropped overlaps something kept.
        for candidate in &ranked {
            let survives = kept.iter().any(|k| k.entity.id == candidate.entity.id);
            let covered = kept
                .iter()
                .any(|k| k.entity.location.overlaps(&candidate.entity.location));
            prop_assert!(
                survives || covered,
                "candidate {} dropped without an overlapping keeper",
                candidate.entity.id
            );
        }
    }
}
