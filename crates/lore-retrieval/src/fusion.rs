//! Normalizes per-signal scores onto a common scale and fuses them into
//! one ranked candidate list.
//!
//! Raw signal scores are incomparable (cosine similarity, bm25 rank,
//! decay products, Jaccard ratios), so each signal's batch is min-max
//! scaled to `[0, 1]` before intent weights apply. A signal that
//! produced nothing simply contributes nothing; its absence is already
//! disclosed as a coverage gap upstream.

use std::collections::HashMap;

use lore_core::intent::{SignalKind, SignalWeights};
use lore_core::traits::SignalHit;
use lore_core::types::EntityId;

/// One entity's fused score with the per-signal contributions that
/// produced it, normalized and weighted.
#[derive(Debug, Clone)]
pub struct FusedCandidate {
    pub entity_id: EntityId,
    pub fused_score: f64,
    /// Weighted normalized contribution per signal that surfaced this
    /// entity, in `SignalKind::ALL` order.
    pub contributions: Vec<(SignalKind, f64)>,
}

/// Fuse per-signal hit lists into a single descending candidate list.
///
/// Within one signal an entity keeps its best normalized hit rather than
/// a sum, so an entity with many weak claims cannot outrank one strong
/// match. Ties in fused score break toward the smaller entity id, which
/// keeps result order stable across runs.
pub fn fuse(signals: &[(SignalKind, Vec<SignalHit>)], weights: &SignalWeights) -> Vec<FusedCandidate> {
    let mut per_entity: HashMap<EntityId, HashMap<SignalKind, f64>> = HashMap::new();

    for (kind, hits) in signals {
        for (entity_id, normalized) in normalize(hits) {
            let best = per_entity
                .entry(entity_id)
                .or_default()
                .entry(*kind)
                .or_insert(0.0);
            if normalized > *best {
                *best = normalized;
            }
        }
    }

    let mut fused: Vec<FusedCandidate> = per_entity
        .into_iter()
        .map(|(entity_id, by_signal)| {
            let contributions: Vec<(SignalKind, f64)> = SignalKind::ALL
                .iter()
                .filter_map(|kind| {
                    by_signal
                        .get(kind)
                        .map(|norm| (*kind, weights.get(*kind) * norm))
                })
                .collect();
            let fused_score = contributions.iter().map(|(_, c)| c).sum();
            FusedCandidate {
                entity_id,
                fused_score,
                contributions,
            }
        })
        .collect();

    fused.sort_by(|a, b| {
        b.fused_score
            .total_cmp(&a.fused_score)
            .then_with(|| a.entity_id.cmp(&b.entity_id))
    });
    fused
}

/// Min-max scale one signal's batch to `[0, 1]`. A single hit, or a
/// batch where every score ties, maps to 1.0: the signal ranked those
/// entities above everything it left out.
fn normalize(hits: &[SignalHit]) -> Vec<(EntityId, f64)> {
    if hits.is_empty() {
        return Vec::new();
    }
    let min = hits.iter().map(|h| h.score).fold(f64::INFINITY, f64::min);
    let max = hits
        .iter()
        .map(|h| h.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    hits.iter()
        .map(|hit| {
            let normalized = if span == 0.0 {
                1.0
            } else {
                (hit.score - min) / span
            };
            (hit.entity_id.clone(), normalized)
        })
        .collect()
}
