//! Span-overlap deduplication of ranked candidates.

use tracing::debug;

use crate::ranking::RankedCandidate;

/// Drop candidates whose source span overlaps a better-ranked one.
///
/// Input must already be sorted by rank score descending; the first
/// occupant of a span wins. Two entities only collide when they share a
/// file and their line ranges intersect, so a function and its enclosing
/// file both surface only if the file entity spans other lines too.
pub fn dedup_overlapping(ranked: Vec<RankedCandidate>) -> Vec<RankedCandidate> {
    let mut kept: Vec<RankedCandidate> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        let overlaps = kept
            .iter()
            .any(|k| k.entity.location.overlaps(&candidate.entity.location));
        if overlaps {
            debug!(entity = %candidate.entity.id, "dropping span-overlapping candidate");
            continue;
        }
        kept.push(candidate);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::models::{ConfidenceValue, Entity, EntityKind, SourceLocation};
    use lore_core::types::EntityId;

    fn candidate(name: &str, path: &str, lines: (u32, u32), rank_score: f64) -> RankedCandidate {
        RankedCandidate {
            entity: Entity::new(
                EntityId::new(name),
                EntityKind::Function,
                SourceLocation::new(path, lines.0, lines.1),
                "hash",
            ),
            claims: Vec::new(),
            claim_confidences: Vec::new(),
            confidence: ConfidenceValue::absent(lore_core::models::AbsentReason::NoEvidence),
            active_defeaters: Vec::new(),
            fused_score: rank_score,
            rank_score,
        }
    }

    #[test]
    fn higher_ranked_span_occupant_wins() {
        let kept = dedup_overlapping(vec![
            candidate("divide", "calc.py", (10, 20), 0.9),
            candidate("calc_file", "calc.py", (15, 30), 0.5),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].entity.id, EntityId::new("divide"));
    }

    #[test]
    fn same_lines_in_different_files_both_survive() {
        let kept = dedup_overlapping(vec![
            candidate("a", "a.py", (1, 10), 0.9),
            candidate("b", "b.py", (1, 10), 0.8),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn disjoint_spans_in_one_file_both_survive() {
        let kept = dedup_overlapping(vec![
            candidate("divide", "calc.py", (10, 20), 0.9),
            candidate("multiply", "calc.py", (30, 40), 0.8),
        ]);
        assert_eq!(kept.len(), 2);
    }
}
