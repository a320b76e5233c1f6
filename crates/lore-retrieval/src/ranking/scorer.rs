//! Final ranking: fused signal scores combined with ledger confidence
//! and entity freshness.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use lore_core::errors::LoreResult;
use lore_core::models::confidence::{aggregate, AggregationStrategy};
use lore_core::models::{ConfidenceValue, DefeaterKind, Entity, SemanticClaim};
use lore_core::traits::IIndexStore;
use lore_core::types::ClaimId;
use lore_ledger::{ConfidenceView, EpistemicsLedger, GLOBAL_COHORT};

use crate::fusion::FusedCandidate;

/// Days after which an untouched entity's freshness factor decays to 1/e.
const FRESHNESS_HALF_LIFE_DAYS: f64 = 90.0;

/// Relative weights of the three ranking components. Signal agreement
/// dominates; confidence and freshness reorder near-ties.
#[derive(Debug, Clone, Copy)]
pub struct RankWeights {
    pub signal: f64,
    pub confidence: f64,
    pub freshness: f64,
}

impl Default for RankWeights {
    fn default() -> Self {
        Self {
            signal: 0.6,
            confidence: 0.25,
            freshness: 0.15,
        }
    }
}

/// A candidate that survived scoring, carrying everything assembly needs.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub entity: Entity,
    /// Validated claims about the entity, extraction order.
    pub claims: Vec<SemanticClaim>,
    /// Ledger confidence per claim, aligned with `claims`.
    pub claim_confidences: Vec<(ClaimId, ConfidenceValue)>,
    /// Geometric-mean aggregate over the claim confidences.
    pub confidence: ConfidenceValue,
    /// Kinds of defeaters currently active on any of the claims.
    pub active_defeaters: Vec<DefeaterKind>,
    pub fused_score: f64,
    pub rank_score: f64,
}

/// Scores fused candidates against the ledger view and sorts them.
pub struct RankingPipeline {
    store: Arc<dyn IIndexStore>,
    ledger: Arc<EpistemicsLedger>,
    weights: RankWeights,
}

impl RankingPipeline {
    pub fn new(store: Arc<dyn IIndexStore>, ledger: Arc<EpistemicsLedger>) -> Self {
        Self {
            store,
            ledger,
            weights: RankWeights::default(),
        }
    }

    /// Rank fused candidates. An absent confidence contributes zero to
    /// the rank score but is preserved on the candidate, so low-evidence
    /// entities sink without being hidden.
    pub fn rank(
        &self,
        view: &ConfidenceView,
        fused: &[FusedCandidate],
        now: DateTime<Utc>,
    ) -> LoreResult<Vec<RankedCandidate>> {
        let max_fused = fused
            .iter()
            .map(|c| c.fused_score)
            .fold(0.0f64, f64::max)
            .max(f64::MIN_POSITIVE);

        let mut ranked = Vec::with_capacity(fused.len());
        for candidate in fused {
            let Some(entity) = self.store.entity(&candidate.entity_id)? else {
                debug!(entity = %candidate.entity_id, "candidate entity no longer indexed");
                continue;
            };

            let claims: Vec<SemanticClaim> = self
                .store
                .claims_for_entity(&entity.id)?
                .into_iter()
                .filter(|c| c.state.is_retrievable())
                .collect();

            let mut claim_confidences = Vec::with_capacity(claims.len());
            let mut active_defeaters: Vec<DefeaterKind> = Vec::new();
            for claim in &claims {
                let value =
                    self.ledger
                        .confidence(view, &claim.id, entity.durability, GLOBAL_COHORT, now)?;
                claim_confidences.push((claim.id.clone(), value));
                if let Some(state) = view.claim(&claim.id) {
                    for defeater in &state.active_defeaters {
                        if !active_defeaters.contains(&defeater.kind) {
                            active_defeaters.push(defeater.kind);
                        }
                    }
                }
            }
            let values: Vec<ConfidenceValue> =
                claim_confidences.iter().map(|(_, v)| v.clone()).collect();
            let confidence = aggregate(&values, AggregationStrategy::GeometricMean);

            let signal_part = candidate.fused_score / max_fused;
            let confidence_part = confidence.value().unwrap_or(0.0);
            let freshness_part = freshness_factor(entity.last_changed, now);
            let rank_score = self.weights.signal * signal_part
                + self.weights.confidence * confidence_part
                + self.weights.freshness * freshness_part;

            ranked.push(RankedCandidate {
                entity,
                claims,
                claim_confidences,
                confidence,
                active_defeaters,
                fused_score: candidate.fused_score,
                rank_score,
            });
        }

        ranked.sort_by(|a, b| {
            b.rank_score
                .total_cmp(&a.rank_score)
                .then_with(|| a.entity.id.cmp(&b.entity.id))
        });
        Ok(ranked)
    }
}

/// Exponential decay from the entity's last content change.
fn freshness_factor(last_changed: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - last_changed).num_seconds().max(0) as f64 / 86_400.0;
    (-days / FRESHNESS_HALF_LIFE_DAYS).exp()
}
