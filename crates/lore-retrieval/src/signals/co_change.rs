//! Co-change signal: entities that historically changed in the same
//! sessions as the seeds.

use std::collections::BTreeSet;
use std::sync::Arc;

use lore_core::errors::{LoreResult, RetrievalError};
use lore_core::traits::{IIndexStore, ISignalProvider, SignalHit, SignalQuery};
use lore_core::types::EntityId;

/// Scores entities by the best Jaccard overlap between their change
/// sessions and any seed's change sessions.
pub struct CoChangeSignal {
    store: Arc<dyn IIndexStore>,
}

impl CoChangeSignal {
    pub fn new(store: Arc<dyn IIndexStore>) -> Self {
        Self { store }
    }
}

impl ISignalProvider for CoChangeSignal {
    fn name(&self) -> &'static str {
        "co_change"
    }

    fn retrieve(&self, query: &SignalQuery, k: usize) -> LoreResult<Vec<SignalHit>> {
        if query.seed_entities.is_empty() {
            return Err(RetrievalError::SignalFailed {
                signal: "co_change".to_string(),
                reason: "no seed entities resolved from the query".to_string(),
            }
            .into());
        }

        let mut seed_sessions: Vec<(EntityId, BTreeSet<u64>)> = Vec::new();
        for seed in &query.seed_entities {
            let sessions: BTreeSet<u64> = self.store.change_sessions(seed)?.into_iter().collect();
            if !sessions.is_empty() {
                seed_sessions.push((seed.clone(), sessions));
            }
        }
        if seed_sessions.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for entity in self.store.entities()? {
            let sessions: BTreeSet<u64> =
                self.store.change_sessions(&entity.id)?.into_iter().collect();
            if sessions.is_empty() {
                continue;
            }
            let score = seed_sessions
                .iter()
                .map(|(_, seed)| jaccard(seed, &sessions))
                .fold(0.0, f64::max);
            if score > 0.0 {
                hits.push(SignalHit {
                    entity_id: entity.id,
                    claim_id: None,
                    score,
                });
            }
        }
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

fn jaccard(a: &BTreeSet<u64>, b: &BTreeSet<u64>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}
