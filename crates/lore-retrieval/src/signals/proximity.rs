//! Graph-proximity signal: breadth-first walk out from the seed
//! entities, scoring by hop distance.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use lore_core::errors::{LoreResult, RetrievalError};
use lore_core::traits::{ISignalProvider, SignalHit, SignalQuery};
use lore_core::types::EntityId;
use lore_graph::DependencyGraph;

/// Scores entities by `decay^hops` from the nearest seed, walking both
/// dependency directions. Seeds themselves score 1.0.
pub struct ProximitySignal {
    graph: Arc<RwLock<DependencyGraph>>,
    decay: f64,
    max_hops: usize,
}

impl ProximitySignal {
    pub fn new(graph: Arc<RwLock<DependencyGraph>>, decay: f64, max_hops: usize) -> Self {
        Self {
            graph,
            decay,
            max_hops,
        }
    }
}

impl ISignalProvider for ProximitySignal {
    fn name(&self) -> &'static str {
        "proximity"
    }

    fn retrieve(&self, query: &SignalQuery, k: usize) -> LoreResult<Vec<SignalHit>> {
        if query.seed_entities.is_empty() {
            return Err(RetrievalError::SignalFailed {
                signal: "proximity".to_string(),
                reason: "no seed entities resolved from the query".to_string(),
            }
            .into());
        }

        let graph = self.graph.read().map_err(|e| RetrievalError::SignalFailed {
            signal: "proximity".to_string(),
            reason: format!("graph lock poisoned: {e}"),
        })?;

        // Breadth-first from all seeds at once, so the first visit of an
        // entity is its minimum hop count and therefore its best score.
        let mut scores: HashMap<EntityId, f64> = HashMap::new();
        let mut frontier = VecDeque::new();
        for seed in &query.seed_entities {
            if graph.contains(seed) && !scores.contains_key(seed) {
                scores.insert(seed.clone(), 1.0);
                frontier.push_back((seed.clone(), 0usize));
            }
        }
        while let Some((entity, hops)) = frontier.pop_front() {
            if hops == self.max_hops {
                continue;
            }
            let mut neighbors = graph.dependents_of(&entity);
            neighbors.extend(graph.dependencies_of(&entity));
            for neighbor in neighbors {
                if scores.contains_key(&neighbor) {
                    continue;
                }
                scores.insert(neighbor.clone(), self.decay.powi(hops as i32 + 1));
                frontier.push_back((neighbor, hops + 1));
            }
        }
        drop(graph);

        let mut hits: Vec<SignalHit> = scores
            .into_iter()
            .map(|(entity_id, score)| SignalHit {
                entity_id,
                claim_id: None,
                score,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.entity_id.cmp(&b.entity_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}
