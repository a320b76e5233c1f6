//! Embedding-similarity signal over stored claim vectors.

use std::sync::Arc;

use tracing::debug;

use lore_core::errors::{LoreResult, RetrievalError};
use lore_core::traits::{IIndexStore, ISignalProvider, SignalHit, SignalQuery};

/// Scores validated claims by cosine similarity between the query
/// embedding and each claim's stored vector.
pub struct SemanticSignal {
    store: Arc<dyn IIndexStore>,
}

impl SemanticSignal {
    pub fn new(store: Arc<dyn IIndexStore>) -> Self {
        Self { store }
    }
}

impl ISignalProvider for SemanticSignal {
    fn name(&self) -> &'static str {
        "semantic"
    }

    fn retrieve(&self, query: &SignalQuery, k: usize) -> LoreResult<Vec<SignalHit>> {
        let Some(embedding) = query.embedding.as_deref() else {
            return Err(RetrievalError::SignalFailed {
                signal: "semantic".to_string(),
                reason: "query embedding unavailable".to_string(),
            }
            .into());
        };

        let mut scored = Vec::new();
        for row in self.store.embeddings()? {
            if row.vector.len() != embedding.len() {
                debug!(
                    claim = %row.claim_id,
                    stored = row.vector.len(),
                    query = embedding.len(),
                    "skipping embedding with mismatched dimensions"
                );
                continue;
            }
            let score = cosine(embedding, &row.vector);
            if score > 0.0 {
                scored.push((score, row));
            }
        }
        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.entity_id.cmp(&b.1.entity_id))
                .then_with(|| a.1.claim_id.cmp(&b.1.claim_id))
        });

        // Vectors persist for claims in any state; only validated claims
        // may surface.
        let mut hits = Vec::new();
        for (score, row) in scored {
            if hits.len() == k {
                break;
            }
            let Some(claim) = self.store.claim(&row.claim_id)? else {
                continue;
            };
            if !claim.state.is_retrievable() {
                continue;
            }
            hits.push(SignalHit {
                entity_id: row.entity_id,
                claim_id: Some(row.claim_id),
                score,
            });
        }
        Ok(hits)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        dot += f64::from(*x) * f64::from(*y);
        norm_a += f64::from(*x) * f64::from(*x);
        norm_b += f64::from(*y) * f64::from(*y);
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
