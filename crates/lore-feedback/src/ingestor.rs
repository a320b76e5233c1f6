//! Outcome ingestion.
//!
//! `submit_feedback` validates the query and its packs against the
//! store, then appends one outcome event per (pack, claim) pair. A
//! `Failed` outcome additionally activates a capping `FailedOutcome`
//! defeater on each affected claim, unless one is already active.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use lore_core::errors::{FeedbackError, LedgerError, LoreResult};
use lore_core::models::{ContextPack, Defeater, DefeaterKind, DefeaterSeverity, FeedbackOutcome};
use lore_core::traits::IIndexStore;
use lore_core::types::{ClaimId, EntityId, PackId, QueryId};
use lore_ledger::{ConfidenceView, EpistemicsLedger};

/// Turns agent outcomes into ledger events.
pub struct FeedbackIngestor {
    store: Arc<dyn IIndexStore>,
    ledger: Arc<EpistemicsLedger>,
    /// Incrementally folded view, used to skip re-activating a defeater
    /// that is already weighing on a claim.
    view: Mutex<ConfidenceView>,
}

impl FeedbackIngestor {
    pub fn new(store: Arc<dyn IIndexStore>, ledger: Arc<EpistemicsLedger>) -> Self {
        Self {
            store,
            ledger,
            view: Mutex::new(ConfidenceView::new()),
        }
    }

    /// Record what happened after an agent acted on served packs.
    ///
    /// Every pack named must have been delivered for `query_id`; a pack
    /// delivered for some other query is unknown here. Each (pack,
    /// claim) pair gets its own outcome event so calibration can weigh
    /// a claim in the context it was served in. Returns the sequence
    /// numbers of every event appended.
    pub async fn submit_feedback(
        &self,
        query_id: &QueryId,
        pack_ids: &[PackId],
        outcome: FeedbackOutcome,
    ) -> LoreResult<Vec<u64>> {
        if pack_ids.is_empty() {
            return Err(FeedbackError::InvalidOutcome {
                reason: "feedback names no packs".to_string(),
            }
            .into());
        }
        if !self.store.query_exists(query_id)? {
            return Err(FeedbackError::UnknownQuery {
                query_id: query_id.as_str().to_string(),
            }
            .into());
        }

        // Validate every pack before appending anything, so a bad id
        // cannot leave a half-recorded submission behind.
        let delivered: HashMap<PackId, ContextPack> = self
            .store
            .packs_for_query(query_id)?
            .into_iter()
            .map(|pack| (pack.id.clone(), pack))
            .collect();
        let mut packs = Vec::with_capacity(pack_ids.len());
        for pack_id in pack_ids {
            let Some(pack) = delivered.get(pack_id) else {
                return Err(FeedbackError::UnknownPack {
                    pack_id: pack_id.as_str().to_string(),
                }
                .into());
            };
            packs.push(pack);
        }

        let mut sequences = Vec::new();
        for pack in &packs {
            for claim_id in &pack.claim_ids {
                let seq = self
                    .ledger
                    .record_outcome(claim_id, Some(&pack.entity_id), query_id, &pack.id, outcome)
                    .await?;
                sequences.push(seq);
            }
        }

        if outcome == FeedbackOutcome::Failed {
            sequences.extend(self.escalate_failures(query_id, &packs).await?);
        }

        debug!(
            query = %query_id,
            packs = packs.len(),
            outcome = outcome.as_str(),
            events = sequences.len(),
            "feedback recorded"
        );
        Ok(sequences)
    }

    /// Activate a capping `FailedOutcome` defeater on each claim the
    /// failed packs cite. A claim already carrying an active one is
    /// left alone, so repeated failures never stack caps.
    async fn escalate_failures(
        &self,
        query_id: &QueryId,
        packs: &[&ContextPack],
    ) -> LoreResult<Vec<u64>> {
        let view = self.snapshot_view()?;
        let cap = self.ledger.config().failed_outcome_cap;

        let mut affected: Vec<(&ClaimId, &EntityId)> = Vec::new();
        for pack in packs {
            for claim_id in &pack.claim_ids {
                if !affected.iter().any(|(id, _)| *id == claim_id) {
                    affected.push((claim_id, &pack.entity_id));
                }
            }
        }

        let mut sequences = Vec::new();
        for (claim_id, entity_id) in affected {
            let already_capped = view
                .claim(claim_id)
                .map(|state| {
                    state
                        .active_defeaters
                        .iter()
                        .any(|d| d.kind == DefeaterKind::FailedOutcome)
                })
                .unwrap_or(false);
            if already_capped {
                continue;
            }
            let defeater = Defeater::new(
                claim_id.clone(),
                DefeaterKind::FailedOutcome,
                DefeaterSeverity::CapsConfidence { cap },
                format!("agent reported a failed outcome for query {query_id}"),
            );
            let seqs = self.ledger.activate_defeater(&defeater, Some(entity_id)).await?;
            sequences.extend(seqs);
        }
        Ok(sequences)
    }

    /// Fold any new ledger events into the shared view and clone it.
    fn snapshot_view(&self) -> LoreResult<ConfidenceView> {
        let mut guard = self.view.lock().map_err(|e| LedgerError::ReplayFailed {
            sequence: 0,
            reason: format!("confidence view lock poisoned: {e}"),
        })?;
        self.ledger.refresh_view(&mut guard)?;
        Ok(guard.clone())
    }
}
