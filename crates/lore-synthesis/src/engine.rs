//! The synthesis orchestrator.
//!
//! One request runs the capability pipeline under a wall-clock budget,
//! validates every draft's citations, and persists the results: claims
//! with fully resolved citations become `Validated`, the rest are
//! `Quarantined`. All state changes and evidence go through the ledger,
//! so the confidence view sees exactly what happened here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use lore_core::config::SynthesisConfig;
use lore_core::errors::{LedgerError, LoreError, LoreResult, SynthesisError};
use lore_core::models::{ClaimProvenance, ClaimState, Entity, EvidenceRecord, Fact, SemanticClaim};
use lore_core::traits::{IIndexStore, SynthesisBudget};
use lore_core::types::{ClaimId, EntityId};
use lore_ledger::EpistemicsLedger;

use crate::cache::{SynthesisCache, SynthesisKey, SynthesisReceipt};
use crate::draft::{CapabilityPipeline, ClaimDraft};
use crate::validate;

/// Result of one synthesis request.
#[derive(Debug, Default)]
pub struct SynthesisOutcome {
    pub validated: Vec<SemanticClaim>,
    pub quarantined: Vec<SemanticClaim>,
    /// One `QuarantinedClaim` entry per quarantined claim.
    pub failures: Vec<SynthesisError>,
    pub from_cache: bool,
}

/// Drives synthesis for one entity at a time: cache lookup, budget-gated
/// pipeline run, citation validation, persistence.
pub struct SynthesisEngine {
    store: Arc<dyn IIndexStore>,
    ledger: Arc<EpistemicsLedger>,
    pipeline: Arc<CapabilityPipeline>,
    cache: SynthesisCache,
    config: SynthesisConfig,
}

impl SynthesisEngine {
    pub fn new(
        store: Arc<dyn IIndexStore>,
        ledger: Arc<EpistemicsLedger>,
        pipeline: CapabilityPipeline,
        config: SynthesisConfig,
    ) -> Self {
        let cache = SynthesisCache::new(config.cache_size);
        Self {
            store,
            ledger,
            pipeline: Arc::new(pipeline),
            cache,
            config,
        }
    }

    /// Cache statistics, exposed for observability.
    pub fn cache(&self) -> &SynthesisCache {
        &self.cache
    }

    /// Synthesize claims for one entity.
    ///
    /// A cached receipt for the same (content hash, prompt version) is
    /// returned as-is, unless it contains quarantined claims and retry
    /// is enabled: those get a fresh pass. Fails closed with
    /// `ProviderUnavailable` before touching anything when a capability
    /// reports itself down.
    pub async fn request_synthesis(&self, entity_id: &EntityId) -> LoreResult<SynthesisOutcome> {
        let entity = self
            .store
            .entity(entity_id)?
            .ok_or_else(|| LoreError::EntityNotFound {
                id: entity_id.as_str().to_string(),
            })?;

        let key = SynthesisKey::new(&entity, &self.config.prompt_version);
        if let Some(receipt) = self.cache.get(&key) {
            let retry = self.config.retry_quarantined && !receipt.quarantined.is_empty();
            if !retry {
                debug!(entity = %entity_id, "synthesis served from cache");
                return self.load_receipt(receipt);
            }
            debug!(
                entity = %entity_id,
                quarantined = receipt.quarantined.len(),
                "cached synthesis holds quarantined claims, retrying"
            );
        }

        if let Some(provider) = self.pipeline.unavailable() {
            return Err(LoreError::Synthesis(SynthesisError::ProviderUnavailable {
                provider: provider.to_string(),
                reason: "provider reports itself unavailable".to_string(),
            }));
        }

        let facts = self.store.facts(entity_id)?;
        let budget = SynthesisBudget {
            max_tokens: self.config.max_tokens,
            wall_clock_ms: self.config.wall_clock_ms,
        };
        let drafts = self.derive_drafts(&entity, &facts, &budget).await?;
        if drafts.is_empty() {
            return Err(LoreError::Synthesis(SynthesisError::EmptySynthesis {
                entity_id: entity_id.as_str().to_string(),
            }));
        }

        self.persist_drafts(&entity, drafts, key).await
    }

    /// Run the pipeline on a blocking thread under the wall-clock budget.
    /// The provider call inside is the suspension point; on timeout the
    /// task is abandoned and nothing is persisted.
    async fn derive_drafts(
        &self,
        entity: &Entity,
        facts: &[Fact],
        budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>> {
        let pipeline = Arc::clone(&self.pipeline);
        let entity = entity.clone();
        let facts = facts.to_vec();
        let budget_copy = *budget;
        let started = Instant::now();
        let task =
            tokio::task::spawn_blocking(move || pipeline.derive_all(&entity, &facts, &budget_copy));
        match timeout(Duration::from_millis(budget.wall_clock_ms), task).await {
            Ok(Ok(drafts)) => drafts,
            Ok(Err(join)) => Err(LoreError::Synthesis(SynthesisError::MalformedResponse {
                reason: format!("synthesis task failed: {join}"),
            })),
            Err(_) => Err(LoreError::Synthesis(SynthesisError::BudgetExhausted {
                elapsed_ms: started.elapsed().as_millis() as u64,
                budget_ms: budget.wall_clock_ms,
            })),
        }
    }

    async fn persist_drafts(
        &self,
        entity: &Entity,
        drafts: Vec<ClaimDraft>,
        key: SynthesisKey,
    ) -> LoreResult<SynthesisOutcome> {
        let entity_id = &entity.id;
        let mut outcome = SynthesisOutcome::default();
        let mut receipt = SynthesisReceipt::default();

        // Drafts map onto existing claims by position so claim ids stay
        // stable across cycles and outcome history keeps accumulating.
        let mut slots = self.reusable_claims(entity_id)?.into_iter();

        for draft in drafts {
            let claim = match slots.next() {
                Some(existing) => self.reuse_claim(existing, &draft, entity).await?,
                None => self.create_claim(&draft, entity)?,
            };

            let report = validate::check_citations(self.store.as_ref(), &draft.citations)?;
            for citation in &report.verified {
                let record = EvidenceRecord::new(claim.id.clone(), citation.clone(), draft.method);
                self.ledger.record_evidence(&record, Some(entity_id), true).await?;
            }
            for citation in &report.failed {
                let record = EvidenceRecord::new(claim.id.clone(), citation.clone(), draft.method);
                self.ledger.record_evidence(&record, Some(entity_id), false).await?;
            }

            if report.all_verified() {
                self.ledger
                    .transition_claim(&claim.id, Some(entity_id), ClaimState::Validated)
                    .await?;
                receipt.validated.push(claim.id.clone());
                outcome.validated.push(self.reload(&claim.id)?);
            } else {
                warn!(
                    claim = %claim.id,
                    failed = report.failed.len(),
                    "citation validation failed, quarantining"
                );
                self.ledger
                    .transition_claim(&claim.id, Some(entity_id), ClaimState::Quarantined)
                    .await?;
                outcome.failures.push(SynthesisError::QuarantinedClaim {
                    claim_id: claim.id.as_str().to_string(),
                    failed_citations: report.failed.len(),
                });
                receipt.quarantined.push(claim.id.clone());
                outcome.quarantined.push(self.reload(&claim.id)?);
            }
        }

        // Claims whose draft disappeared this cycle are retired.
        for leftover in slots {
            if leftover.state == ClaimState::Validated {
                self.ledger
                    .transition_claim(&leftover.id, Some(entity_id), ClaimState::Stale)
                    .await?;
            }
        }

        info!(
            entity = %entity_id,
            validated = outcome.validated.len(),
            quarantined = outcome.quarantined.len(),
            "synthesis complete"
        );
        self.cache.put(key, receipt);
        Ok(outcome)
    }

    /// Claims eligible for re-synthesis, oldest first. `Synthesized` is
    /// mid-flight and never reused; quarantined claims re-enter only
    /// when retry is enabled.
    fn reusable_claims(&self, entity_id: &EntityId) -> LoreResult<Vec<SemanticClaim>> {
        let claims = self.store.claims_for_entity(entity_id)?;
        Ok(claims
            .into_iter()
            .filter(|claim| match claim.state {
                ClaimState::Pending
                | ClaimState::Stale
                | ClaimState::Validated
                | ClaimState::Defeated => true,
                ClaimState::Quarantined => self.config.retry_quarantined,
                ClaimState::Synthesized => false,
            })
            .collect())
    }

    /// Walk an existing claim through the lifecycle back to `Pending`,
    /// overwrite its text and provenance, and mark it `Synthesized`.
    /// Every step lands in the ledger.
    async fn reuse_claim(
        &self,
        existing: SemanticClaim,
        draft: &ClaimDraft,
        entity: &Entity,
    ) -> LoreResult<SemanticClaim> {
        let entity_id = &entity.id;
        match existing.state {
            ClaimState::Validated | ClaimState::Quarantined | ClaimState::Defeated => {
                self.ledger
                    .transition_claim(&existing.id, Some(entity_id), ClaimState::Stale)
                    .await?;
                self.ledger
                    .transition_claim(&existing.id, Some(entity_id), ClaimState::Pending)
                    .await?;
            }
            ClaimState::Stale => {
                self.ledger
                    .transition_claim(&existing.id, Some(entity_id), ClaimState::Pending)
                    .await?;
            }
            ClaimState::Pending | ClaimState::Synthesized => {}
        }

        let mut claim = existing;
        claim.text = draft.text.clone();
        claim.provenance = self.provenance(draft);
        claim.revision = entity.revision;
        claim.state = ClaimState::Pending;
        self.store.put_claim(&claim)?;
        self.ledger
            .transition_claim(&claim.id, Some(entity_id), ClaimState::Synthesized)
            .await?;
        claim.state = ClaimState::Synthesized;
        Ok(claim)
    }

    fn create_claim(&self, draft: &ClaimDraft, entity: &Entity) -> LoreResult<SemanticClaim> {
        let claim = SemanticClaim::new(
            entity.id.clone(),
            draft.text.clone(),
            self.provenance(draft),
            entity.revision,
        );
        self.store.put_claim(&claim)?;
        Ok(claim)
    }

    fn provenance(&self, draft: &ClaimDraft) -> ClaimProvenance {
        ClaimProvenance {
            provider: draft.capability.clone(),
            model: draft.model.clone(),
            prompt_version: self.config.prompt_version.clone(),
        }
    }

    fn reload(&self, id: &ClaimId) -> LoreResult<SemanticClaim> {
        self.store.claim(id)?.ok_or_else(|| {
            LoreError::Ledger(LedgerError::UnknownClaim {
                claim_id: id.as_str().to_string(),
            })
        })
    }

    fn load_receipt(&self, receipt: SynthesisReceipt) -> LoreResult<SynthesisOutcome> {
        let mut outcome = SynthesisOutcome {
            from_cache: true,
            ..Default::default()
        };
        for id in &receipt.validated {
            outcome.validated.push(self.reload(id)?);
        }
        for id in &receipt.quarantined {
            outcome.quarantined.push(self.reload(id)?);
        }
        Ok(outcome)
    }
}
