use serde::{Deserialize, Serialize};

use crate::errors::LoreResult;
use crate::intent::QueryIntent;
use crate::models::{ClaimState, ContextPack, Durability, Entity, EvidenceRecord, Fact, SemanticClaim};
use crate::types::{ClaimId, EntityId, PackId, QueryId};

/// What admission did with an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreOutcome {
    /// Content hash matched the stored entity: zero recompute downstream.
    Unchanged,
    /// First time this entity was seen.
    Created { revision: u64 },
    /// Content changed; prior facts were superseded.
    Superseded { previous_hash: String, revision: u64 },
}

impl StoreOutcome {
    /// Whether downstream invalidation and re-synthesis are needed.
    pub fn changed(&self) -> bool {
        !matches!(self, StoreOutcome::Unchanged)
    }
}

/// A stored claim embedding, row shape for vector scans.
#[derive(Debug, Clone)]
pub struct ClaimEmbedding {
    pub claim_id: ClaimId,
    pub entity_id: EntityId,
    pub vector: Vec<f32>,
}

/// Full index store: entities + facts + claims + evidence + embeddings +
/// change history + packs + maintenance.
pub trait IIndexStore: Send + Sync {
    // --- Entities & facts ---

    /// Admit an entity with its extracted facts. Compares content hashes
    /// first: an unchanged hash writes nothing and triggers nothing.
    fn admit(&self, entity: &Entity, facts: &[Fact]) -> LoreResult<StoreOutcome>;
    fn entity(&self, id: &EntityId) -> LoreResult<Option<Entity>>;
    fn entities(&self) -> LoreResult<Vec<Entity>>;
    fn entities_in_path(&self, prefix: &str) -> LoreResult<Vec<Entity>>;
    fn remove_entity(&self, id: &EntityId) -> LoreResult<()>;
    fn set_durability(&self, id: &EntityId, durability: Durability) -> LoreResult<()>;
    fn facts(&self, entity_id: &EntityId) -> LoreResult<Vec<Fact>>;

    // --- Claims ---
    fn put_claim(&self, claim: &SemanticClaim) -> LoreResult<()>;
    fn claim(&self, id: &ClaimId) -> LoreResult<Option<SemanticClaim>>;
    fn claims_for_entity(&self, entity_id: &EntityId) -> LoreResult<Vec<SemanticClaim>>;
    fn claims_in_state(&self, state: ClaimState) -> LoreResult<Vec<SemanticClaim>>;
    fn set_claim_state(&self, id: &ClaimId, state: ClaimState) -> LoreResult<()>;

    /// FTS5 match over claim and fact text, more relevant rows first.
    /// Fact-only matches carry no claim id.
    fn search_text(
        &self,
        query: &str,
        limit: usize,
    ) -> LoreResult<Vec<(Option<ClaimId>, EntityId, f64)>>;

    // --- Evidence ---
    fn put_evidence(&self, record: &EvidenceRecord) -> LoreResult<()>;
    fn evidence_for_claim(&self, claim_id: &ClaimId) -> LoreResult<Vec<EvidenceRecord>>;

    // --- Embeddings ---
    fn put_embedding(&self, embedding: &ClaimEmbedding) -> LoreResult<()>;
    fn embeddings(&self) -> LoreResult<Vec<ClaimEmbedding>>;

    // --- Change history ---

    /// Open a new change session and return its number. Also runs
    /// durability promotion for entities that sat out enough sessions.
    fn begin_session(&self) -> LoreResult<u64>;
    fn current_session(&self) -> LoreResult<u64>;

    /// Session numbers in which this entity changed, ascending.
    fn change_sessions(&self, entity_id: &EntityId) -> LoreResult<Vec<u64>>;

    // --- Queries & packs ---

    /// Record a served query. Must happen before its packs are stored;
    /// packs reference the query row.
    fn record_query(
        &self,
        query_id: &QueryId,
        text: &str,
        intent: QueryIntent,
        revision: u64,
    ) -> LoreResult<()>;
    fn query_exists(&self, query_id: &QueryId) -> LoreResult<bool>;
    fn put_pack(&self, pack: &ContextPack, query_id: &QueryId) -> LoreResult<()>;
    fn pack(&self, id: &PackId) -> LoreResult<Option<ContextPack>>;
    fn packs_for_query(&self, query_id: &QueryId) -> LoreResult<Vec<ContextPack>>;

    // --- Maintenance ---
    fn vacuum(&self) -> LoreResult<()>;
}
