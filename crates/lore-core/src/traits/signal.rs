use crate::errors::LoreResult;
use crate::intent::QueryIntent;
use crate::types::{ClaimId, EntityId};

/// Inputs shared by all signal providers for one retrieval.
#[derive(Debug, Clone)]
pub struct SignalQuery {
    pub text: String,
    pub intent: QueryIntent,
    /// Entities matched directly from the query or constraints; seeds for
    /// proximity and co-change providers.
    pub seed_entities: Vec<EntityId>,
    /// Query embedding, computed once and shared. `None` when the
    /// embedding provider was unavailable.
    pub embedding: Option<Vec<f32>>,
}

/// One provider's scored candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalHit {
    pub entity_id: EntityId,
    /// The specific claim that matched, when the signal is claim-level.
    pub claim_id: Option<ClaimId>,
    /// Provider-local score; scale is provider-specific until
    /// normalization.
    pub score: f64,
}

/// An independent retrieval signal.
///
/// A provider failure or empty result never aborts the merge; it is
/// recorded as a coverage gap and disclosed in the response.
pub trait ISignalProvider: Send + Sync {
    /// Signal name used in coverage gap reports, e.g. `"co_change"`.
    fn name(&self) -> &'static str;

    /// Top-k candidates for the query, ranked by provider-local score.
    fn retrieve(&self, query: &SignalQuery, k: usize) -> LoreResult<Vec<SignalHit>>;
}
