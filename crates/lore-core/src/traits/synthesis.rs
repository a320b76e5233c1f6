use crate::errors::LoreResult;
use crate::models::{Citation, Entity, Fact};

/// Resource ceilings for one provider call.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisBudget {
    pub max_tokens: usize,
    pub wall_clock_ms: u64,
}

/// A provider's raw claim before citation validation.
#[derive(Debug, Clone)]
pub struct ProviderClaim {
    pub text: String,
    /// Citations as the provider asserted them; validated before storage.
    pub citations: Vec<Citation>,
    pub model: String,
}

/// Semantic synthesis over an entity's structural facts.
///
/// Fail closed: when no provider is live, synthesis is skipped entirely
/// and entities keep only structural knowledge. Nothing is fabricated.
pub trait ISynthesisProvider: Send + Sync {
    /// Human-readable provider name, recorded in claim provenance.
    fn name(&self) -> &str;

    /// Whether this provider can currently serve calls.
    fn is_available(&self) -> bool;

    /// Synthesize claims about `entity` grounded in `facts`.
    ///
    /// Every returned claim must cite spans the provider actually used;
    /// invented citations are caught by validation and quarantined.
    fn synthesize(
        &self,
        entity: &Entity,
        facts: &[Fact],
        budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>>;
}
