/// Synthesis orchestrator errors.
#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    /// Fail closed: no semantic synthesis without a live provider.
    #[error("provider unavailable: {provider}: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("claim quarantined: {claim_id}: {failed_citations} citation(s) failed validation")]
    QuarantinedClaim {
        claim_id: String,
        failed_citations: usize,
    },

    #[error("provider returned no claims for entity {entity_id}")]
    EmptySynthesis { entity_id: String },

    #[error("synthesis budget exhausted after {elapsed_ms}ms (budget {budget_ms}ms)")]
    BudgetExhausted { elapsed_ms: u64, budget_ms: u64 },

    #[error("provider response malformed: {reason}")]
    MalformedResponse { reason: String },
}
