/// Retrieval subsystem errors.
#[derive(Debug, thiserror::Error)]
pub enum RetrievalError {
    #[error("time budget exceeded: {elapsed_ms}ms elapsed, budget {budget_ms}ms")]
    BudgetExceeded { elapsed_ms: u64, budget_ms: u64 },

    #[error("signal {signal} failed: {reason}")]
    SignalFailed { signal: String, reason: String },

    #[error("embedding failed: {reason}")]
    EmbeddingFailed { reason: String },

    #[error("query rejected: {reason}")]
    InvalidQuery { reason: String },

    #[error("index is stale: revision {index_revision} behind latest change")]
    StaleIndex { index_revision: u64 },
}
