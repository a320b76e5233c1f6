//! Error handling for the lore workspace.
//! One error enum per subsystem, `thiserror` only, zero `anyhow` in
//! library code.

pub mod extract_error;
pub mod feedback_error;
pub mod graph_error;
pub mod ledger_error;
pub mod retrieval_error;
pub mod store_error;
pub mod synthesis_error;

pub use extract_error::ExtractError;
pub use feedback_error::FeedbackError;
pub use graph_error::GraphError;
pub use ledger_error::LedgerError;
pub use retrieval_error::RetrievalError;
pub use store_error::StoreError;
pub use synthesis_error::SynthesisError;

/// Workspace-wide result alias.
pub type LoreResult<T> = Result<T, LoreError>;

/// Top-level error type aggregating subsystem errors via `From`.
#[derive(Debug, thiserror::Error)]
pub enum LoreError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    #[error("feedback error: {0}")]
    Feedback(#[from] FeedbackError),

    #[error("entity not found: {id}")]
    EntityNotFound { id: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {reason}")]
    Config { reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
