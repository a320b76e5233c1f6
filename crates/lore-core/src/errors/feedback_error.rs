/// Feedback ingestion errors.
#[derive(Debug, thiserror::Error)]
pub enum FeedbackError {
    #[error("unknown query: {query_id}")]
    UnknownQuery { query_id: String },

    #[error("unknown pack: {pack_id}")]
    UnknownPack { pack_id: String },

    #[error("outcome rejected: {reason}")]
    InvalidOutcome { reason: String },
}
