/// Invalidation graph errors.
///
/// Dependency cycles are not an error: they collapse into invalidation
/// units internally and never surface to callers.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("unknown entity in graph: {id}")]
    UnknownEntity { id: String },

    #[error("graph inconsistency: {details}")]
    Inconsistency { details: String },
}
