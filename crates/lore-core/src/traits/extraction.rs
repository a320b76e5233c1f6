use crate::errors::LoreResult;
use crate::models::{Entity, Fact};
use crate::types::AdapterId;

/// One entity with the facts extracted from it.
#[derive(Debug, Clone)]
pub struct ExtractedEntity {
    pub entity: Entity,
    pub facts: Vec<Fact>,
}

/// Deterministic structural extraction from source content.
///
/// Determinism is the contract: byte-identical content must yield
/// byte-identical entities and facts, or incremental admission breaks.
pub trait IExtractionAdapter: Send + Sync {
    /// Stable identifier recorded on every fact this adapter produces.
    fn adapter_id(&self) -> AdapterId;

    /// Whether this adapter understands the given path.
    fn handles(&self, path: &str) -> bool;

    /// Extract all entities and facts from one file's content.
    ///
    /// A parse failure is reported as `ExtractError::ParseFailed`; callers
    /// degrade to partial facts and a coverage gap rather than aborting.
    fn extract(&self, path: &str, content: &str) -> LoreResult<Vec<ExtractedEntity>>;
}
