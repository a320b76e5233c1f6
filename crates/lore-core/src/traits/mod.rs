//! Trait seams between subsystems.
//!
//! Every external dependency (storage, extraction, synthesis, embeddings,
//! retrieval signals, file content) sits behind a trait so tests can swap
//! in deterministic implementations.

pub mod content;
pub mod embedding;
pub mod extraction;
pub mod signal;
pub mod storage;
pub mod synthesis;

pub use content::IContentSource;
pub use embedding::IEmbeddingProvider;
pub use extraction::{ExtractedEntity, IExtractionAdapter};
pub use signal::{ISignalProvider, SignalHit, SignalQuery};
pub use storage::{ClaimEmbedding, IIndexStore, StoreOutcome};
pub use synthesis::{ISynthesisProvider, ProviderClaim, SynthesisBudget};
