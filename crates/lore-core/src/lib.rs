//! # lore-core
//!
//! Foundation crate for the lore knowledge index.
//! Defines all types, traits, errors, config, and the intent taxonomy.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod intent;
pub mod models;
pub mod traits;
pub mod types;

// Re-export the most commonly used items at the crate root.
pub use config::LoreConfig;
pub use errors::{LoreError, LoreResult};
pub use intent::QueryIntent;
pub use models::confidence::{AbsentReason, ConfidenceBasis, ConfidenceValue};
pub use models::{ContextPack, Entity, Fact, QueryRequest, QueryResult, SemanticClaim};
pub use types::{ClaimId, DefeaterId, EntityId, EvidenceId, FactId, PackId, QueryId};
