//! Domain models shared across the workspace.

pub mod claim;
pub mod confidence;
pub mod defeater;
pub mod entity;
pub mod evidence;
pub mod fact;
pub mod outcome;
pub mod pack;
pub mod query;

pub use claim::{ClaimProvenance, ClaimState, SemanticClaim};
pub use confidence::{AbsentReason, AggregationStrategy, ConfidenceBasis, ConfidenceValue};
pub use defeater::{Defeater, DefeaterKind, DefeaterSeverity};
pub use entity::{hash_content, Durability, Entity, EntityKind, SourceLocation};
pub use evidence::{Citation, EvidenceRecord, ExtractionMethod};
pub use fact::{Fact, FactPayload};
pub use outcome::FeedbackOutcome;
pub use pack::{ContextPack, DepthLevel, PackSection};
pub use query::{
    ConfidenceSummary, CoverageGap, QueryConstraints, QueryRequest, QueryResult, ResultFreshness,
};
