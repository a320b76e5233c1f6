//! # lore-synthesis
//!
//! The synthesis orchestrator: runs a pipeline of independent
//! capabilities over an entity's structural facts, validates every
//! citation the drafts carry against stored content hashes, and persists
//! the survivors as claims with their evidence routed through the ledger.
//!
//! A claim with any unresolved citation is quarantined, not discarded:
//! it sits out of retrieval and gets another pass on the next synthesis
//! cycle. When the provider is down the whole request fails closed;
//! nothing is ever fabricated to fill the gap.

pub mod cache;
pub mod capabilities;
pub mod draft;
pub mod engine;
pub mod validate;

pub use cache::{SynthesisCache, SynthesisKey, SynthesisReceipt};
pub use capabilities::{ContractCapability, IdentityCapability, SemanticCapability};
pub use draft::{CapabilityPipeline, ClaimDraft, SynthesisCapability};
pub use engine::{SynthesisEngine, SynthesisOutcome};
pub use validate::{check_citations, CitationReport};
