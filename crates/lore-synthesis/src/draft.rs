//! Claim drafts and the capability pipeline that produces them.

use std::sync::Arc;

use lore_core::errors::LoreResult;
use lore_core::models::{Citation, Entity, ExtractionMethod, Fact};
use lore_core::traits::{ISynthesisProvider, SynthesisBudget};

use crate::capabilities::{ContractCapability, IdentityCapability, SemanticCapability};

/// An unvalidated claim produced by one capability.
///
/// Drafts become stored claims only after citation validation. The
/// provenance fields travel with the draft so quarantined claims still
/// record where their text came from.
#[derive(Debug, Clone)]
pub struct ClaimDraft {
    pub text: String,
    pub citations: Vec<Citation>,
    /// Capability (or provider) that produced the draft; recorded as the
    /// claim's provider in provenance.
    pub capability: String,
    /// Model identifier, `"deterministic"` for fact-derived drafts.
    pub model: String,
    /// How evidence from this draft was produced.
    pub method: ExtractionMethod,
}

/// One independently testable step of the synthesis pipeline.
///
/// Capabilities never talk to the store: they see an entity with its
/// facts and return drafts. Validation and persistence happen in the
/// orchestrator, identically for every capability.
pub trait SynthesisCapability: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the capability can currently run. Deterministic
    /// capabilities are always live; provider-backed ones may not be.
    fn is_available(&self) -> bool {
        true
    }

    fn derive(
        &self,
        entity: &Entity,
        facts: &[Fact],
        budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>>;
}

/// Ordered set of capabilities run for every synthesis request.
///
/// Order is part of the contract: drafts map onto existing claims by
/// position, so a stable pipeline keeps claim ids stable across
/// re-synthesis cycles.
pub struct CapabilityPipeline {
    capabilities: Vec<Box<dyn SynthesisCapability>>,
}

impl CapabilityPipeline {
    pub fn new(capabilities: Vec<Box<dyn SynthesisCapability>>) -> Self {
        Self { capabilities }
    }

    /// Deterministic capabilities only: structural claims, no provider.
    pub fn structural() -> Self {
        Self::new(vec![
            Box::new(IdentityCapability),
            Box::new(ContractCapability),
        ])
    }

    /// Structural capabilities plus provider-backed semantic synthesis.
    pub fn with_provider(provider: Arc<dyn ISynthesisProvider>) -> Self {
        Self::new(vec![
            Box::new(IdentityCapability),
            Box::new(ContractCapability),
            Box::new(SemanticCapability::new(provider)),
        ])
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    /// Name of the first capability that cannot currently run, if any.
    /// The orchestrator fails closed on it before deriving anything.
    pub fn unavailable(&self) -> Option<&str> {
        self.capabilities
            .iter()
            .find(|c| !c.is_available())
            .map(|c| c.name())
    }

    /// Run every capability in order, concatenating drafts.
    pub fn derive_all(
        &self,
        entity: &Entity,
        facts: &[Fact],
        budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>> {
        let mut drafts = Vec::new();
        for capability in &self.capabilities {
            drafts.extend(capability.derive(entity, facts, budget)?);
        }
        Ok(drafts)
    }
}
