//! Deterministic synthesis and embedding providers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use lore_core::errors::{LoreResult, SynthesisError};
use lore_core::models::{Citation, Entity, Fact};
use lore_core::traits::{IEmbeddingProvider, ISynthesisProvider, ProviderClaim, SynthesisBudget};
use lore_core::types::EntityId;

/// Scripted synthesis: claims staged per entity, nothing invented.
/// Entities without a script get no semantic claims, which is a valid
/// provider response, not an error.
pub struct ScriptedSynthesis {
    scripts: Mutex<HashMap<EntityId, Vec<ProviderClaim>>>,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl ScriptedSynthesis {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    /// Stage the claims returned for one entity.
    pub fn stage(&self, entity_id: &EntityId, claims: Vec<ProviderClaim>) {
        self.scripts.lock().unwrap().insert(entity_id.clone(), claims);
    }

    /// Simulate a provider outage (or recovery).
    pub fn set_available(&self, up: bool) {
        self.available.store(up, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for ScriptedSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

impl ISynthesisProvider for ScriptedSynthesis {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn synthesize(
        &self,
        entity: &Entity,
        _facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ProviderClaim>> {
        if !self.is_available() {
            return Err(SynthesisError::ProviderUnavailable {
                provider: "scripted".to_string(),
                reason: "taken down by the test".to_string(),
            }
            .into());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .scripts
            .lock()
            .unwrap()
            .get(&entity.id)
            .cloned()
            .unwrap_or_default())
    }
}

/// A claim citing the entity's own span and current content hash, the
/// simplest citation that validates.
pub fn claim_citing(entity: &Entity, text: &str) -> ProviderClaim {
    ProviderClaim {
        text: text.to_string(),
        citations: vec![Citation::new(
            entity.location.path.clone(),
            entity.location.line_start,
            entity.location.line_end,
            entity.content_hash.clone(),
        )],
        model: "scripted-v1".to_string(),
    }
}

/// A claim whose citation hash matches nothing, guaranteed to fail
/// validation and quarantine.
pub fn claim_citing_nothing(entity: &Entity, text: &str) -> ProviderClaim {
    ProviderClaim {
        text: text.to_string(),
        citations: vec![Citation::new(
            entity.location.path.clone(),
            entity.location.line_start,
            entity.location.line_end,
            "0000000000000000",
        )],
        model: "scripted-v1".to_string(),
    }
}

/// Embeddings derived from a content hash: deterministic and offline.
/// Identical text maps to identical vectors; similarity carries no
/// meaning beyond exact equality.
pub struct HashEmbedder {
    dims: usize,
}

impl HashEmbedder {
    /// `dims` up to 32, one hash's worth of bytes.
    pub fn new(dims: usize) -> Self {
        assert!(dims > 0 && dims <= 32, "dims must be in 1..=32");
        Self { dims }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(16)
    }
}

impl IEmbeddingProvider for HashEmbedder {
    fn embed(&self, text: &str) -> LoreResult<Vec<f32>> {
        let hash = blake3::hash(text.as_bytes());
        Ok(hash.as_bytes()[..self.dims]
            .iter()
            .map(|b| (*b as f32 - 127.5) / 127.5)
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dims
    }

    fn name(&self) -> &str {
        "hash"
    }

    fn is_available(&self) -> bool {
        true
    }
}
