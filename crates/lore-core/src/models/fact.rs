//! Structural facts: deterministic, adapter-extracted observations.
//!
//! Facts carry no timestamps. Extraction of byte-identical content must
//! produce byte-identical facts, so identity is derived purely from the
//! entity, the payload, and the adapter that produced it.

use serde::{Deserialize, Serialize};

use crate::types::{AdapterId, EntityId, FactId};

/// The typed payload of a structural fact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum FactPayload {
    /// A callable's declared interface.
    Signature {
        name: String,
        parameters: Vec<String>,
        returns: Option<String>,
    },
    /// An import of another module or path.
    Import { source: String },
    /// A symbol this entity exports.
    Export { symbol: String },
    /// A call from this entity to another symbol.
    Call { callee: String },
    /// A guard clause: condition checked, error raised when it holds.
    Guard { condition: String, raises: String },
    /// Documentation text attached to the entity.
    Doc { text: String },
    /// Size metrics for the entity body.
    Metrics { lines: u32, branches: u32 },
}

impl FactPayload {
    /// Short tag used in rendering and logging.
    pub fn kind(&self) -> &'static str {
        match self {
            FactPayload::Signature { .. } => "signature",
            FactPayload::Import { .. } => "import",
            FactPayload::Export { .. } => "export",
            FactPayload::Call { .. } => "call",
            FactPayload::Guard { .. } => "guard",
            FactPayload::Doc { .. } => "doc",
            FactPayload::Metrics { .. } => "metrics",
        }
    }
}

/// A single structural fact extracted from source content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fact {
    pub id: FactId,
    pub entity_id: EntityId,
    pub payload: FactPayload,
    /// blake3 of the canonical payload serialization.
    pub content_hash: String,
    pub adapter: AdapterId,
}

impl Fact {
    /// Build a fact with its deterministic id and payload hash.
    ///
    /// Serialization of `FactPayload` is canonical (field order is fixed by
    /// the struct definitions), so hashing the JSON form is stable.
    pub fn new(entity_id: EntityId, payload: FactPayload, adapter: AdapterId) -> Self {
        let content_hash = hash_payload(&payload);
        let id = FactId::new(derive_fact_id(&entity_id, &content_hash, &adapter));
        Self {
            id,
            entity_id,
            payload,
            content_hash,
            adapter,
        }
    }
}

/// Facts compare by id; the id already encodes entity, payload, and adapter.
impl PartialEq for Fact {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Fact {}

fn hash_payload(payload: &FactPayload) -> String {
    // Serialization cannot fail for these payloads: no maps with non-string
    // keys, no non-finite floats.
    let bytes = serde_json::to_vec(payload).unwrap_or_default();
    blake3::hash(&bytes).to_hex().to_string()
}

fn derive_fact_id(entity_id: &EntityId, payload_hash: &str, adapter: &AdapterId) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(entity_id.as_str().as_bytes());
    hasher.update(b"\x00");
    hasher.update(payload_hash.as_bytes());
    hasher.update(b"\x00");
    hasher.update(adapter.as_str().as_bytes());
    hasher.finalize().to_hex().to_string()
}
