//! Evidence records: the append-only trail backing every claim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ClaimId, EvidenceId};

/// A span citation into source content, pinned to a content hash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    pub path: String,
    pub line_start: u32,
    pub line_end: u32,
    /// blake3 of the cited entity's content at citation time.
    pub content_hash: String,
}

impl Citation {
    pub fn new(
        path: impl Into<String>,
        line_start: u32,
        line_end: u32,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line_start,
            line_end,
            content_hash: content_hash.into(),
        }
    }

    /// Compact `path:start-end` form for rendering and logs.
    pub fn span(&self) -> String {
        format!("{}:{}-{}", self.path, self.line_start, self.line_end)
    }
}

/// How the evidence was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Deterministic adapter extraction; hash-verifiable.
    StructuralFact,
    /// Provider synthesis; subject to citation validation.
    Synthesis,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::StructuralFact => "structural_fact",
            ExtractionMethod::Synthesis => "synthesis",
        }
    }
}

/// One immutable evidence record. A citation is mandatory: evidence without
/// a source span does not exist in this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceRecord {
    pub id: EvidenceId,
    pub claim_id: ClaimId,
    pub citation: Citation,
    pub method: ExtractionMethod,
    pub recorded_at: DateTime<Utc>,
}

impl EvidenceRecord {
    pub fn new(claim_id: ClaimId, citation: Citation, method: ExtractionMethod) -> Self {
        Self {
            id: EvidenceId::generate(),
            claim_id,
            citation,
            method,
            recorded_at: Utc::now(),
        }
    }
}

impl PartialEq for EvidenceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EvidenceRecord {}
