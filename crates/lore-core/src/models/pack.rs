//! Context packs: the unit of delivery to consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::confidence::ConfidenceValue;
use crate::models::defeater::DefeaterKind;
use crate::models::evidence::Citation;
use crate::types::{ClaimId, EntityId, PackId};

/// How much detail a pack carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DepthLevel {
    /// Names and kinds only.
    IdentifiersOnly,
    /// Signatures, exports, and guard summaries.
    #[default]
    Signatures,
    /// Full claim text plus structural detail.
    Implementation,
    /// Implementation plus direct dependency context.
    CrossFile,
}

impl DepthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepthLevel::IdentifiersOnly => "identifiers_only",
            DepthLevel::Signatures => "signatures",
            DepthLevel::Implementation => "implementation",
            DepthLevel::CrossFile => "cross_file",
        }
    }
}

/// One titled body of rendered content inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSection {
    pub title: String,
    pub body: String,
}

impl PackSection {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// An assembled, self-describing context bundle for one entity.
///
/// A pack is honest about its own reliability: it carries its confidence,
/// its active defeaters, and the exact entity set whose change would
/// invalidate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextPack {
    pub id: PackId,
    pub entity_id: EntityId,
    pub summary: String,
    pub sections: Vec<PackSection>,
    pub citations: Vec<Citation>,
    /// Claims whose text contributed to the sections.
    pub claim_ids: Vec<ClaimId>,
    pub confidence: ConfidenceValue,
    pub active_defeaters: Vec<DefeaterKind>,
    /// When the newest contributing evidence was recorded.
    pub freshness: DateTime<Utc>,
    /// Entities whose content change invalidates this pack.
    pub invalidation_triggers: Vec<EntityId>,
    /// Measured token cost of the rendered pack.
    pub token_cost: usize,
    pub depth: DepthLevel,
}

impl PartialEq for ContextPack {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ContextPack {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_levels_order_by_detail() {
        assert!(DepthLevel::IdentifiersOnly < DepthLevel::Signatures);
        assert!(DepthLevel::Signatures < DepthLevel::Implementation);
        assert!(DepthLevel::Implementation < DepthLevel::CrossFile);
    }
}
