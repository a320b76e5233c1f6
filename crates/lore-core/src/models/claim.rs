//! Semantic claims and their lifecycle state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ClaimId, EntityId, EvidenceId};

/// Lifecycle state of a semantic claim.
///
/// Transitions are strict; anything outside `can_transition` is rejected by
/// the ledger with `InvalidClaimTransition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimState {
    /// Scheduled for synthesis; no text yet.
    Pending,
    /// Provider produced text; citations not yet verified.
    Synthesized,
    /// Every citation resolved against current content hashes.
    Validated,
    /// At least one citation failed validation; excluded from retrieval.
    Quarantined,
    /// Underlying content changed since synthesis.
    Stale,
    /// A defeater with `ForcesAbsent` severity landed on the claim.
    Defeated,
}

impl ClaimState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimState::Pending => "pending",
            ClaimState::Synthesized => "synthesized",
            ClaimState::Validated => "validated",
            ClaimState::Quarantined => "quarantined",
            ClaimState::Stale => "stale",
            ClaimState::Defeated => "defeated",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "pending" => Some(ClaimState::Pending),
            "synthesized" => Some(ClaimState::Synthesized),
            "validated" => Some(ClaimState::Validated),
            "quarantined" => Some(ClaimState::Quarantined),
            "stale" => Some(ClaimState::Stale),
            "defeated" => Some(ClaimState::Defeated),
            _ => None,
        }
    }

    /// Whether `self -> next` is a legal lifecycle transition.
    pub fn can_transition(&self, next: ClaimState) -> bool {
        use ClaimState::*;
        matches!(
            (self, next),
            (Pending, Synthesized)
                | (Synthesized, Validated)
                | (Synthesized, Quarantined)
                | (Synthesized, Defeated)
                | (Validated, Stale)
                | (Validated, Defeated)
                | (Quarantined, Stale)
                | (Defeated, Stale)
                | (Stale, Pending)
        )
    }

    /// States whose claims may appear in retrieval results.
    pub fn is_retrievable(&self) -> bool {
        matches!(self, ClaimState::Validated)
    }
}

/// Where a claim's text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProvenance {
    /// Synthesis provider name, e.g. `"scripted"` or `"anthropic"`.
    pub provider: String,
    /// Model identifier reported by the provider.
    pub model: String,
    /// Version tag of the prompt template used.
    pub prompt_version: String,
}

/// A synthesized statement about an entity, grounded in cited evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticClaim {
    pub id: ClaimId,
    pub entity_id: EntityId,
    pub text: String,
    /// Evidence records backing this claim. Never empty once synthesized.
    pub evidence: Vec<EvidenceId>,
    pub state: ClaimState,
    pub provenance: ClaimProvenance,
    /// Entity revision the claim was synthesized against.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl SemanticClaim {
    pub fn new(
        entity_id: EntityId,
        text: impl Into<String>,
        provenance: ClaimProvenance,
        revision: u64,
    ) -> Self {
        Self {
            id: ClaimId::generate(),
            entity_id,
            text: text.into(),
            evidence: Vec::new(),
            state: ClaimState::Synthesized,
            provenance,
            revision,
            created_at: Utc::now(),
        }
    }
}

impl PartialEq for SemanticClaim {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SemanticClaim {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_accepts_documented_paths() {
        assert!(ClaimState::Pending.can_transition(ClaimState::Synthesized));
        assert!(ClaimState::Synthesized.can_transition(ClaimState::Validated));
        assert!(ClaimState::Synthesized.can_transition(ClaimState::Quarantined));
        assert!(ClaimState::Validated.can_transition(ClaimState::Stale));
        assert!(ClaimState::Stale.can_transition(ClaimState::Pending));
        assert!(ClaimState::Defeated.can_transition(ClaimState::Stale));
    }

    #[test]
    fn lifecycle_rejects_shortcuts() {
        // No skipping synthesis, no resurrecting quarantined text directly.
        assert!(!ClaimState::Pending.can_transition(ClaimState::Validated));
        assert!(!ClaimState::Quarantined.can_transition(ClaimState::Validated));
        assert!(!ClaimState::Stale.can_transition(ClaimState::Validated));
        assert!(!ClaimState::Validated.can_transition(ClaimState::Pending));
    }

    #[test]
    fn only_validated_claims_are_retrievable() {
        assert!(ClaimState::Validated.is_retrievable());
        assert!(!ClaimState::Quarantined.is_retrievable());
        assert!(!ClaimState::Stale.is_retrievable());
        assert!(!ClaimState::Defeated.is_retrievable());
    }

    #[test]
    fn state_round_trips_through_text() {
        for state in [
            ClaimState::Pending,
            ClaimState::Synthesized,
            ClaimState::Validated,
            ClaimState::Quarantined,
            ClaimState::Stale,
            ClaimState::Defeated,
        ] {
            assert_eq!(ClaimState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ClaimState::parse("bogus"), None);
    }
}
