//! Provider-backed semantic capability.

use std::sync::Arc;

use lore_core::constants::MAX_CITATIONS_PER_CLAIM;
use lore_core::errors::{LoreError, LoreResult, SynthesisError};
use lore_core::models::{Entity, ExtractionMethod, Fact};
use lore_core::traits::{ISynthesisProvider, SynthesisBudget};

use crate::draft::{ClaimDraft, SynthesisCapability};

/// Wraps the external synthesis provider. The only capability that can
/// be unavailable, and the only one whose drafts need full citation
/// validation: provider output is untrusted until every cited hash
/// resolves against the store.
pub struct SemanticCapability {
    provider: Arc<dyn ISynthesisProvider>,
}

impl SemanticCapability {
    pub fn new(provider: Arc<dyn ISynthesisProvider>) -> Self {
        Self { provider }
    }
}

impl SynthesisCapability for SemanticCapability {
    fn name(&self) -> &str {
        self.provider.name()
    }

    fn is_available(&self) -> bool {
        self.provider.is_available()
    }

    fn derive(
        &self,
        entity: &Entity,
        facts: &[Fact],
        budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>> {
        if !self.provider.is_available() {
            return Err(LoreError::Synthesis(SynthesisError::ProviderUnavailable {
                provider: self.provider.name().to_string(),
                reason: "provider reports itself unavailable".to_string(),
            }));
        }

        let claims = self.provider.synthesize(entity, facts, budget)?;
        let mut drafts = Vec::with_capacity(claims.len());
        for claim in claims {
            if claim.text.trim().is_empty() {
                return Err(LoreError::Synthesis(SynthesisError::MalformedResponse {
                    reason: "provider returned a claim with empty text".to_string(),
                }));
            }
            if claim.citations.is_empty() {
                return Err(LoreError::Synthesis(SynthesisError::MalformedResponse {
                    reason: format!(
                        "provider claim carries no citations: {:?}",
                        truncate(&claim.text)
                    ),
                }));
            }
            if claim.citations.len() > MAX_CITATIONS_PER_CLAIM {
                return Err(LoreError::Synthesis(SynthesisError::MalformedResponse {
                    reason: format!(
                        "provider claim carries {} citations, cap is {MAX_CITATIONS_PER_CLAIM}",
                        claim.citations.len()
                    ),
                }));
            }
            drafts.push(ClaimDraft {
                text: claim.text,
                citations: claim.citations,
                capability: self.provider.name().to_string(),
                model: claim.model,
                method: ExtractionMethod::Synthesis,
            });
        }
        Ok(drafts)
    }
}

fn truncate(text: &str) -> &str {
    let cut = text
        .char_indices()
        .nth(60)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..cut]
}
