//! Identity capability: what an entity is, from its own metadata.

use lore_core::errors::LoreResult;
use lore_core::models::{Citation, Entity, ExtractionMethod, Fact, FactPayload};
use lore_core::traits::SynthesisBudget;

use crate::draft::{ClaimDraft, SynthesisCapability};

/// Derives a single claim describing what the entity is: its kind, where
/// it lives, and what it imports, exports, and calls. Pure over the
/// entity and its facts; the citation pins the entity's own span at its
/// current content hash.
pub struct IdentityCapability;

impl SynthesisCapability for IdentityCapability {
    fn name(&self) -> &str {
        "identity"
    }

    fn derive(
        &self,
        entity: &Entity,
        facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>> {
        let mut text = format!(
            "`{}` is a {} in {}",
            symbol_name(entity),
            entity.kind.as_str(),
            entity.location.path
        );

        let imports = collect(facts, |p| match p {
            FactPayload::Import { source } => Some(source.as_str()),
            _ => None,
        });
        if !imports.is_empty() {
            text.push_str(&format!(" importing {}", imports.join(", ")));
        }
        text.push('.');

        let exports = collect(facts, |p| match p {
            FactPayload::Export { symbol } => Some(symbol.as_str()),
            _ => None,
        });
        if !exports.is_empty() {
            text.push_str(&format!(" It exports {}.", exports.join(", ")));
        }

        let calls = collect(facts, |p| match p {
            FactPayload::Call { callee } => Some(callee.as_str()),
            _ => None,
        });
        if !calls.is_empty() {
            text.push_str(&format!(" It calls {}.", calls.join(", ")));
        }

        if let Some(doc) = facts.iter().find_map(|f| match &f.payload {
            FactPayload::Doc { text } => Some(text.as_str()),
            _ => None,
        }) {
            text.push_str(&format!(" Documented as: {}", doc.trim()));
        }

        let citation = Citation::new(
            entity.location.path.clone(),
            entity.location.line_start,
            entity.location.line_end,
            entity.content_hash.clone(),
        );

        Ok(vec![ClaimDraft {
            text,
            citations: vec![citation],
            capability: self.name().to_string(),
            model: "deterministic".to_string(),
            method: ExtractionMethod::StructuralFact,
        }])
    }
}

/// Last id segment: the symbol for members, the path for files.
fn symbol_name(entity: &Entity) -> &str {
    entity
        .id
        .as_str()
        .rsplit("::")
        .next()
        .unwrap_or_else(|| entity.id.as_str())
}

fn collect<'a>(facts: &'a [Fact], pick: impl Fn(&'a FactPayload) -> Option<&'a str>) -> Vec<&'a str> {
    facts.iter().filter_map(|f| pick(&f.payload)).collect()
}
