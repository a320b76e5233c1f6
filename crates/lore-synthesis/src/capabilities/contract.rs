//! Contract capability: callable interface and error behavior.

use lore_core::errors::LoreResult;
use lore_core::models::{Citation, Entity, ExtractionMethod, Fact, FactPayload};
use lore_core::traits::SynthesisBudget;

use crate::draft::{ClaimDraft, SynthesisCapability};

/// Derives one claim per entity covering its signature and guard
/// conditions: what it takes, what it returns, and which errors it
/// raises under which conditions. Produces nothing for entities without
/// signature or guard facts. Each contributing fact is cited at the
/// entity span under the fact's own content hash.
pub struct ContractCapability;

impl SynthesisCapability for ContractCapability {
    fn name(&self) -> &str {
        "contract"
    }

    fn derive(
        &self,
        entity: &Entity,
        facts: &[Fact],
        _budget: &SynthesisBudget,
    ) -> LoreResult<Vec<ClaimDraft>> {
        let mut parts = Vec::new();
        let mut citations = Vec::new();

        for fact in facts {
            let rendered = match &fact.payload {
                FactPayload::Signature {
                    name,
                    parameters,
                    returns,
                } => Some(render_signature(name, parameters, returns.as_deref())),
                FactPayload::Guard { condition, raises } => {
                    Some(format!("raises {raises} when {condition}"))
                }
                _ => None,
            };
            if let Some(rendered) = rendered {
                parts.push(rendered);
                citations.push(Citation::new(
                    entity.location.path.clone(),
                    entity.location.line_start,
                    entity.location.line_end,
                    fact.content_hash.clone(),
                ));
            }
        }

        if parts.is_empty() {
            return Ok(Vec::new());
        }

        let mut text = parts.join("; ");
        text.push('.');

        Ok(vec![ClaimDraft {
            text,
            citations,
            capability: self.name().to_string(),
            model: "deterministic".to_string(),
            method: ExtractionMethod::StructuralFact,
        }])
    }
}

fn render_signature(name: &str, parameters: &[String], returns: Option<&str>) -> String {
    let params = parameters.join(", ");
    match returns {
        Some(returns) => format!("`{name}({params})` returns {returns}"),
        None => format!("`{name}({params})` returns nothing"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::models::{hash_content, EntityKind, SourceLocation};
    use lore_core::types::{AdapterId, EntityId};

    fn budget() -> SynthesisBudget {
        SynthesisBudget {
            max_tokens: 1024,
            wall_clock_ms: 1_000,
        }
    }

    fn divide_entity() -> Entity {
        Entity::new(
            EntityId::for_symbol("src/calculator.py", "divide"),
            EntityKind::Function,
            SourceLocation::new("src/calculator.py", 12, 20),
            hash_content("def divide(a, b): ..."),
        )
    }

    fn divide_facts(entity: &Entity) -> Vec<Fact> {
        vec![
            Fact::new(
                entity.id.clone(),
                FactPayload::Signature {
                    name: "divide".to_string(),
                    parameters: vec!["a".to_string(), "b".to_string()],
                    returns: Some("float".to_string()),
                },
                AdapterId::new("py-regex"),
            ),
            Fact::new(
                entity.id.clone(),
                FactPayload::Guard {
                    condition: "b == 0".to_string(),
                    raises: "ZeroDivisionError".to_string(),
                },
                AdapterId::new("py-regex"),
            ),
        ]
    }

    #[test]
    fn renders_signature_and_guard_into_one_claim() {
        let entity = divide_entity();
        let facts = divide_facts(&entity);
        let drafts = ContractCapability
            .derive(&entity, &facts, &budget())
            .expect("derive");
        assert_eq!(drafts.len(), 1);
        assert_eq!(
            drafts[0].text,
            "`divide(a, b)` returns float; raises ZeroDivisionError when b == 0."
        );
    }

    #[test]
    fn cites_each_contributing_fact_by_its_hash() {
        let entity = divide_entity();
        let facts = divide_facts(&entity);
        let drafts = ContractCapability
            .derive(&entity, &facts, &budget())
            .expect("derive");
        let hashes: Vec<&str> = drafts[0]
            .citations
            .iter()
            .map(|c| c.content_hash.as_str())
            .collect();
        assert_eq!(hashes, vec![&facts[0].content_hash, &facts[1].content_hash]);
    }

    #[test]
    fn entities_without_contract_facts_produce_nothing() {
        let entity = divide_entity();
        let doc_only = vec![Fact::new(
            entity.id.clone(),
            FactPayload::Doc {
                text: "Divides a by b.".to_string(),
            },
            AdapterId::new("py-regex"),
        )];
        let drafts = ContractCapability
            .derive(&entity, &doc_only, &budget())
            .expect("derive");
        assert!(drafts.is_empty());
    }

    #[test]
    fn signature_without_return_type_reads_naturally() {
        assert_eq!(
            render_signature("reset", &[], None),
            "`reset()` returns nothing"
        );
    }
}
