//! Renders a ranked candidate into a context pack at a requested depth.
//!
//! Depth controls how much rendered content a pack carries, never which
//! disclosure fields it gets: citations, claim ids, confidence, and
//! defeaters are populated at every depth.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use lore_core::errors::LoreResult;
use lore_core::models::{
    Citation, ContextPack, DepthLevel, Entity, Fact, FactPayload, PackSection,
};
use lore_core::traits::IIndexStore;
use lore_core::types::{ClaimId, PackId};
use lore_graph::DependencyGraph;
use lore_tokens::TokenCounter;

use crate::ranking::RankedCandidate;

/// Builds self-describing packs from ranked candidates.
pub struct PackRenderer {
    store: Arc<dyn IIndexStore>,
    counter: Arc<TokenCounter>,
}

impl PackRenderer {
    pub fn new(store: Arc<dyn IIndexStore>, counter: Arc<TokenCounter>) -> Self {
        Self { store, counter }
    }

    pub fn render(
        &self,
        candidate: &RankedCandidate,
        depth: DepthLevel,
        graph: &DependencyGraph,
    ) -> LoreResult<ContextPack> {
        let entity = &candidate.entity;
        let facts = self.store.facts(&entity.id)?;

        let mut sections = vec![PackSection::new("identity", identity_line(entity))];
        if depth >= DepthLevel::Signatures {
            push_section(&mut sections, "interface", interface_lines(&facts));
        }

        let mut citations: Vec<Citation> = Vec::new();
        let mut claim_ids: Vec<ClaimId> = Vec::new();
        let mut newest_evidence: Option<DateTime<Utc>> = None;
        let mut behavior = Vec::new();
        for claim in &candidate.claims {
            claim_ids.push(claim.id.clone());
            let evidence = self.store.evidence_for_claim(&claim.id)?;
            let spans: Vec<String> = evidence.iter().map(|e| e.citation.span()).collect();
            for record in &evidence {
                if newest_evidence.map_or(true, |t| record.recorded_at > t) {
                    newest_evidence = Some(record.recorded_at);
                }
                if !citations.contains(&record.citation) {
                    citations.push(record.citation.clone());
                }
            }
            if spans.is_empty() {
                behavior.push(format!("- {}", claim.text));
            } else {
                behavior.push(format!("- {} [{}]", claim.text, spans.join("; ")));
            }
        }

        if depth >= DepthLevel::Implementation {
            push_section(&mut sections, "behavior", behavior);
            push_section(&mut sections, "structure", structure_lines(&facts));
        }
        if depth >= DepthLevel::CrossFile {
            let mut lines = dependency_lines(&facts);
            for dependent in graph.dependents_of(&entity.id) {
                lines.push(format!("used by {dependent}"));
            }
            push_section(&mut sections, "dependencies", lines);
        }

        let summary = candidate
            .claims
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_else(|| identity_line(entity));

        let mut invalidation_triggers = vec![entity.id.clone()];
        for dependency in graph.dependencies_of(&entity.id) {
            if !invalidation_triggers.contains(&dependency) {
                invalidation_triggers.push(dependency);
            }
        }

        let token_cost = self.counter.count_pieces(
            std::iter::once(summary.as_str())
                .chain(sections.iter().map(|s| s.title.as_str()))
                .chain(sections.iter().map(|s| s.body.as_str())),
        );

        Ok(ContextPack {
            id: PackId::generate(),
            entity_id: entity.id.clone(),
            summary,
            sections,
            citations,
            claim_ids,
            confidence: candidate.confidence.clone(),
            active_defeaters: candidate.active_defeaters.clone(),
            freshness: newest_evidence.unwrap_or(entity.last_changed),
            invalidation_triggers,
            token_cost,
            depth,
        })
    }
}

fn push_section(sections: &mut Vec<PackSection>, title: &str, lines: Vec<String>) {
    if !lines.is_empty() {
        sections.push(PackSection::new(title, lines.join("\n")));
    }
}

fn identity_line(entity: &Entity) -> String {
    format!(
        "{} `{}` at {}:{}-{}",
        entity.kind.as_str(),
        entity.id,
        entity.location.path,
        entity.location.line_start,
        entity.location.line_end
    )
}

/// Signature, export, and guard facts, one line each.
fn interface_lines(facts: &[Fact]) -> Vec<String> {
    facts
        .iter()
        .filter_map(|fact| match &fact.payload {
            FactPayload::Signature {
                name,
                parameters,
                returns,
            } => Some(match returns {
                Some(ret) => format!("{name}({}) -> {ret}", parameters.join(", ")),
                None => format!("{name}({})", parameters.join(", ")),
            }),
            FactPayload::Export { symbol } => Some(format!("exports {symbol}")),
            FactPayload::Guard { condition, raises } => {
                Some(format!("raises {raises} when {condition}"))
            }
            _ => None,
        })
        .collect()
}

/// Call, doc, and metrics facts for implementation depth.
fn structure_lines(facts: &[Fact]) -> Vec<String> {
    facts
        .iter()
        .filter_map(|fact| match &fact.payload {
            FactPayload::Call { callee } => Some(format!("calls {callee}")),
            FactPayload::Doc { text } => Some(format!("doc: {text}")),
            FactPayload::Metrics { lines, branches } => {
                Some(format!("{lines} lines, {branches} branches"))
            }
            _ => None,
        })
        .collect()
}

fn dependency_lines(facts: &[Fact]) -> Vec<String> {
    facts
        .iter()
        .filter_map(|fact| match &fact.payload {
            FactPayload::Import { source } => Some(format!("imports {source}")),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lore_core::types::{AdapterId, EntityId};

    fn fact(payload: FactPayload) -> Fact {
        Fact::new(EntityId::new("e"), payload, AdapterId::new("test"))
    }

    #[test]
    fn interface_covers_signatures_exports_and_guards() {
        let facts = vec![
            fact(FactPayload::Signature {
                name: "divide".to_string(),
                parameters: vec!["a".to_string(), "b".to_string()],
                returns: Some("float".to_string()),
            }),
            fact(FactPayload::Export {
                symbol: "divide".to_string(),
            }),
            fact(FactPayload::Guard {
                condition: "b == 0".to_string(),
                raises: "ZeroDivisionError".to_string(),
            }),
            fact(FactPayload::Call {
                callee: "log".to_string(),
            }),
        ];
        let lines = interface_lines(&facts);
        assert_eq!(
            lines,
            vec![
                "divide(a, b) -> float",
                "exports divide",
                "raises ZeroDivisionError when b == 0",
            ]
        );
    }

    #[test]
    fn structure_covers_calls_docs_and_metrics() {
        let facts = vec![
            fact(FactPayload::Call {
                callee: "check_non_zero".to_string(),
            }),
            fact(FactPayload::Metrics {
                lines: 9,
                branches: 2,
            }),
            fact(FactPayload::Import {
                source: "math_utils".to_string(),
            }),
        ];
        let lines = structure_lines(&facts);
        assert_eq!(lines, vec!["calls check_non_zero", "9 lines, 2 branches"]);
    }

    #[test]
    fn imports_render_as_dependencies() {
        let facts = vec![fact(FactPayload::Import {
            source: "math_utils".to_string(),
        })];
        assert_eq!(dependency_lines(&facts), vec!["imports math_utils"]);
    }
}
