//! Full-text signal over claim and fact text.

use std::sync::Arc;

use lore_core::errors::{LoreResult, RetrievalError};
use lore_core::traits::{IIndexStore, ISignalProvider, SignalHit, SignalQuery};

use crate::seeds::query_tokens;

/// Upper bound on terms forwarded to the FTS index; queries rarely carry
/// more useful words than this.
const MAX_TERMS: usize = 12;

/// Ranks text matches via the store's FTS index (bm25 relevance).
pub struct LexicalSignal {
    store: Arc<dyn IIndexStore>,
}

impl LexicalSignal {
    pub fn new(store: Arc<dyn IIndexStore>) -> Self {
        Self { store }
    }
}

impl ISignalProvider for LexicalSignal {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn retrieve(&self, query: &SignalQuery, k: usize) -> LoreResult<Vec<SignalHit>> {
        let match_expr = fts_match_expr(&query.text);
        if match_expr.is_empty() {
            return Err(RetrievalError::SignalFailed {
                signal: "lexical".to_string(),
                reason: "no searchable terms in query".to_string(),
            }
            .into());
        }

        let hits = self
            .store
            .search_text(&match_expr, k)?
            .into_iter()
            .map(|(claim_id, entity_id, score)| SignalHit {
                entity_id,
                claim_id,
                score,
            })
            .collect();
        Ok(hits)
    }
}

/// Turn free text into an FTS5 MATCH expression. Terms are quoted so
/// user words can never be parsed as query syntax, then OR-joined: any
/// matching term qualifies a row and bm25 orders by how many.
fn fts_match_expr(text: &str) -> String {
    let terms: Vec<String> = query_tokens(text)
        .into_iter()
        .take(MAX_TERMS)
        .map(|t| format!("\"{t}\""))
        .collect();
    terms.join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terms_are_quoted_and_or_joined() {
        let expr = fts_match_expr("what does divide do and what errors can it throw?");
        assert_eq!(expr, "\"divide\" OR \"errors\" OR \"throw\"");
    }

    #[test]
    fn syntax_words_cannot_escape_quoting() {
        // NEAR is FTS5 syntax; quoting keeps it a plain term.
        let expr = fts_match_expr("near miss");
        assert_eq!(expr, "\"miss\" OR \"near\"");
    }

    #[test]
    fn all_stopwords_yield_an_empty_expression() {
        assert!(fts_match_expr("what does the and").is_empty());
    }
}
