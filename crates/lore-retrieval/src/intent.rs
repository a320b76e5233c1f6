//! Keyword-based intent classification for queries without a declared
//! intent.

use lore_core::intent::QueryIntent;

/// Keyword patterns mapped to intents. Matching scores each intent by the
/// number of keywords found; highest count wins.
const INTENT_KEYWORDS: &[(QueryIntent, &[&str])] = &[
    (
        QueryIntent::Debug,
        &[
            "fix", "bug", "error", "crash", "broken", "failing", "debug", "throw", "exception",
            "panic", "wrong",
        ],
    ),
    (
        QueryIntent::Implement,
        &["add", "implement", "build", "create", "extend", "support", "new feature"],
    ),
    (
        QueryIntent::Refactor,
        &["refactor", "restructure", "simplify", "extract", "rename", "clean up", "split"],
    ),
    (
        QueryIntent::Review,
        &["review", "evaluate", "check", "audit", "consistent", "impact"],
    ),
    (
        QueryIntent::Navigate,
        &["where", "locate", "find", "defined", "which file", "path"],
    ),
    (
        QueryIntent::Understand,
        &["what", "how", "why", "explain", "understand", "describe", "purpose"],
    ),
];

/// Classify a query's intent from its text.
///
/// Ties go to the earlier entry in the table, so action verbs beat the
/// broad `Understand` keywords. A query matching nothing defaults to
/// `Understand`, the most weight-neutral profile.
pub fn classify_intent(query: &str) -> QueryIntent {
    let lowered = query.to_lowercase();

    let mut best = QueryIntent::Understand;
    let mut best_score = 0usize;
    for &(intent, keywords) in INTENT_KEYWORDS {
        let score = keywords.iter().filter(|kw| lowered.contains(**kw)).count();
        if score > best_score {
            best_score = score;
            best = intent;
        }
    }
    best
}
