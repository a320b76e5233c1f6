/// Lore system version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum traversal depth for invalidation graph queries.
pub const MAX_GRAPH_TRAVERSAL_DEPTH: usize = 50;

/// Maximum citations a single claim may carry.
pub const MAX_CITATIONS_PER_CLAIM: usize = 16;

/// Floor on a query token budget; smaller requests are rejected.
pub const MIN_TOKEN_BUDGET: usize = 64;
