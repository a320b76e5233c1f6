use serde::{Deserialize, Serialize};

use super::defaults;

/// Retrieval subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default token budget when the request omits one.
    pub default_token_budget: usize,
    /// Default wall-clock budget when the request omits one.
    pub default_time_budget_ms: u64,
    /// Candidates requested from each signal provider.
    pub signal_top_k: usize,
    /// Per-provider timeout; a slower provider becomes a coverage gap.
    pub signal_timeout_ms: u64,
    /// Hard cap on packs per result.
    pub max_packs: usize,
    /// Fraction of the token budget the last pack may overshoot.
    pub budget_slack: f64,
    /// Score decay per hop in the graph proximity walk.
    pub proximity_decay: f64,
    /// Maximum hops in the graph proximity walk.
    pub proximity_max_hops: usize,
    /// Path to intent weights TOML override file.
    pub intent_weights_path: Option<String>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_token_budget: defaults::DEFAULT_TOKEN_BUDGET,
            default_time_budget_ms: defaults::DEFAULT_TIME_BUDGET_MS,
            signal_top_k: defaults::DEFAULT_SIGNAL_TOP_K,
            signal_timeout_ms: defaults::DEFAULT_SIGNAL_TIMEOUT_MS,
            max_packs: defaults::DEFAULT_MAX_PACKS,
            budget_slack: defaults::DEFAULT_BUDGET_SLACK,
            proximity_decay: defaults::DEFAULT_PROXIMITY_DECAY,
            proximity_max_hops: defaults::DEFAULT_PROXIMITY_MAX_HOPS,
            intent_weights_path: None,
        }
    }
}
