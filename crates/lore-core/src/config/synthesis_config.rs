use serde::{Deserialize, Serialize};

use super::defaults;

/// Synthesis subsystem configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Token ceiling per provider call.
    pub max_tokens: usize,
    /// Wall-clock ceiling per provider call in milliseconds.
    pub wall_clock_ms: u64,
    /// Entries in the synthesis result cache (keyed by content hash).
    pub cache_size: u64,
    /// Prompt template version recorded in claim provenance.
    pub prompt_version: String,
    /// Retry quarantined claims on the next invalidation pass.
    pub retry_quarantined: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            max_tokens: defaults::DEFAULT_SYNTHESIS_MAX_TOKENS,
            wall_clock_ms: defaults::DEFAULT_SYNTHESIS_WALL_CLOCK_MS,
            cache_size: defaults::DEFAULT_SYNTHESIS_CACHE_SIZE,
            prompt_version: defaults::DEFAULT_PROMPT_VERSION.to_string(),
            retry_quarantined: defaults::DEFAULT_RETRY_QUARANTINED,
        }
    }
}
