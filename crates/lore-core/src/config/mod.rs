//! Layered configuration: TOML file over defaults, every field optional.

pub mod defaults;
pub mod ledger_config;
pub mod observability_config;
pub mod retrieval_config;
pub mod scheduler_config;
pub mod store_config;
pub mod synthesis_config;

pub use ledger_config::LedgerConfig;
pub use observability_config::ObservabilityConfig;
pub use retrieval_config::RetrievalConfig;
pub use scheduler_config::SchedulerConfig;
pub use store_config::StoreConfig;
pub use synthesis_config::SynthesisConfig;

use serde::{Deserialize, Serialize};

use crate::errors::{LoreError, LoreResult};

/// Top-level configuration, one section per subsystem.
///
/// Any subset of fields may appear in the TOML; missing sections and
/// fields fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoreConfig {
    pub store: StoreConfig,
    pub retrieval: RetrievalConfig,
    pub synthesis: SynthesisConfig,
    pub ledger: LedgerConfig,
    pub scheduler: SchedulerConfig,
    pub observability: ObservabilityConfig,
}

impl LoreConfig {
    /// Parse a TOML document, applying defaults for anything absent.
    pub fn from_toml(toml_str: &str) -> LoreResult<Self> {
        toml::from_str(toml_str).map_err(|e| LoreError::Config {
            reason: e.to_string(),
        })
    }

    /// Load from a file path.
    pub fn from_path(path: &std::path::Path) -> LoreResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }
}
