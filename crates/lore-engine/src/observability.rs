//! Process-wide tracing setup.
//!
//! Every engine constructor calls [`init_tracing`]; initialization runs
//! once per process and later calls are no-ops, so hosts embedding
//! several engines never fight over the global subscriber.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lore_core::config::ObservabilityConfig;

static INIT: Once = Once::new();

/// Initialize tracing from the configured level and format.
///
/// `LORE_LOG` overrides the configured level with the usual env-filter
/// syntax, e.g. `LORE_LOG=lore_engine=debug,lore_store=warn`.
pub fn init_tracing(config: &ObservabilityConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("LORE_LOG")
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
        let layer = fmt::layer().with_target(true);
        // try_init: the host process may already own the global subscriber.
        if config.json_logs {
            let _ = tracing_subscriber::registry()
                .with(layer.json())
                .with(filter)
                .try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(layer)
                .with(filter)
                .try_init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_initialization_is_a_no_op() {
        let config = ObservabilityConfig::default();
        init_tracing(&config);
        init_tracing(&config);
    }
}
