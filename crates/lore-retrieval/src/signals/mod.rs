//! The four retrieval signals and the collector that runs them.
//!
//! Every provider is independent: one failing, timing out, or coming
//! back empty is recorded as a coverage gap while the others proceed.
//! The merge downstream never sees an aborted collection.

pub mod co_change;
pub mod lexical;
pub mod proximity;
pub mod semantic;

pub use co_change::CoChangeSignal;
pub use lexical::LexicalSignal;
pub use proximity::ProximitySignal;
pub use semantic::SemanticSignal;

use std::time::Instant;

use tracing::{debug, warn};

use lore_core::errors::{LoreError, RetrievalError};
use lore_core::intent::SignalKind;
use lore_core::models::CoverageGap;
use lore_core::traits::{ISignalProvider, SignalHit, SignalQuery};

use crate::deadline::Deadline;

/// Everything one collection pass produced: per-signal hit lists plus the
/// disclosed gaps for signals that contributed nothing.
#[derive(Debug, Default)]
pub struct SignalOutcome {
    pub hits: Vec<(SignalKind, Vec<SignalHit>)>,
    pub gaps: Vec<CoverageGap>,
    /// True when the query deadline forced at least one provider skip.
    pub cut_short: bool,
}

/// Ordered registry of signal providers.
pub struct SignalSet {
    providers: Vec<(SignalKind, Box<dyn ISignalProvider>)>,
    /// Per-provider wall-clock limit; an overrun drops the signal and
    /// records a gap.
    timeout_ms: u64,
}

impl SignalSet {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            providers: Vec::new(),
            timeout_ms,
        }
    }

    pub fn register(&mut self, kind: SignalKind, provider: Box<dyn ISignalProvider>) {
        self.providers.push((kind, provider));
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Run every registered provider for up to `k` hits each.
    ///
    /// Providers run in registration order. Once the query deadline has
    /// expired, remaining providers are skipped and disclosed rather than
    /// run late; a provider that returns but overran its own timeout is
    /// treated as missing, so its latency never buys it a ranking voice.
    pub fn collect(&self, query: &SignalQuery, k: usize, deadline: &Deadline) -> SignalOutcome {
        let mut outcome = SignalOutcome::default();

        for (kind, provider) in &self.providers {
            let name = provider.name();
            if deadline.expired() {
                outcome
                    .gaps
                    .push(CoverageGap::new(name, "skipped: query time budget exhausted"));
                outcome.cut_short = true;
                continue;
            }

            let started = Instant::now();
            match provider.retrieve(query, k) {
                Err(err) => {
                    warn!(signal = name, error = %err, "signal provider failed");
                    outcome.gaps.push(CoverageGap::new(name, gap_reason(&err)));
                }
                Ok(hits) if hits.is_empty() => {
                    debug!(signal = name, "signal returned no candidates");
                    outcome
                        .gaps
                        .push(CoverageGap::new(name, "returned no candidates"));
                }
                Ok(hits) => {
                    let elapsed = started.elapsed().as_millis() as u64;
                    if elapsed > self.timeout_ms {
                        warn!(signal = name, elapsed_ms = elapsed, "signal overran its timeout");
                        outcome.gaps.push(CoverageGap::new(
                            name,
                            format!("timed out after {elapsed}ms (limit {}ms)", self.timeout_ms),
                        ));
                    } else {
                        debug!(signal = name, hits = hits.len(), elapsed_ms = elapsed, "signal ok");
                        outcome.hits.push((*kind, hits));
                    }
                }
            }
        }

        outcome
    }
}

/// Gap text for a failed provider. Signal failures already carry the
/// provider name in their variant, so only the reason is repeated.
fn gap_reason(err: &LoreError) -> String {
    match err {
        LoreError::Retrieval(RetrievalError::SignalFailed { reason, .. }) => reason.clone(),
        other => other.to_string(),
    }
}
