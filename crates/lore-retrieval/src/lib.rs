//! # lore-retrieval
//!
//! Turns a query into ranked, token-budgeted context packs.
//!
//! The pipeline is staged: seed resolution → four independent signal
//! providers → per-provider normalization and weighted fusion → ranking
//! against the epistemics ledger → span deduplication → greedy pack
//! assembly under a token budget. A provider that fails, times out, or
//! comes back empty becomes a disclosed coverage gap; it never aborts
//! the merge. Truncation is never silent: whatever the budget refuses
//! is counted in `omitted_packs`.

pub mod assembly;
pub mod deadline;
pub mod engine;
pub mod fusion;
pub mod intent;
pub mod ranking;
pub mod seeds;
pub mod signals;

pub use assembly::{AssemblyOutcome, PackAssembler, PackRenderer};
pub use deadline::Deadline;
pub use engine::RetrievalEngine;
pub use fusion::{fuse, FusedCandidate};
pub use intent::classify_intent;
pub use ranking::{RankWeights, RankedCandidate, RankingPipeline};
pub use signals::{SignalOutcome, SignalSet};
