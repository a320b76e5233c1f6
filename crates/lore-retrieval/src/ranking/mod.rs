//! Ranking: fused candidates scored against the ledger, then span-deduplicated.

pub mod dedup;
pub mod scorer;

pub use dedup::dedup_overlapping;
pub use scorer::{RankWeights, RankedCandidate, RankingPipeline};
