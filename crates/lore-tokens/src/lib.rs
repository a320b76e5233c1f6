//! # lore-tokens
//!
//! Accurate token counting via `tiktoken-rs` (`cl100k_base`).
//! Pack token costs are measured, never estimated from string length.
//! Caches counts per content hash so re-rendered packs cost nothing.

pub mod budget;
pub mod counter;

pub use budget::BudgetLedger;
pub use counter::TokenCounter;
