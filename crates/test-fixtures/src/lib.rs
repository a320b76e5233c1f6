//! Fixture corpus and deterministic providers for integration tests.
//!
//! The corpus scenarios under `fixtures/corpus/` are tiny source trees
//! the regex adapter can index end to end; the providers here stand in
//! for external synthesis and embedding services with fully scripted,
//! reproducible behavior.

pub mod adapter;
pub mod corpus;
pub mod providers;
pub mod source;

pub use adapter::{CountingAdapter, PyRegexAdapter};
pub use corpus::{scenario, scenario_file, CorpusFile};
pub use providers::{claim_citing, claim_citing_nothing, HashEmbedder, ScriptedSynthesis};
pub use source::MemorySource;

use std::path::PathBuf;

/// Workspace `fixtures/` directory, found by walking up from the
/// running crate's manifest.
///
/// # Panics
/// Panics when no `fixtures/` directory exists on the way up.
pub fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("fixtures").exists() {
        if !path.pop() {
            panic!("no fixtures directory above CARGO_MANIFEST_DIR={manifest_dir}");
        }
    }
    path.join("fixtures")
}
