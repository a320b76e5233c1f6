use std::sync::Arc;

use moka::sync::Cache;
use tiktoken_rs::CoreBPE;

const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Token counter wrapping tiktoken's cl100k_base tokenizer.
/// Counts are cached per blake3 content hash: identical section text is
/// tokenized once no matter how many packs render it.
pub struct TokenCounter {
    bpe: Arc<CoreBPE>,
    cache: Cache<String, usize>,
}

impl TokenCounter {
    /// Create a new TokenCounter with the given cache capacity.
    pub fn new(cache_capacity: u64) -> Self {
        let bpe = tiktoken_rs::cl100k_base().expect("failed to load cl100k_base tokenizer");
        Self {
            bpe: Arc::new(bpe),
            cache: Cache::new(cache_capacity),
        }
    }

    /// Count tokens in the given text (uncached).
    pub fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Count tokens with blake3 content-hash caching.
    pub fn count_cached(&self, text: &str) -> usize {
        let hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        self.cache.get_with(hash, || self.count(text))
    }

    /// Total cost of several pieces rendered together.
    pub fn count_pieces<'a>(&self, pieces: impl IntoIterator<Item = &'a str>) -> usize {
        pieces.into_iter().map(|p| self.count_cached(p)).sum()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
