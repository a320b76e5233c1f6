use crate::errors::LoreResult;

/// Source of file content for extraction and maintenance passes.
///
/// Abstracted so tests can serve content from memory and hosts can plug
/// in workspace snapshots instead of direct filesystem reads.
pub trait IContentSource: Send + Sync {
    /// Read the full content of a file, or `None` if it no longer exists.
    fn read(&self, path: &str) -> LoreResult<Option<String>>;
}
