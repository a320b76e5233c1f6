//! In-memory content source for engine tests.

use std::collections::HashMap;
use std::sync::Mutex;

use lore_core::errors::LoreResult;
use lore_core::traits::IContentSource;

use crate::corpus::CorpusFile;

/// Serves file content from a mutable map, so tests can edit and delete
/// sources without touching the filesystem.
pub struct MemorySource {
    files: Mutex<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
        }
    }

    /// Seed the source with a corpus scenario.
    pub fn from_files(files: &[CorpusFile]) -> Self {
        let map = files
            .iter()
            .map(|file| (file.path.clone(), file.content.clone()))
            .collect();
        Self {
            files: Mutex::new(map),
        }
    }

    /// Create or replace a file.
    pub fn set(&self, path: &str, content: &str) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_string());
    }

    /// Delete a file; later reads return `None`.
    pub fn remove(&self, path: &str) {
        self.files.lock().unwrap().remove(path);
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemorySource {
    fn default() -> Self {
        Self::new()
    }
}

impl IContentSource for MemorySource {
    fn read(&self, path: &str) -> LoreResult<Option<String>> {
        Ok(self.files.lock().unwrap().get(path).cloned())
    }
}
