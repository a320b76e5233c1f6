//! Corpus scenarios: small source trees tests can index end to end.

use std::fs;
use std::path::Path;

use crate::fixtures_root;

/// One source file of a scenario, with the path the indexer sees.
#[derive(Debug, Clone)]
pub struct CorpusFile {
    pub path: String,
    pub content: String,
}

/// All files of a corpus scenario, sorted by path.
///
/// # Panics
/// Panics when the scenario directory is missing or empty.
pub fn scenario(name: &str) -> Vec<CorpusFile> {
    let root = fixtures_root().join("corpus").join(name);
    let mut files = Vec::new();
    collect(&root, &root, &mut files);
    files.sort_by(|a, b| a.path.cmp(&b.path));
    assert!(!files.is_empty(), "corpus scenario {name} is empty or missing");
    files
}

/// One file of a scenario by its in-corpus path.
///
/// # Panics
/// Panics when the scenario has no file at `path`.
pub fn scenario_file(name: &str, path: &str) -> CorpusFile {
    scenario(name)
        .into_iter()
        .find(|f| f.path == path)
        .unwrap_or_else(|| panic!("no file {path} in corpus scenario {name}"))
}

fn collect(root: &Path, dir: &Path, out: &mut Vec<CorpusFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let full = entry.path();
        if full.is_dir() {
            collect(root, &full, out);
        } else if let Ok(content) = fs::read_to_string(&full) {
            let rel = full.strip_prefix(root).unwrap_or(&full);
            let path = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            out.push(CorpusFile { path, content });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calculator_scenario_lists_its_sources_sorted() {
        let files = scenario("calculator");
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["src/api.py", "src/calculator.py", "src/math_utils.py"]
        );
    }

    #[test]
    fn scenario_file_returns_content() {
        let file = scenario_file("calculator", "src/calculator.py");
        assert!(file.content.contains("def divide"));
        assert!(file.content.contains("import math_utils"));
    }
}
