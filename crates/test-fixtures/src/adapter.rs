//! Deterministic Python extraction built on line regexes.
//!
//! Coverage is deliberately narrow: top-level functions, imports, and
//! the doc/guard/call/metric shapes the corpus scenarios use. Multi-line
//! headers and nested definitions are out of scope; a header the def
//! regex cannot read fails the whole file. Identical content always
//! yields identical entity ids, fact ids, and content hashes, which is
//! what incremental admission keys on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::LazyLock;

use regex::Regex;

use lore_core::errors::{ExtractError, LoreResult};
use lore_core::models::{hash_content, Entity, EntityKind, Fact, FactPayload, SourceLocation};
use lore_core::traits::{ExtractedEntity, IExtractionAdapter};
use lore_core::types::{AdapterId, EntityId};

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*(?:->\s*([^:]+))?:").unwrap()
});
static IMPORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:import|from)\s+([A-Za-z_][A-Za-z0-9_.]*)").unwrap());
static IF_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*if\s+(.+?):\s*$").unwrap());
static RAISE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*raise\s+([A-Za-z_][A-Za-z0-9_]*)").unwrap());
static CALL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_.]*)\s*\(").unwrap());
static BRANCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:if|elif|for|while)\b").unwrap());
static DOC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*"{3}(.*?)"{3}\s*$"#).unwrap());

/// Call targets that are syntax or builtins, never edges.
const NON_CALLEES: &[&str] = &[
    "if", "elif", "while", "for", "return", "print", "len", "range", "isinstance", "float",
    "int", "str",
];

struct DefHead {
    line: usize,
    name: String,
    params: String,
    returns: Option<String>,
}

/// Line-regex extraction for Python sources.
pub struct PyRegexAdapter;

impl IExtractionAdapter for PyRegexAdapter {
    fn adapter_id(&self) -> AdapterId {
        AdapterId::new("py-regex")
    }

    fn handles(&self, path: &str) -> bool {
        path.ends_with(".py")
    }

    fn extract(&self, path: &str, content: &str) -> LoreResult<Vec<ExtractedEntity>> {
        let lines: Vec<&str> = content.lines().collect();

        let mut heads: Vec<DefHead> = Vec::new();
        for (idx, line) in lines.iter().enumerate() {
            if !line.starts_with("def ") {
                continue;
            }
            let Some(caps) = DEF_RE.captures(line) else {
                return Err(ExtractError::ParseFailed {
                    path: path.to_string(),
                    reason: format!("malformed def at line {}", idx + 1),
                }
                .into());
            };
            heads.push(DefHead {
                line: idx,
                name: caps[1].to_string(),
                params: caps[2].to_string(),
                returns: caps.get(3).map(|m| m.as_str().trim().to_string()),
            });
        }

        let mut extracted = Vec::new();

        // The file itself carries imports and exports.
        let file_entity = Entity::new(
            EntityId::for_file(path),
            EntityKind::File,
            SourceLocation::new(path, 1, lines.len().max(1) as u32),
            hash_content(content),
        );
        let mut file_facts = Vec::new();
        for line in &lines {
            if let Some(caps) = IMPORT_RE.captures(line) {
                file_facts.push(Fact::new(
                    file_entity.id.clone(),
                    FactPayload::Import {
                        source: caps[1].to_string(),
                    },
                    self.adapter_id(),
                ));
            }
        }
        for head in &heads {
            file_facts.push(Fact::new(
                file_entity.id.clone(),
                FactPayload::Export {
                    symbol: head.name.clone(),
                },
                self.adapter_id(),
            ));
        }
        extracted.push(ExtractedEntity {
            entity: file_entity,
            facts: file_facts,
        });

        for (pos, head) in heads.iter().enumerate() {
            let stop = heads.get(pos + 1).map_or(lines.len(), |next| next.line);
            let end = last_code_line(&lines, head.line, stop);
            let body = &lines[head.line..=end];
            let entity = Entity::new(
                EntityId::for_symbol(path, &head.name),
                EntityKind::Function,
                SourceLocation::new(path, head.line as u32 + 1, end as u32 + 1),
                hash_content(&body.join("\n")),
            );
            let facts = function_facts(&entity, head, body);
            extracted.push(ExtractedEntity { entity, facts });
        }

        Ok(extracted)
    }
}

fn function_facts(entity: &Entity, head: &DefHead, body: &[&str]) -> Vec<Fact> {
    let adapter = AdapterId::new("py-regex");
    let mut facts = vec![Fact::new(
        entity.id.clone(),
        FactPayload::Signature {
            name: head.name.clone(),
            parameters: parameters(&head.params),
            returns: head.returns.clone(),
        },
        adapter.clone(),
    )];

    if let Some(caps) = body.get(1).and_then(|line| DOC_RE.captures(line)) {
        facts.push(Fact::new(
            entity.id.clone(),
            FactPayload::Doc {
                text: caps[1].trim().to_string(),
            },
            adapter.clone(),
        ));
    }

    // Guards: an if directly followed by a raise.
    for window in body.windows(2) {
        if let (Some(cond), Some(err)) = (IF_RE.captures(window[0]), RAISE_RE.captures(window[1]))
        {
            facts.push(Fact::new(
                entity.id.clone(),
                FactPayload::Guard {
                    condition: cond[1].trim().to_string(),
                    raises: err[1].to_string(),
                },
                adapter.clone(),
            ));
        }
    }

    // Calls, deduped in first-seen order. The header and raise lines are
    // skipped so signatures and error classes never read as calls.
    let mut seen: Vec<String> = Vec::new();
    for line in body.iter().skip(1) {
        if RAISE_RE.is_match(line) {
            continue;
        }
        for caps in CALL_RE.captures_iter(line) {
            let callee = caps[1].to_string();
            let bare = callee.rsplit('.').next().unwrap_or(&callee);
            if NON_CALLEES.contains(&bare) || seen.contains(&callee) {
                continue;
            }
            seen.push(callee);
        }
    }
    for callee in seen {
        facts.push(Fact::new(
            entity.id.clone(),
            FactPayload::Call { callee },
            adapter.clone(),
        ));
    }

    let branches = body.iter().filter(|l| BRANCH_RE.is_match(l)).count();
    facts.push(Fact::new(
        entity.id.clone(),
        FactPayload::Metrics {
            lines: body.len() as u32,
            branches: branches as u32,
        },
        adapter,
    ));

    facts
}

/// Last non-empty line in `[start, stop)`: spans exclude the blank
/// separators before the next definition.
fn last_code_line(lines: &[&str], start: usize, stop: usize) -> usize {
    (start..stop)
        .rev()
        .find(|&i| !lines[i].trim().is_empty())
        .unwrap_or(start)
}

/// Parameter names with annotations and defaults stripped.
fn parameters(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| {
            p.split(':')
                .next()
                .unwrap_or(p)
                .split('=')
                .next()
                .unwrap_or(p)
                .trim()
                .to_string()
        })
        .filter(|p| !p.is_empty() && p.as_str() != "self")
        .collect()
}

/// Wraps an adapter and counts `extract` calls, for coalescing tests.
pub struct CountingAdapter<A> {
    inner: A,
    calls: AtomicUsize,
}

impl<A> CountingAdapter<A> {
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<A: IExtractionAdapter> IExtractionAdapter for CountingAdapter<A> {
    fn adapter_id(&self) -> AdapterId {
        self.inner.adapter_id()
    }

    fn handles(&self, path: &str) -> bool {
        self.inner.handles(path)
    }

    fn extract(&self, path: &str, content: &str) -> LoreResult<Vec<ExtractedEntity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.extract(path, content)
    }
}
