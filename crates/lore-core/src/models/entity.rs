//! Code entities: the stable identities facts and claims attach to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// The syntactic category of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    File,
    Module,
    Function,
    Method,
    Struct,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::File => "file",
            EntityKind::Module => "module",
            EntityKind::Function => "function",
            EntityKind::Method => "method",
            EntityKind::Struct => "struct",
        }
    }
}

/// Where in the source tree an entity lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub path: String,
    pub line_start: u32,
    pub line_end: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<String>, line_start: u32, line_end: u32) -> Self {
        Self {
            path: path.into(),
            line_start,
            line_end,
        }
    }

    /// Whether two locations overlap in the same file.
    pub fn overlaps(&self, other: &SourceLocation) -> bool {
        self.path == other.path
            && self.line_start <= other.line_end
            && other.line_start <= self.line_end
    }
}

/// How often an entity's content has historically changed.
///
/// Classification is observational: every entity starts `Volatile` and is
/// promoted as change sessions accumulate without touching it. Promotion
/// thresholds live in `StoreConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Durability {
    /// Never observed to change since first seen.
    Immutable,
    /// Changes rarely; survived the stable threshold of sessions unchanged.
    Stable,
    /// Changed recently or too young to classify otherwise.
    #[default]
    Volatile,
}

impl Durability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Durability::Immutable => "immutable",
            Durability::Stable => "stable",
            Durability::Volatile => "volatile",
        }
    }
}

/// A code entity tracked by the index.
///
/// `content_hash` is blake3 over the entity's source text and is the sole
/// admission criterion: identical hash means no recompute anywhere
/// downstream. `revision` counts content changes observed for this entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub location: SourceLocation,
    pub content_hash: String,
    pub durability: Durability,
    pub revision: u64,
    pub first_seen: DateTime<Utc>,
    pub last_changed: DateTime<Utc>,
}

impl Entity {
    pub fn new(
        id: EntityId,
        kind: EntityKind,
        location: SourceLocation,
        content_hash: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            kind,
            location,
            content_hash: content_hash.into(),
            durability: Durability::Volatile,
            revision: 1,
            first_seen: now,
            last_changed: now,
        }
    }
}

/// Entities compare by identity, not by content or timestamps.
impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Entity {}

/// Hash source text the way the store does on admission.
pub fn hash_content(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
