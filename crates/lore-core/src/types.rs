//! Typed identifier newtypes.
//!
//! Each id wraps a `String` to prevent cross-type confusion: a `FactId`
//! cannot be passed where a `ClaimId` is expected. Ids cross the SQLite
//! boundary as text, so they stay strings rather than interned symbols.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing raw id.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Generate a fresh random id (uuid v4).
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// The raw string form.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_id!(
    /// Identifier of a code entity (file, module, function).
    /// Deterministic: `path` for files, `path::symbol` for members.
    EntityId
);

define_id!(
    /// Identifier of a structural fact. Deterministic per (entity, payload).
    FactId
);

define_id!(
    /// Identifier of a synthesized semantic claim.
    ClaimId
);

define_id!(
    /// Identifier of an append-only evidence record.
    EvidenceId
);

define_id!(
    /// Identifier of a defeater.
    DefeaterId
);

define_id!(
    /// Identifier of an assembled context pack.
    PackId
);

define_id!(
    /// Identifier of a served query, used to route feedback.
    QueryId
);

define_id!(
    /// Identifier of an extraction adapter implementation.
    AdapterId
);

impl EntityId {
    /// Build the deterministic id for a symbol inside a source file.
    pub fn for_symbol(path: &str, symbol: &str) -> Self {
        Self(format!("{path}::{symbol}"))
    }

    /// Build the deterministic id for a whole source file.
    pub fn for_file(path: &str) -> Self {
        Self(path.to_string())
    }
}
