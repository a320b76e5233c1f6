//! Per-intent fusion weights for the retrieval signals.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::taxonomy::QueryIntent;

/// The four retrieval signals that feed fusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Semantic,
    Proximity,
    CoChange,
    Lexical,
}

impl SignalKind {
    pub const ALL: [SignalKind; 4] = [
        Self::Semantic,
        Self::Proximity,
        Self::CoChange,
        Self::Lexical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Semantic => "semantic",
            Self::Proximity => "proximity",
            Self::CoChange => "co_change",
            Self::Lexical => "lexical",
        }
    }
}

/// Fusion weights for one intent. Weights are relative, not required to
/// sum to 1.0; normalization happens per provider before fusion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalWeights {
    pub semantic: f64,
    pub proximity: f64,
    pub co_change: f64,
    pub lexical: f64,
}

impl SignalWeights {
    pub fn get(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Semantic => self.semantic,
            SignalKind::Proximity => self.proximity,
            SignalKind::CoChange => self.co_change,
            SignalKind::Lexical => self.lexical,
        }
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            semantic: 1.0,
            proximity: 1.0,
            co_change: 1.0,
            lexical: 1.0,
        }
    }
}

/// Default fusion profile for an intent.
///
/// Debugging leans on co-change (what broke together before breaks together
/// again) and proximity; navigation leans on lexical match.
pub fn default_weights(intent: QueryIntent) -> SignalWeights {
    match intent {
        QueryIntent::Debug => SignalWeights {
            semantic: 1.0,
            proximity: 1.5,
            co_change: 2.0,
            lexical: 1.0,
        },
        QueryIntent::Implement => SignalWeights {
            semantic: 2.0,
            proximity: 1.0,
            co_change: 1.0,
            lexical: 1.5,
        },
        QueryIntent::Refactor => SignalWeights {
            semantic: 1.0,
            proximity: 2.0,
            co_change: 1.5,
            lexical: 1.0,
        },
        QueryIntent::Review => SignalWeights {
            semantic: 1.0,
            proximity: 1.5,
            co_change: 2.0,
            lexical: 1.0,
        },
        QueryIntent::Navigate => SignalWeights {
            semantic: 1.0,
            proximity: 1.5,
            co_change: 1.0,
            lexical: 2.0,
        },
        QueryIntent::Understand => SignalWeights {
            semantic: 2.0,
            proximity: 1.5,
            co_change: 1.0,
            lexical: 1.0,
        },
    }
}

/// Load weight overrides from a flat config table.
/// Keys are `"intent:signal"`, values are replacement weights.
pub fn load_weight_overrides(
    overrides: &HashMap<String, f64>,
) -> HashMap<(QueryIntent, SignalKind), f64> {
    let mut map = HashMap::new();
    for (key, &value) in overrides {
        if let Some((intent_str, signal_str)) = key.split_once(':') {
            if let (Ok(intent), Ok(signal)) = (
                serde_json::from_str::<QueryIntent>(&format!("\"{intent_str}\"")),
                serde_json::from_str::<SignalKind>(&format!("\"{signal_str}\"")),
            ) {
                map.insert((intent, signal), value);
            }
        }
    }
    map
}

/// Resolve the effective weights for an intent after overrides.
pub fn effective_weights(
    intent: QueryIntent,
    overrides: &HashMap<(QueryIntent, SignalKind), f64>,
) -> SignalWeights {
    let mut weights = default_weights(intent);
    for kind in SignalKind::ALL {
        if let Some(&value) = overrides.get(&(intent, kind)) {
            match kind {
                SignalKind::Semantic => weights.semantic = value,
                SignalKind::Proximity => weights.proximity = value,
                SignalKind::CoChange => weights.co_change = value,
                SignalKind::Lexical => weights.lexical = value,
            }
        }
    }
    weights
}
