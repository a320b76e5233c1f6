use serde::{Deserialize, Serialize};

/// What a consumer is trying to do with the answer.
///
/// Intent steers signal fusion weights, not correctness: every intent sees
/// the same candidates, weighted differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryIntent {
    /// Find why something fails.
    Debug,
    /// Add or extend functionality.
    Implement,
    /// Restructure without behavior change.
    Refactor,
    /// Evaluate a change against its surroundings.
    Review,
    /// Locate where something lives.
    Navigate,
    /// Explain what code does and why.
    Understand,
}

impl QueryIntent {
    /// Total number of intent types.
    pub const COUNT: usize = 6;

    /// All variants for iteration.
    pub const ALL: [QueryIntent; 6] = [
        Self::Debug,
        Self::Implement,
        Self::Refactor,
        Self::Review,
        Self::Navigate,
        Self::Understand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Implement => "implement",
            Self::Refactor => "refactor",
            Self::Review => "review",
            Self::Navigate => "navigate",
            Self::Understand => "understand",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "debug" => Some(Self::Debug),
            "implement" => Some(Self::Implement),
            "refactor" => Some(Self::Refactor),
            "review" => Some(Self::Review),
            "navigate" => Some(Self::Navigate),
            "understand" => Some(Self::Understand),
            _ => None,
        }
    }
}
