//! Agent-reported outcomes for served packs.

use serde::{Deserialize, Serialize};

/// What happened after an agent acted on a pack.
///
/// Outcomes reach confidence only through the ledger: they become
/// outcome events, and periodically a calibration refit. There is no
/// direct score adjustment path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackOutcome {
    /// Acting on the pack produced a verified correct result.
    Worked,
    /// Acting on the pack led to a verified failure.
    Failed,
    /// The pack did not bear on the task; no evidence either way.
    Irrelevant,
}

impl FeedbackOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackOutcome::Worked => "worked",
            FeedbackOutcome::Failed => "failed",
            FeedbackOutcome::Irrelevant => "irrelevant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "worked" => Some(FeedbackOutcome::Worked),
            "failed" => Some(FeedbackOutcome::Failed),
            "irrelevant" => Some(FeedbackOutcome::Irrelevant),
            _ => None,
        }
    }
}
