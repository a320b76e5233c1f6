//! Query requests and their fully-disclosed results.

use serde::{Deserialize, Serialize};

use crate::intent::QueryIntent;
use crate::models::pack::{ContextPack, DepthLevel};
use crate::types::QueryId;

/// Optional narrowing constraints on a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueryConstraints {
    /// Anchor the proximity walk and co-change correlation on entities
    /// under these path prefixes, in addition to entities the query
    /// text names.
    #[serde(default)]
    pub seed_paths: Vec<String>,
    /// Hard cap on packs returned, independent of the token budget.
    #[serde(default)]
    pub max_packs: Option<usize>,
}

/// A retrieval request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    /// Caller-declared intent; classified from the text when `None`.
    #[serde(default)]
    pub intent: Option<QueryIntent>,
    #[serde(default)]
    pub depth: DepthLevel,
    #[serde(default)]
    pub constraints: QueryConstraints,
    /// Token budget for the assembled result.
    pub token_budget: usize,
    /// Wall-clock budget; stages that would exceed it are skipped.
    pub time_budget_ms: u64,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>, token_budget: usize, time_budget_ms: u64) -> Self {
        Self {
            query: query.into(),
            intent: None,
            depth: DepthLevel::default(),
            constraints: QueryConstraints::default(),
            token_budget,
            time_budget_ms,
        }
    }

    pub fn with_intent(mut self, intent: QueryIntent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_depth(mut self, depth: DepthLevel) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_seed_paths(mut self, paths: Vec<String>) -> Self {
        self.constraints.seed_paths = paths;
        self
    }
}

/// A retrieval signal that produced nothing, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    /// Signal or stage name, e.g. `"semantic"` or `"extraction"`.
    pub source: String,
    pub reason: String,
}

impl CoverageGap {
    pub fn new(source: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            reason: reason.into(),
        }
    }
}

/// Count of packs per confidence disposition, for result-level disclosure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ConfidenceSummary {
    pub present: usize,
    pub absent_uncalibrated: usize,
    pub absent_no_evidence: usize,
    pub absent_defeated: usize,
}

impl ConfidenceSummary {
    pub fn total(&self) -> usize {
        self.present + self.absent_uncalibrated + self.absent_no_evidence + self.absent_defeated
    }
}

/// Freshness of the result relative to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultFreshness {
    /// Served from the current index revision.
    Current,
    /// Served from cache or while maintenance was in flight.
    PossiblyStale,
}

/// What a query actually returned, including everything it left out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub query_id: QueryId,
    pub packs: Vec<ContextPack>,
    /// Candidates that ranked but did not fit the token budget.
    pub omitted_packs: usize,
    pub confidence_summary: ConfidenceSummary,
    pub coverage_gaps: Vec<CoverageGap>,
    pub latency_ms: u64,
    /// True when the time budget cut retrieval short of its full pipeline.
    pub budget_exceeded: bool,
    /// Index revision the result was computed against.
    pub index_revision: u64,
    pub freshness: ResultFreshness,
}

impl QueryResult {
    /// Recompute the confidence summary from the packs held.
    pub fn summarize_confidence(packs: &[ContextPack]) -> ConfidenceSummary {
        use crate::models::confidence::{AbsentReason, ConfidenceValue};
        let mut summary = ConfidenceSummary::default();
        for pack in packs {
            match &pack.confidence {
                ConfidenceValue::Present { .. } => summary.present += 1,
                ConfidenceValue::Absent { reason } => match reason {
                    AbsentReason::Uncalibrated => summary.absent_uncalibrated += 1,
                    AbsentReason::NoEvidence => summary.absent_no_evidence += 1,
                    AbsentReason::Defeated => summary.absent_defeated += 1,
                },
            }
        }
        summary
    }
}
