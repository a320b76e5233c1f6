//! Calibrated confidence values.
//!
//! Confidence is never a bare default. A value is either `Present` with a
//! recorded basis, or `Absent` with a machine-readable reason. Consumers
//! must branch on the variant; there is no numeric fallback to reach for.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a present confidence value can be trusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ConfidenceBasis {
    /// Backed by hash-verified structural facts; deterministic coverage.
    DirectEvidence { verified_citations: u32 },
    /// Read off a fitted calibration curve.
    Calibrated {
        cohort_size: u32,
        fitted_at: DateTime<Utc>,
    },
    /// Aggregated from member claim confidences.
    Aggregated { claim_count: u32 },
}

/// Why no confidence value can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentReason {
    /// No calibration curve covers this claim's cohort yet.
    Uncalibrated,
    /// The claim has no verifiable evidence behind it.
    NoEvidence,
    /// An active defeater forces absence.
    Defeated,
}

impl AbsentReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbsentReason::Uncalibrated => "uncalibrated",
            AbsentReason::NoEvidence => "no_evidence",
            AbsentReason::Defeated => "defeated",
        }
    }
}

/// A confidence score, or an honest refusal to produce one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfidenceValue {
    Present { value: f64, basis: ConfidenceBasis },
    Absent { reason: AbsentReason },
}

impl ConfidenceValue {
    /// A present value, clamped into `[0.0, 1.0]`.
    pub fn present(value: f64, basis: ConfidenceBasis) -> Self {
        ConfidenceValue::Present {
            value: value.clamp(0.0, 1.0),
            basis,
        }
    }

    pub fn absent(reason: AbsentReason) -> Self {
        ConfidenceValue::Absent { reason }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ConfidenceValue::Present { .. })
    }

    /// The numeric value, if one exists. Callers that need a number for
    /// ranking must handle `None` explicitly.
    pub fn value(&self) -> Option<f64> {
        match self {
            ConfidenceValue::Present { value, .. } => Some(*value),
            ConfidenceValue::Absent { .. } => None,
        }
    }

    /// Apply a defeater cap. Absence stays absent; a present value is
    /// lowered to `cap` when it exceeds it, keeping its basis.
    pub fn capped(self, cap: f64) -> Self {
        match self {
            ConfidenceValue::Present { value, basis } => ConfidenceValue::Present {
                value: value.min(cap.clamp(0.0, 1.0)),
                basis,
            },
            absent => absent,
        }
    }
}

impl fmt::Display for ConfidenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceValue::Present { value, .. } => write!(f, "{value:.3}"),
            ConfidenceValue::Absent { reason } => write!(f, "absent({})", reason.as_str()),
        }
    }
}

/// How member confidences combine into a pack confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationStrategy {
    /// Geometric mean: one weak member drags the whole pack down.
    #[default]
    GeometricMean,
    /// The weakest member's value, for consumers that want a floor.
    Minimum,
}

/// Combine member confidences. Absence is infectious: if any member is
/// absent, the aggregate is absent with that member's reason.
pub fn aggregate(values: &[ConfidenceValue], strategy: AggregationStrategy) -> ConfidenceValue {
    if values.is_empty() {
        return ConfidenceValue::absent(AbsentReason::NoEvidence);
    }
    let mut numbers = Vec::with_capacity(values.len());
    for v in values {
        match v {
            ConfidenceValue::Present { value, .. } => numbers.push(*value),
            ConfidenceValue::Absent { reason } => {
                return ConfidenceValue::absent(*reason);
            }
        }
    }
    let combined = match strategy {
        AggregationStrategy::GeometricMean => {
            let log_sum: f64 = numbers.iter().map(|v| v.max(f64::MIN_POSITIVE).ln()).sum();
            (log_sum / numbers.len() as f64).exp()
        }
        AggregationStrategy::Minimum => numbers.iter().copied().fold(1.0_f64, f64::min),
    };
    ConfidenceValue::present(
        combined,
        ConfidenceBasis::Aggregated {
            claim_count: numbers.len() as u32,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn present(value: f64) -> ConfidenceValue {
        ConfidenceValue::present(value, ConfidenceBasis::DirectEvidence { verified_citations: 1 })
    }

    #[test]
    fn present_values_are_clamped() {
        assert_eq!(present(1.7).value(), Some(1.0));
        assert_eq!(present(-0.3).value(), Some(0.0));
    }

    #[test]
    fn cap_lowers_but_never_raises() {
        let v = present(0.9).capped(0.4);
        assert_eq!(v.value(), Some(0.4));
        let v = present(0.2).capped(0.4);
        assert_eq!(v.value(), Some(0.2));
    }

    #[test]
    fn cap_leaves_absence_alone() {
        let v = ConfidenceValue::absent(AbsentReason::Uncalibrated).capped(0.4);
        assert_eq!(v, ConfidenceValue::absent(AbsentReason::Uncalibrated));
    }

    #[test]
    fn geometric_mean_sits_between_min_and_max() {
        let values = [present(0.9), present(0.6), present(0.8)];
        let agg = aggregate(&values, AggregationStrategy::GeometricMean);
        let v = agg.value().expect("present");
        assert!(v > 0.6 && v < 0.9);
    }

    #[test]
    fn minimum_strategy_takes_the_floor() {
        let values = [present(0.9), present(0.6), present(0.8)];
        let agg = aggregate(&values, AggregationStrategy::Minimum);
        assert!((agg.value().expect("present") - 0.6).abs() < 1e-9);
    }

    #[test]
    fn absence_is_infectious() {
        let values = [present(0.9), ConfidenceValue::absent(AbsentReason::Uncalibrated)];
        let agg = aggregate(&values, AggregationStrategy::GeometricMean);
        assert_eq!(agg, ConfidenceValue::absent(AbsentReason::Uncalibrated));
    }

    #[test]
    fn empty_aggregate_is_absent_for_lack_of_evidence() {
        let agg = aggregate(&[], AggregationStrategy::GeometricMean);
        assert_eq!(agg, ConfidenceValue::absent(AbsentReason::NoEvidence));
    }

    #[test]
    fn display_shows_number_or_reason() {
        assert_eq!(present(0.8252).to_string(), "0.825");
        assert_eq!(
            ConfidenceValue::absent(AbsentReason::Uncalibrated).to_string(),
            "absent(uncalibrated)"
        );
    }
}
