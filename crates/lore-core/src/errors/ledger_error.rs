/// Epistemics ledger errors.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid claim transition: {from} -> {to} for claim {claim_id}")]
    InvalidClaimTransition {
        claim_id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("unknown claim: {claim_id}")]
    UnknownClaim { claim_id: String },

    #[error("event batch too large: {size} events, max {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("calibration refit failed: {reason}")]
    CalibrationFailed { reason: String },

    #[error("event replay failed at sequence {sequence}: {reason}")]
    ReplayFailed { sequence: u64, reason: String },
}
