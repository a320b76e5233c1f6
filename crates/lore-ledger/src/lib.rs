//! # lore-ledger
//!
//! The epistemics ledger: an append-only event log over the shared store,
//! a confidence view derived by replaying that log, and the calibration
//! pipeline that turns accumulated outcomes into a fitted curve.
//!
//! Confidence is never stored as a number. Every value handed out is
//! computed on demand from the view, and a claim with no fitted curve
//! behind it reports `absent(uncalibrated)` rather than a placeholder.

pub mod calibration;
pub mod confidence;
pub mod events;
pub mod ledger;
pub mod view;

pub use calibration::{CalibrationCurve, CalibrationSample, GLOBAL_COHORT};
pub use confidence::{compute_confidence, raw_score};
pub use events::{LedgerEvent, LedgerEventKind};
pub use ledger::EpistemicsLedger;
pub use view::{ActiveDefeater, ClaimLedgerState, ConfidenceView};
