//! # lore-feedback
//!
//! Agent feedback over served packs. Outcomes enter the system only as
//! ledger events: the ingestor resolves each pack to the claims behind
//! it, appends outcome evidence, and escalates failures to defeaters.
//! No code path here writes a confidence number.

pub mod ingestor;

pub use ingestor::FeedbackIngestor;
