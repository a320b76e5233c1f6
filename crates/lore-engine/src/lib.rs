//! The host-facing facade over the whole index.
//!
//! One [`LoreEngine`] wires storage, the dependency graph, the
//! epistemics ledger, synthesis, retrieval, and feedback behind five
//! calls. Hosts note changes as they happen (`notify_change`), run
//! maintenance when it suits them (`run_maintenance`), and in between
//! serve queries from the latest committed revision or a
//! trigger-indexed pack cache. Agent outcomes flow back through
//! `submit_feedback`; `begin_session` advances change history.

pub mod change_queue;
pub mod engine;
pub mod observability;
pub mod pack_cache;
pub mod report;

pub use change_queue::ChangeQueue;
pub use engine::LoreEngine;
pub use observability::init_tracing;
pub use pack_cache::{fingerprint, PackCache};
pub use report::{ExtractionGap, MaintenanceReport};
