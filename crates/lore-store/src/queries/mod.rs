//! SQL query modules, one per table family. All functions take a plain
//! `&Connection` so they compose inside transactions.

pub mod claim_ops;
pub mod embedding_ops;
pub mod entity_ops;
pub mod evidence_ops;
pub mod fact_ops;
pub mod ledger_ops;
pub mod maintenance;
pub mod pack_ops;
pub mod session_ops;
