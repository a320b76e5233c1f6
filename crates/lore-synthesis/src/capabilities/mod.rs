//! Built-in synthesis capabilities.
//!
//! `identity` and `contract` are pure functions over structural facts;
//! their claims carry hash-verifiable citations and need no calibration
//! to report confidence. `semantic` wraps the external provider and is
//! the only capability that can fail closed.

pub mod contract;
pub mod identity;
pub mod semantic;

pub use contract::ContractCapability;
pub use identity::IdentityCapability;
pub use semantic::SemanticCapability;
