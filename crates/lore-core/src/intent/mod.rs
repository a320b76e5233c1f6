//! Query intent taxonomy and per-intent signal weighting.

pub mod taxonomy;
pub mod weights;

pub use taxonomy::QueryIntent;
pub use weights::{
    default_weights, effective_weights, load_weight_overrides, SignalKind, SignalWeights,
};
