//! Pack assembly: rendering ranked candidates and filling the token budget.

pub mod packer;
pub mod renderer;

pub use packer::{AssemblyOutcome, PackAssembler};
pub use renderer::PackRenderer;
