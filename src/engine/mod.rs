mod accumulator;
mod filter;
mod folded;
mod reference;

pub use accumulator::{AccumulatorSpec, derive_guard_bits};
pub use filter::SampleFilter;
pub use folded::{EngineState, FoldedFirEngine, OverflowFault, OverflowStage};
pub use reference::{DirectFormFir, FirFilterCore};
