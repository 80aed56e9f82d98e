pub mod config;
pub mod constants;
pub mod design;
pub mod engine;
pub mod error;
pub mod fixed_point;
pub mod pipeline;
pub mod signals;
pub mod validation;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use config::PipelineConfig;
pub use error::{FirError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
