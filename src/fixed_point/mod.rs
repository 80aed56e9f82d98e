mod format;
mod quantizer;
pub mod table;

pub use format::{FixedFormat, OverflowPolicy, fits_signed};
pub use quantizer::{
    FoldedCoefficients, QuantizedCoefficients, compensate_gain, fold, quantize,
};
