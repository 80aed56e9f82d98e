mod metrics;
mod quantization_error;
mod report;
mod response;
mod spectrum;
mod sweep;
mod vectors;

pub use metrics::{ComparisonResult, ErrorMetrics, ValidationMismatch, compare, evaluate};
pub use quantization_error::{WidthError, characterization_format, characterize_bit_widths};
pub use report::{ValidationReport, report};
pub use response::{ResponseError, ResponseVerdict, frequency_response, magnitude_db, response_error};
pub use spectrum::{SpectrumBin, peak_in_band, spectrum};
pub use sweep::{
    PointScores, SweepMismatch, SweepOutcome, SweepParameter, SweepPoint, SweepReport,
    SweepStimulus, sweep,
};
pub use vectors::{TestVector, TestVectorSet, generate_test_vectors};
