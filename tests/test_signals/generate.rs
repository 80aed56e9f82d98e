use foldfir::config::FilterSpec;
use foldfir::design::{CoefficientVector, design};
use foldfir::fixed_point::{FixedFormat, FoldedCoefficients, compensate_gain, fold, quantize};
use foldfir::signals::to_fixed;
use foldfir::simulation::white_noise;

/// 11-tap lowpass with cutoff at 0.2 of Nyquist
pub fn scenario_design() -> CoefficientVector {
    let spec = FilterSpec::lowpass(11, 100.0, 100.0, 1000.0);
    design(&spec).expect("11-tap design")
}

/// Quantized to Q8.8 and folded, DC gain as designed
pub fn uncompensated_table() -> FoldedCoefficients {
    fold(&quantize(&scenario_design(), FixedFormat::Q8_8)).expect("fold")
}

/// Quantized to Q8.8, folded and compensated to unity gain
pub fn scenario_table() -> FoldedCoefficients {
    compensate_gain(&uncompensated_table(), 1.0).expect("gain compensation")
}

/// Seeded Gaussian noise as raw data words
pub fn noise_input(len: usize, std_dev: f64, format: FixedFormat, seed: u64) -> Vec<i32> {
    to_fixed(&white_noise(len, std_dev, Some(seed)), format)
}
