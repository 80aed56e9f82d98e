use serde::Serialize;

use crate::config::ValidationConfig;
use crate::constants::RESPONSE_POINTS;
use crate::design::CoefficientVector;
use crate::engine::{FirFilterCore, FoldedFirEngine, OverflowFault, SampleFilter};
use crate::error::{FirError, Result};
use crate::fixed_point::FixedFormat;
use crate::signals::{from_fixed, to_fixed};
use crate::validation::{
    ComparisonResult, ErrorMetrics, ResponseError, WidthError, characterize_bit_widths, compare,
    evaluate, response_error,
};

/// Everything measured for one design-to-engine run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub taps: usize,
    pub coefficient_format: FixedFormat,
    pub data_format: FixedFormat,
    pub accumulator_bits: u32,
    pub guard_bits: u32,
    /// DC gain of the floating design
    pub dc_gain: f64,
    /// DC gain of the compensated fixed-point table
    pub fixed_dc_gain: f64,
    /// Engine output vs. the floating design's output, warm-up skipped
    pub output: ErrorMetrics,
    /// Engine output vs. a floating convolution with the engine's own
    /// dequantized table, in output LSBs
    pub implementation: ComparisonResult,
    /// Magnitude response of the table vs. the design
    pub response: ResponseError,
    pub bit_widths: Vec<WidthError>,
    pub faults: Vec<OverflowFault>,
}

impl ValidationReport {
    /// No mismatches beyond tolerance and no simulation overflows
    pub fn passed(&self) -> bool {
        self.implementation.passed() && self.faults.is_empty()
    }
}

/// Run a freshly reset copy of `engine` over `stimulus` and measure it
/// against the floating design it was built from
///
/// # Errors
/// `FirError::Config` if the stimulus is no longer than the filter, or an
/// invalid width in `validation.bit_widths`.
pub fn report(
    coeffs: &CoefficientVector,
    engine: &FoldedFirEngine,
    stimulus: &[f64],
    validation: &ValidationConfig,
) -> Result<ValidationReport> {
    let taps = coeffs.num_taps();
    if stimulus.len() <= taps {
        return Err(FirError::Config(format!(
            "stimulus of {} samples is too short for a {}-tap filter",
            stimulus.len(),
            taps
        )));
    }

    let data_format = engine.data_format();
    let table = engine.coefficients();
    let input_raw = to_fixed(stimulus, data_format);

    let mut dut = engine.clone();
    dut.reset();
    dut.take_faults();
    let fixed_out = from_fixed(&dut.run(&input_raw), data_format);
    let faults = dut.take_faults();

    let warm = taps - 1;
    let float_out = FirFilterCore::new(coeffs.taps().to_vec()).filter(stimulus);
    let output = evaluate(&float_out[warm..], &fixed_out[warm..])?;

    let implemented: Vec<f64> = table
        .unfold()
        .iter()
        .map(|&c| table.format().to_real(c as i64))
        .collect();
    let scaled_out =
        FirFilterCore::new(implemented.clone()).filter(&from_fixed(&input_raw, data_format));
    let implementation = compare(
        &scaled_out,
        &fixed_out,
        validation.tolerance_lsb * data_format.lsb(),
    );
    if !implementation.passed() {
        log::warn!(
            "{} engine samples differ from the scaled reference by more than {} LSB",
            implementation.mismatches.len(),
            validation.tolerance_lsb
        );
    }

    let response = response_error(coeffs.taps(), &implemented, RESPONSE_POINTS);
    let bit_widths = characterize_bit_widths(coeffs, &validation.bit_widths)?;
    let accumulator = engine.accumulator();

    log::info!(
        "Validation: SNR {:.2} dB, MSE {:.3e}, response {:?} (max {:.4}), {} faults",
        output.snr_db,
        output.mse,
        response.verdict,
        response.max_error,
        faults.len()
    );

    Ok(ValidationReport {
        taps,
        coefficient_format: table.format(),
        data_format,
        accumulator_bits: accumulator.width(),
        guard_bits: accumulator.guard_bits,
        dc_gain: coeffs.dc_gain(),
        fixed_dc_gain: table.dc_gain(),
        output,
        implementation,
        response,
        bit_widths,
        faults,
    })
}
