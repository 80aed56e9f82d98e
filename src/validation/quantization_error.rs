use rolling_stats::Stats;
use serde::Serialize;

use crate::design::CoefficientVector;
use crate::error::Result;
use crate::fixed_point::{FixedFormat, quantize};

/// Coefficient quantization error at one word width
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidthError {
    pub bits: u32,
    pub format: FixedFormat,
    pub max_abs_error: f64,
    pub mean_abs_error: f64,
    pub std_dev_abs_error: f64,
    pub mse: f64,
}

/// Format used when characterizing a `bits`-wide word: half the bits
/// fractional, the rest integer (sign included)
pub fn characterization_format(bits: u32) -> Result<FixedFormat> {
    FixedFormat::new(bits, bits / 2)
}

/// Quantize the design at each width and summarize the per-tap error
///
/// # Errors
/// `FirError::InvalidFormat` for a width that is not a valid word size.
pub fn characterize_bit_widths(
    coeffs: &CoefficientVector,
    widths: &[u32],
) -> Result<Vec<WidthError>> {
    widths
        .iter()
        .map(|&bits| {
            let format = characterization_format(bits)?;
            let quantized = quantize(coeffs, format);

            let mut abs_stats: Stats<f64> = Stats::new();
            for e in quantized.error() {
                abs_stats.update(e.abs());
            }

            let summary = WidthError {
                bits,
                format,
                max_abs_error: abs_stats.max,
                mean_abs_error: abs_stats.mean,
                std_dev_abs_error: abs_stats.std_dev,
                mse: quantized.mean_squared_error(),
            };
            log::debug!(
                "{}-bit ({}): max |e| {:.3e}, mean |e| {:.3e}, MSE {:.3e}",
                bits,
                format,
                summary.max_abs_error,
                summary.mean_abs_error,
                summary.mse
            );
            Ok(summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeffs() -> CoefficientVector {
        CoefficientVector::new(vec![-0.0371, 0.0123, 0.1457, 0.2829, 0.3601, 0.2829, 0.1457, 0.0123, -0.0371])
            .unwrap()
    }

    #[test]
    fn test_characterization_format() {
        assert_eq!(characterization_format(16).unwrap(), FixedFormat::Q8_8);
        let f = characterization_format(12).unwrap();
        assert_eq!((f.int_bits(), f.frac_bits()), (6, 6));
        assert!(characterization_format(0).is_err());
    }

    #[test]
    fn test_error_bounded_by_half_lsb() {
        let results = characterize_bit_widths(&coeffs(), &[8, 12, 16]).unwrap();
        assert_eq!(results.len(), 3);
        for r in &results {
            assert!(
                r.max_abs_error <= r.format.lsb() / 2.0 + 1e-15,
                "{}-bit max error {}",
                r.bits,
                r.max_abs_error
            );
            assert!(r.mean_abs_error <= r.max_abs_error);
        }
    }

    #[test]
    fn test_error_shrinks_with_width() {
        let results = characterize_bit_widths(&coeffs(), &[8, 12, 16, 24]).unwrap();
        for pair in results.windows(2) {
            assert!(pair[1].mse <= pair[0].mse, "{:?}", pair);
        }
    }
}
