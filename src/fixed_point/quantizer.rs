use crate::constants::MIN_DC_GAIN;
use crate::design::CoefficientVector;
use crate::error::{FirError, Result};
use crate::fixed_point::FixedFormat;

/// Full-length coefficient vector in a fixed-point format
///
/// Keeps the signed per-tap error `coefficient - dequantized` alongside the
/// raw words.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedCoefficients {
    format: FixedFormat,
    raw: Vec<i32>,
    error: Vec<f64>,
}

impl QuantizedCoefficients {
    pub fn format(&self) -> FixedFormat {
        self.format
    }

    pub fn raw(&self) -> &[i32] {
        &self.raw
    }

    /// Signed quantization error per tap
    pub fn error(&self) -> &[f64] {
        &self.error
    }

    pub fn num_taps(&self) -> usize {
        self.raw.len()
    }

    pub fn dequantized(&self) -> Vec<f64> {
        self.raw
            .iter()
            .map(|&r| self.format.to_real(r as i64))
            .collect()
    }

    /// Mean squared quantization error over all taps
    pub fn mean_squared_error(&self) -> f64 {
        if self.error.is_empty() {
            return 0.0;
        }
        self.error.iter().map(|e| e * e).sum::<f64>() / self.error.len() as f64
    }
}

/// Quantize every tap to the nearest value representable in `format`
///
/// Rounding is to nearest with ties to even; values beyond the signed range
/// saturate. Quantizing an already-quantized vector is the identity.
pub fn quantize(coeffs: &CoefficientVector, format: FixedFormat) -> QuantizedCoefficients {
    let mut raw = Vec::with_capacity(coeffs.num_taps());
    let mut error = Vec::with_capacity(coeffs.num_taps());
    let mut saturated = 0usize;

    for &c in coeffs.taps() {
        let (r, clipped) = format.to_raw(c);
        if clipped {
            saturated += 1;
        }
        raw.push(r);
        error.push(c - format.to_real(r as i64));
    }

    if saturated > 0 {
        log::warn!(
            "{} of {} coefficients saturated in {}",
            saturated,
            coeffs.num_taps(),
            format
        );
    }

    QuantizedCoefficients { format, raw, error }
}

/// Folded coefficient table handed to the streaming engine
///
/// Stores `H = (T+1)/2` raw words. Entry `i < H-1` is shared by taps `i` and
/// `T-1-i`; entry `H-1` is the center tap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldedCoefficients {
    format: FixedFormat,
    values: Vec<i32>,
}

impl FoldedCoefficients {
    /// Build a table from raw words, center tap last
    pub fn from_raw(format: FixedFormat, values: Vec<i32>) -> Result<Self> {
        if values.len() < 2 {
            return Err(FirError::InvalidTaps(
                (2 * values.len()).saturating_sub(1),
            ));
        }
        if let Some(tap) = values.iter().position(|&v| !format.contains(v as i128)) {
            return Err(FirError::QuantizationOverflow {
                tap,
                value: values[tap] as i64,
                min: format.min_raw(),
                max: format.max_raw(),
            });
        }
        Ok(Self { format, values })
    }

    pub fn format(&self) -> FixedFormat {
        self.format
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }

    /// Number of table entries, `H`
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tap count of the unfolded filter, `2H - 1`
    pub fn num_taps(&self) -> usize {
        2 * self.values.len() - 1
    }

    pub fn center_index(&self) -> usize {
        self.values.len() - 1
    }

    /// Multiplicity of entry `i` in the unfolded filter
    pub fn weight(&self, i: usize) -> i64 {
        if i == self.center_index() { 1 } else { 2 }
    }

    /// Weighted raw sum, the DC gain in LSBs
    pub fn weighted_sum_raw(&self) -> i64 {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.weight(i) * v as i64)
            .sum()
    }

    /// Weighted sum of absolute raw values, the worst-case gain in LSBs
    pub fn weighted_abs_sum_raw(&self) -> i64 {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| self.weight(i) * (v as i64).abs())
            .sum()
    }

    /// DC gain of the dequantized table
    pub fn dc_gain(&self) -> f64 {
        self.format.to_real(self.weighted_sum_raw())
    }

    pub fn dequantized(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|&v| self.format.to_real(v as i64))
            .collect()
    }

    /// Rebuild the full symmetric raw vector of `2H - 1` taps
    pub fn unfold(&self) -> Vec<i32> {
        let mut taps = self.values.clone();
        taps.extend(self.values.iter().rev().skip(1));
        taps
    }
}

/// Keep one word per mirrored pair plus the center tap
///
/// # Errors
/// `FirError::InvalidTaps` for even lengths, `FirError::Asymmetric` if a
/// mirrored pair differs.
pub fn fold(quantized: &QuantizedCoefficients) -> Result<FoldedCoefficients> {
    let raw = quantized.raw();
    let n = raw.len();
    if n < 3 || n.is_multiple_of(2) {
        return Err(FirError::InvalidTaps(n));
    }
    if let Some(i) = (0..n / 2).find(|&i| raw[i] != raw[n - 1 - i]) {
        return Err(FirError::Asymmetric(i));
    }
    let half = n.div_ceil(2);
    FoldedCoefficients::from_raw(quantized.format(), raw[..half].to_vec())
}

/// Rescale a folded table so its weighted sum reaches `target_gain`
///
/// Every entry is scaled by `target / current` and re-rounded (ties to
/// even); the remaining difference between the weighted raw sum and
/// `round(target * 2^F)` is absorbed by the center tap, so the result is
/// exact to one LSB of the format.
///
/// # Errors
/// - `FirError::Config` if `target_gain` is not finite
/// - `FirError::ZeroGain` if the table's DC gain is zero
/// - `FirError::QuantizationOverflow` if any adjusted word leaves the signed
///   range; widen the format or reduce the order
pub fn compensate_gain(folded: &FoldedCoefficients, target_gain: f64) -> Result<FoldedCoefficients> {
    if !target_gain.is_finite() {
        return Err(FirError::Config(format!(
            "target gain must be finite, got {}",
            target_gain
        )));
    }
    let format = folded.format();
    let current = folded.dc_gain();
    if current.abs() < MIN_DC_GAIN {
        return Err(FirError::ZeroGain);
    }
    let ratio = target_gain / current;

    let overflow = |tap: usize, value: i64| FirError::QuantizationOverflow {
        tap,
        value,
        min: format.min_raw(),
        max: format.max_raw(),
    };

    let mut scaled: Vec<i64> = Vec::with_capacity(folded.len());
    for (i, &v) in folded.values().iter().enumerate() {
        let value = (v as f64 * ratio).round_ties_even();
        if !format.contains(value as i128) {
            return Err(overflow(i, value as i64));
        }
        scaled.push(value as i64);
    }

    let target_raw = (target_gain * format.scale()).round_ties_even() as i64;
    let center = folded.center_index();
    let sum: i64 = scaled
        .iter()
        .enumerate()
        .map(|(i, &v)| folded.weight(i) * v)
        .sum();
    scaled[center] += target_raw - sum;
    if !format.contains(scaled[center] as i128) {
        return Err(overflow(center, scaled[center]));
    }

    let values: Vec<i32> = scaled.into_iter().map(|v| v as i32).collect();
    let compensated = FoldedCoefficients::from_raw(format, values)?;
    log::info!(
        "Gain compensation: {:.6} -> {:.6} (ratio {:.6})",
        current,
        compensated.dc_gain(),
        ratio
    );
    Ok(compensated)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coeffs(taps: &[f64]) -> CoefficientVector {
        CoefficientVector::new(taps.to_vec()).unwrap()
    }

    #[test]
    fn test_quantize_records_error() {
        let c = coeffs(&[0.1, 0.3, 0.1]);
        let q = quantize(&c, FixedFormat::Q8_8);
        assert_eq!(q.raw(), &[26, 77, 26]);
        assert!((q.error()[0] - (0.1 - 26.0 / 256.0)).abs() < 1e-15);
        assert!(q.error().iter().all(|e| e.abs() <= 0.5 / 256.0));
    }

    #[test]
    fn test_quantize_is_idempotent() {
        let c = coeffs(&[-0.0371, 0.1234, 0.4567, 0.1234, -0.0371]);
        let format: FixedFormat = "q2.10".parse().unwrap();
        let once = quantize(&c, format);
        let again = quantize(&coeffs(&once.dequantized()), format);
        assert_eq!(once.raw(), again.raw());
        assert!(again.error().iter().all(|&e| e == 0.0));
    }

    #[test]
    fn test_quantize_saturates() {
        let c = coeffs(&[2.0, 1.0, 2.0]);
        let format: FixedFormat = "q1.7".parse().unwrap();
        let q = quantize(&c, format);
        assert_eq!(q.raw(), &[127, 127, 127]);
    }

    #[test]
    fn test_fold_keeps_half_plus_center() {
        let c = coeffs(&[0.01, 0.05, 0.1, 0.2, 0.3, 0.2, 0.1, 0.05, 0.01]);
        let folded = fold(&quantize(&c, FixedFormat::Q8_8)).unwrap();
        assert_eq!(folded.len(), 5);
        assert_eq!(folded.num_taps(), 9);
        assert_eq!(folded.center_index(), 4);
        assert_eq!(folded.values()[4], 77);
        assert_eq!(folded.unfold(), quantize(&c, FixedFormat::Q8_8).raw());
    }

    #[test]
    fn test_compensate_gain_reaches_unity() {
        let c = coeffs(&[0.05, 0.2, 0.4, 0.2, 0.05]);
        let folded = fold(&quantize(&c, FixedFormat::Q8_8)).unwrap();
        assert!((folded.dc_gain() - 0.9).abs() < 0.01);

        let compensated = compensate_gain(&folded, 1.0).unwrap();
        assert_eq!(compensated.weighted_sum_raw(), 256);
        assert!((compensated.dc_gain() - 1.0).abs() <= FixedFormat::Q8_8.lsb());
    }

    #[test]
    fn test_compensate_gain_other_target() {
        let c = coeffs(&[0.1, 0.3, 0.1]);
        let folded = fold(&quantize(&c, FixedFormat::Q8_8)).unwrap();
        let compensated = compensate_gain(&folded, 0.5).unwrap();
        assert_eq!(compensated.weighted_sum_raw(), 128);
    }

    #[test]
    fn test_compensate_gain_overflow() {
        let c = coeffs(&[0.02, 0.5, 0.02]);
        let format: FixedFormat = "q1.7".parse().unwrap();
        let folded = fold(&quantize(&c, format)).unwrap();
        // Reaching a gain of 1.9 needs a center tap beyond +0.99
        let result = compensate_gain(&folded, 1.9);
        assert!(matches!(
            result,
            Err(FirError::QuantizationOverflow { .. })
        ));
    }

    #[test]
    fn test_compensate_gain_zero() {
        let folded = FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![1, -2]).unwrap();
        assert!(matches!(compensate_gain(&folded, 1.0), Err(FirError::ZeroGain)));
    }

    #[test]
    fn test_compensate_gain_rejects_non_finite_target() {
        let c = coeffs(&[0.1, 0.3, 0.1]);
        let folded = fold(&quantize(&c, FixedFormat::Q8_8)).unwrap();
        for target in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                compensate_gain(&folded, target),
                Err(FirError::Config(_))
            ));
        }
    }

    #[test]
    fn test_from_raw_rejects_out_of_range() {
        let format: FixedFormat = "q1.7".parse().unwrap();
        let result = FoldedCoefficients::from_raw(format, vec![10, 200]);
        assert!(matches!(
            result,
            Err(FirError::QuantizationOverflow { tap: 1, .. })
        ));
    }
}
