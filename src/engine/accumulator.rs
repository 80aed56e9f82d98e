use serde::Serialize;

use crate::constants::MAX_ACCUMULATOR_BITS;
use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, FoldedCoefficients};

/// Declared width of the multiply-accumulate register
///
/// `width = data_bits + coeff_bits + guard_bits`. The product of a data word
/// and a coefficient needs `data_bits + coeff_bits - 1` bits; guard bits
/// absorb the growth from summing `T` products (the pre-adder's extra bit is
/// counted by weighting paired taps twice).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AccumulatorSpec {
    pub data_bits: u32,
    pub coeff_bits: u32,
    pub guard_bits: u32,
}

impl AccumulatorSpec {
    /// Size the accumulator for a table, deriving guard bits unless given
    pub fn for_table(
        data_format: FixedFormat,
        coeffs: &FoldedCoefficients,
        guard_bits: Option<u32>,
    ) -> Result<Self> {
        let spec = Self {
            data_bits: data_format.total_bits(),
            coeff_bits: coeffs.format().total_bits(),
            guard_bits: guard_bits.unwrap_or_else(|| derive_guard_bits(coeffs)),
        };
        if spec.width() > MAX_ACCUMULATOR_BITS {
            return Err(FirError::Config(format!(
                "accumulator width {} exceeds {} bits",
                spec.width(),
                MAX_ACCUMULATOR_BITS
            )));
        }
        Ok(spec)
    }

    pub fn width(&self) -> u32 {
        self.data_bits + self.coeff_bits + self.guard_bits
    }

    pub fn max(&self) -> i128 {
        (1i128 << (self.width() - 1)) - 1
    }

    pub fn min(&self) -> i128 {
        -(1i128 << (self.width() - 1))
    }
}

/// Guard bits needed so no input sequence can overflow the accumulator
///
/// With `L1 = Σ w_i |c_i|` (w = 2 for pairs, 1 for the center) every
/// accumulation is bounded by `2^(D-1) * L1`. That fits `D + C + g` signed
/// bits when `g >= ceil(log2(L1)) - (C - 1)`.
pub fn derive_guard_bits(coeffs: &FoldedCoefficients) -> u32 {
    let l1 = coeffs.weighted_abs_sum_raw() as u128;
    if l1 <= 1 {
        return 0;
    }
    let growth = 128 - (l1 - 1).leading_zeros();
    growth.saturating_sub(coeffs.format().total_bits() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_gain_table_needs_no_guard_bits() {
        // L1 = 2*16 + 2*64 + 96 = 256 = 2^8, within 15 bits of coefficient range
        let coeffs = FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![16, 64, 96]).unwrap();
        assert_eq!(derive_guard_bits(&coeffs), 0);
    }

    #[test]
    fn test_full_scale_table_needs_guard_bits() {
        let format: FixedFormat = "q1.7".parse().unwrap();
        let coeffs = FoldedCoefficients::from_raw(format, vec![127, 127]).unwrap();
        // L1 = 381 -> ceil(log2) = 9, coefficient magnitude bits = 7
        assert_eq!(derive_guard_bits(&coeffs), 2);
    }

    #[test]
    fn test_width_and_limits() {
        let coeffs = FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![16, 64, 96]).unwrap();
        let spec = AccumulatorSpec::for_table(FixedFormat::Q8_8, &coeffs, Some(3)).unwrap();
        assert_eq!(spec.width(), 35);
        assert_eq!(spec.max(), (1i128 << 34) - 1);
        assert_eq!(spec.min(), -(1i128 << 34));
    }

    #[test]
    fn test_rejects_too_wide() {
        let coeffs = FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![16, 64, 96]).unwrap();
        assert!(AccumulatorSpec::for_table(FixedFormat::Q8_8, &coeffs, Some(100)).is_err());
    }
}
