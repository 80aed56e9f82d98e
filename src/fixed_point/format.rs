use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_WORD_BITS;
use crate::error::{FirError, Result};

/// Signed two's-complement fixed-point format
///
/// Written `Q<M>.<F>` where `M` counts the integer bits including the sign
/// bit, so `Q8.8` is a 16-bit word with 8 fractional bits.
///
/// # Parsing formats
/// - `q8.8`, `Q8.8` or `8.8`
///
/// # Example
/// ```
/// use foldfir::fixed_point::FixedFormat;
///
/// let format: FixedFormat = "q8.8".parse().unwrap();
/// assert_eq!(format.total_bits(), 16);
/// assert_eq!(format.to_raw(0.5).0, 128);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FixedFormat {
    total_bits: u32,
    frac_bits: u32,
}

impl FixedFormat {
    /// 16-bit word with 8 fractional bits, the hardware's native format.
    pub const Q8_8: FixedFormat = FixedFormat {
        total_bits: 16,
        frac_bits: 8,
    };

    /// Create a format, validating `total_bits > frac_bits` and the word width
    pub fn new(total_bits: u32, frac_bits: u32) -> Result<Self> {
        if total_bits == 0 || total_bits <= frac_bits || total_bits > MAX_WORD_BITS {
            return Err(FirError::InvalidFormat {
                total_bits,
                frac_bits,
            });
        }
        Ok(Self {
            total_bits,
            frac_bits,
        })
    }

    pub fn total_bits(&self) -> u32 {
        self.total_bits
    }

    pub fn frac_bits(&self) -> u32 {
        self.frac_bits
    }

    /// Integer bits including the sign bit
    pub fn int_bits(&self) -> u32 {
        self.total_bits - self.frac_bits
    }

    /// Real value of one raw step, `2^frac_bits`
    pub fn scale(&self) -> f64 {
        (1u64 << self.frac_bits) as f64
    }

    /// Weight of the least significant bit, `2^-frac_bits`
    pub fn lsb(&self) -> f64 {
        1.0 / self.scale()
    }

    pub fn min_raw(&self) -> i64 {
        -(1i64 << (self.total_bits - 1))
    }

    pub fn max_raw(&self) -> i64 {
        (1i64 << (self.total_bits - 1)) - 1
    }

    pub fn contains(&self, raw: i128) -> bool {
        raw >= self.min_raw() as i128 && raw <= self.max_raw() as i128
    }

    /// Map a real value to the nearest representable raw word
    ///
    /// Rounds to nearest with ties to even and saturates at the signed range.
    /// Returns the raw value and whether saturation occurred.
    pub fn to_raw(&self, value: f64) -> (i32, bool) {
        let scaled = (value * self.scale()).round_ties_even();
        if scaled.is_nan() {
            return (0, true);
        }
        let min = self.min_raw() as f64;
        let max = self.max_raw() as f64;
        if scaled < min {
            (self.min_raw() as i32, true)
        } else if scaled > max {
            (self.max_raw() as i32, true)
        } else {
            (scaled as i32, false)
        }
    }

    pub fn to_real(&self, raw: i64) -> f64 {
        raw as f64 / self.scale()
    }

    /// Two's-complement bit pattern of `raw`, masked to the word width
    pub fn to_bits(&self, raw: i32) -> u32 {
        (raw as u32) & self.word_mask()
    }

    /// Sign-extend a two's-complement bit pattern of this width
    pub fn from_bits(&self, bits: u32) -> Result<i32> {
        if bits & !self.word_mask() != 0 {
            return Err(FirError::Config(format!(
                "bit pattern {:#x} wider than {} bits",
                bits, self.total_bits
            )));
        }
        let shift = 32 - self.total_bits;
        Ok(((bits << shift) as i32) >> shift)
    }

    fn word_mask(&self) -> u32 {
        if self.total_bits == 32 {
            u32::MAX
        } else {
            (1u32 << self.total_bits) - 1
        }
    }
}

impl Default for FixedFormat {
    fn default() -> Self {
        Self::Q8_8
    }
}

impl fmt::Display for FixedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}.{}", self.int_bits(), self.frac_bits)
    }
}

impl FromStr for FixedFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let body = s
            .strip_prefix('q')
            .or_else(|| s.strip_prefix('Q'))
            .unwrap_or(s);

        let (int_part, frac_part) = body
            .split_once('.')
            .ok_or_else(|| format!("invalid format: {} (expected Q<M>.<F>)", s))?;
        let int_bits: u32 = int_part
            .trim()
            .parse()
            .map_err(|_| format!("invalid integer bits: {}", s))?;
        let frac_bits: u32 = frac_part
            .trim()
            .parse()
            .map_err(|_| format!("invalid fractional bits: {}", s))?;
        if int_bits == 0 {
            return Err("at least one integer (sign) bit is required".to_string());
        }

        FixedFormat::new(int_bits + frac_bits, frac_bits).map_err(|e| e.to_string())
    }
}

impl TryFrom<String> for FixedFormat {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FixedFormat> for String {
    fn from(format: FixedFormat) -> Self {
        format.to_string()
    }
}

/// Behavior when a value leaves its declared bit width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Clamp to the most positive or most negative value
    #[default]
    Saturate,
    /// Keep the low bits, as unguarded two's-complement hardware does
    Wrap,
}

impl OverflowPolicy {
    /// Bring `value` into a signed `bits`-wide range
    pub fn apply(self, value: i128, bits: u32) -> i128 {
        debug_assert!((1..=127).contains(&bits));
        match self {
            OverflowPolicy::Saturate => {
                let max = (1i128 << (bits - 1)) - 1;
                let min = -(1i128 << (bits - 1));
                value.clamp(min, max)
            }
            OverflowPolicy::Wrap => {
                let shift = 128 - bits;
                (value << shift) >> shift
            }
        }
    }
}

/// True if `value` fits a signed `bits`-wide word
pub fn fits_signed(value: i128, bits: u32) -> bool {
    let max = (1i128 << (bits - 1)) - 1;
    let min = -(1i128 << (bits - 1));
    (min..=max).contains(&value)
}
