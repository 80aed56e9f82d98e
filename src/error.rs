use thiserror::Error;

#[derive(Error, Debug)]
pub enum FirError {
    #[error(
        "Filter design failed for {taps} taps (passband {passband_hz} Hz, stopband {stopband_hz} Hz): {reason}"
    )]
    Design {
        taps: usize,
        passband_hz: f64,
        stopband_hz: f64,
        reason: String,
    },

    #[error("Band edges out of range: {0}")]
    Range(String),

    #[error("Invalid tap count {0}: must be odd and at least 3")]
    InvalidTaps(usize),

    #[error("Invalid fixed-point format: {total_bits} total bits, {frac_bits} fractional bits")]
    InvalidFormat { total_bits: u32, frac_bits: u32 },

    #[error("Quantization overflow at tap {tap}: {value} outside [{min}, {max}]")]
    QuantizationOverflow {
        tap: usize,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Coefficients are not symmetric at index {0}")]
    Asymmetric(usize),

    #[error("Folded table has zero DC gain, cannot compensate")]
    ZeroGain,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Interchange parse error at line {line}: {reason}")]
    Interchange { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FirError>;
