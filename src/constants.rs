//! Numeric constants shared across the design, quantization and validation
//! stages.

/// Smallest tap count that still has a pair and a center tap.
pub const MIN_TAPS: usize = 3;

/// Remez exchange iterations allowed before a design counts as failed.
pub const DEFAULT_MAX_ITERATIONS: usize = 100;

/// Widest supported coefficient or data word.
pub const MAX_WORD_BITS: u32 = 32;

/// Widest accumulator representable in the engine's `i128` arithmetic.
pub const MAX_ACCUMULATOR_BITS: u32 = 127;

/// Epsilon for comparing floating coefficients during symmetry checks.
/// The designer symmetrizes exactly; this only guards caller-built vectors.
pub const SYMMETRY_EPSILON: f64 = 1e-12;

/// Below this DC gain a folded table is treated as having no gain to scale.
pub const MIN_DC_GAIN: f64 = 1e-12;

/// Number of frequency points used when comparing responses.
pub const RESPONSE_POINTS: usize = 512;

/// Magnitude error below which an implementation is reported as a pass.
pub const RESPONSE_PASS_THRESHOLD: f64 = 0.01;

/// Magnitude error below which an implementation is reported as good.
pub const RESPONSE_GOOD_THRESHOLD: f64 = 0.1;
