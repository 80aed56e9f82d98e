use crate::engine::SampleFilter;
use crate::fixed_point::{FixedFormat, FoldedCoefficients, OverflowPolicy};

/// Floating-point direct-form FIR, the ground-truth reference
///
/// Contains the delay line, tap coefficients, and convolution logic.
pub struct FirFilterCore {
    taps: Vec<f64>,
    delay_line: Vec<f64>,
    pos: usize,
}

impl FirFilterCore {
    /// Create a new FIR filter core with the given tap coefficients
    pub fn new(taps: Vec<f64>) -> Self {
        Self {
            delay_line: vec![0.0; taps.len()],
            taps,
            pos: 0,
        }
    }

    /// Process a single sample through the filter
    pub fn process(&mut self, sample: f64) -> f64 {
        self.delay_line[self.pos] = sample;

        let mut output = 0.0f64;
        let n = self.taps.len();

        // Iterate the ring buffer in two contiguous reverse ranges to avoid
        // modulo arithmetic in the inner convolution loop.
        let mut tap_i = 0usize;
        for delay_idx in (0..=self.pos).rev() {
            output += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        for delay_idx in ((self.pos + 1)..n).rev() {
            output += self.taps[tap_i] * self.delay_line[delay_idx];
            tap_i += 1;
        }
        debug_assert_eq!(tap_i, n);

        self.pos += 1;
        if self.pos == n {
            self.pos = 0;
        }
        output
    }

    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    /// Get the group delay in samples (half the filter length for linear phase)
    pub fn group_delay_samples(&self) -> usize {
        (self.taps.len() - 1) / 2
    }

    pub fn reset(&mut self) {
        self.delay_line.fill(0.0);
        self.pos = 0;
    }
}

impl SampleFilter for FirFilterCore {
    type Sample = f64;

    fn process(&mut self, sample: f64) -> f64 {
        FirFilterCore::process(self, sample)
    }
}

/// Unfolded integer convolution over the full tap vector
///
/// One multiplier per tap, an unbounded accumulator, and the same output
/// shift and narrowing as the folded engine. Used as the bit-exact oracle for
/// the folding transformation.
pub struct DirectFormFir {
    taps: Vec<i32>,
    history: Vec<i32>,
    pos: usize,
    shift: u32,
    data_format: FixedFormat,
    overflow: OverflowPolicy,
}

impl DirectFormFir {
    pub fn new(
        coeffs: &FoldedCoefficients,
        data_format: FixedFormat,
        overflow: OverflowPolicy,
    ) -> Self {
        let taps = coeffs.unfold();
        Self {
            history: vec![0; taps.len()],
            taps,
            pos: 0,
            shift: coeffs.format().frac_bits(),
            data_format,
            overflow,
        }
    }

    /// Full-precision accumulation for the newest sample
    pub fn accumulate(&mut self, sample: i32) -> i128 {
        self.history[self.pos] = sample;
        let n = self.taps.len();
        let acc = (0..n)
            .map(|k| {
                let idx = (self.pos + n - k) % n;
                self.taps[k] as i128 * self.history[idx] as i128
            })
            .sum();
        self.pos = (self.pos + 1) % n;
        acc
    }

    pub fn process(&mut self, sample: i32) -> i32 {
        let acc = self.accumulate(sample);
        self.overflow
            .apply(acc >> self.shift, self.data_format.total_bits()) as i32
    }
}

impl SampleFilter for DirectFormFir {
    type Sample = i32;

    fn process(&mut self, sample: i32) -> i32 {
        DirectFormFir::process(self, sample)
    }
}
