use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::constants::{MIN_TAPS, SYMMETRY_EPSILON};
use crate::error::{FirError, Result};

/// Linear-phase floating-point impulse response
///
/// Holds an odd number of taps satisfying `h[i] == h[T-1-i]`. Built by the
/// designer or loaded from the coefficient interchange file; construction
/// rejects vectors that break the type-I shape.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientVector {
    taps: Vec<f64>,
}

impl CoefficientVector {
    /// Wrap a tap vector, validating length and symmetry
    pub fn new(taps: Vec<f64>) -> Result<Self> {
        if taps.len() < MIN_TAPS || taps.len().is_multiple_of(2) {
            return Err(FirError::InvalidTaps(taps.len()));
        }
        if let Some(i) = taps.iter().position(|t| !t.is_finite()) {
            return Err(FirError::Config(format!("coefficient {} is not finite", i)));
        }
        let n = taps.len();
        for i in 0..n / 2 {
            if (taps[i] - taps[n - 1 - i]).abs() > SYMMETRY_EPSILON {
                return Err(FirError::Asymmetric(i));
            }
        }
        Ok(Self { taps })
    }

    /// Average mirrored pairs so the vector is exactly symmetric
    ///
    /// Optimizer output is symmetric up to floating rounding; this removes the
    /// residue before validation.
    pub fn symmetrized(mut taps: Vec<f64>) -> Result<Self> {
        let n = taps.len();
        for i in 0..n / 2 {
            let mean = 0.5 * (taps[i] + taps[n - 1 - i]);
            taps[i] = mean;
            taps[n - 1 - i] = mean;
        }
        Self::new(taps)
    }

    pub fn taps(&self) -> &[f64] {
        &self.taps
    }

    pub fn num_taps(&self) -> usize {
        self.taps.len()
    }

    /// Number of distinct values after folding, `(T+1)/2`
    pub fn folded_len(&self) -> usize {
        self.taps.len().div_ceil(2)
    }

    /// Index of the unpaired center tap
    pub fn center(&self) -> usize {
        (self.taps.len() - 1) / 2
    }

    /// Group delay in samples (half the filter length for linear phase)
    pub fn group_delay_samples(&self) -> usize {
        self.center()
    }

    /// Response at zero frequency, the plain coefficient sum
    pub fn dc_gain(&self) -> f64 {
        self.taps.iter().sum()
    }

    /// Render the interchange text: one coefficient per line, in order
    pub fn to_interchange(&self) -> String {
        let mut out = String::with_capacity(self.taps.len() * 24);
        for tap in &self.taps {
            // Display for f64 prints the shortest string that round-trips
            let _ = writeln!(out, "{}", tap);
        }
        out
    }

    /// Parse interchange text; blank lines and `#` comments are skipped
    pub fn from_interchange(text: &str) -> Result<Self> {
        let mut taps = Vec::new();
        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let value: f64 = line.parse().map_err(|_| FirError::Interchange {
                line: line_no + 1,
                reason: format!("not a real number: {:?}", line),
            })?;
            taps.push(value);
        }
        Self::new(taps)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_interchange())?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_interchange(&text)
    }
}
