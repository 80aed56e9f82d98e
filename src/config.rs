//! Configuration for the folded FIR pipeline.
//!
//! Every section has a `Default` describing the reference hardware: an 11-tap
//! lowpass at 1 kHz sampling with a 100 Hz cutoff, Q8.8 coefficients and Q8.8
//! data words. A TOML file may override any subset of fields:
//!
//! ```toml
//! [design]
//! taps = 21
//! stopband_hz = 140.0
//!
//! [quantization]
//! coefficient_format = "q1.15"
//!
//! [engine]
//! overflow = "wrap"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_ITERATIONS, MIN_TAPS};
use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, OverflowPolicy};

/// Lowpass design requirements
///
/// Band edges are in Hz and must satisfy `0 < passband < stopband < Nyquist`.
///
/// # Example
/// ```
/// use foldfir::config::FilterSpec;
///
/// let spec = FilterSpec::lowpass(11, 100.0, 100.0, 1000.0);
/// assert_eq!(spec.passband_hz, 50.0);
/// assert_eq!(spec.stopband_hz, 150.0);
/// assert!(spec.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Number of taps (odd, type I linear phase)
    pub taps: usize,
    /// Passband edge in Hz
    pub passband_hz: f64,
    /// Stopband edge in Hz
    pub stopband_hz: f64,
    /// Weight of the passband error in the minimax objective
    pub passband_weight: f64,
    /// Weight of the stopband error in the minimax objective
    pub stopband_weight: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Remez exchange budget; a design still not flat after this many
    /// iterations is rejected
    pub max_iterations: usize,
}

impl FilterSpec {
    /// Lowpass with the transition band centered on `cutoff_hz`
    pub fn lowpass(taps: usize, cutoff_hz: f64, transition_hz: f64, sample_rate: f64) -> Self {
        Self {
            taps,
            passband_hz: cutoff_hz - transition_hz / 2.0,
            stopband_hz: cutoff_hz + transition_hz / 2.0,
            sample_rate,
            ..Self::default()
        }
    }

    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Center of the transition band
    pub fn cutoff_hz(&self) -> f64 {
        0.5 * (self.passband_hz + self.stopband_hz)
    }

    pub fn transition_hz(&self) -> f64 {
        self.stopband_hz - self.passband_hz
    }

    /// Same transition width, moved to a new cutoff
    pub fn with_cutoff(&self, cutoff_hz: f64) -> Self {
        let half = self.transition_hz() / 2.0;
        Self {
            passband_hz: cutoff_hz - half,
            stopband_hz: cutoff_hz + half,
            ..self.clone()
        }
    }

    pub fn with_taps(&self, taps: usize) -> Self {
        Self {
            taps,
            ..self.clone()
        }
    }

    /// Check tap count, band ordering and weights
    pub fn validate(&self) -> Result<()> {
        if self.taps < MIN_TAPS || self.taps.is_multiple_of(2) {
            return Err(FirError::InvalidTaps(self.taps));
        }
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(FirError::Config(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        let nyquist = self.nyquist();
        let ordered = self.passband_hz > 0.0
            && self.passband_hz < self.stopband_hz
            && self.stopband_hz < nyquist;
        if !ordered {
            return Err(FirError::Range(format!(
                "passband={} Hz, stopband={} Hz, nyquist={} Hz",
                self.passband_hz, self.stopband_hz, nyquist
            )));
        }
        if !(self.passband_weight > 0.0 && self.stopband_weight > 0.0) {
            return Err(FirError::Config(format!(
                "band weights must be positive: passband={}, stopband={}",
                self.passband_weight, self.stopband_weight
            )));
        }
        if self.max_iterations == 0 {
            return Err(FirError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            taps: 11,
            passband_hz: 50.0,
            stopband_hz: 150.0,
            passband_weight: 1.0,
            stopband_weight: 1.0,
            sample_rate: 1000.0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Coefficient quantization configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantizationConfig {
    /// Fixed-point format of the folded coefficient table
    pub coefficient_format: FixedFormat,
    /// DC gain the compensated table must reach
    pub target_gain: f64,
}

impl QuantizationConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.target_gain.is_finite() {
            return Err(FirError::Config(format!(
                "target gain must be finite, got {}",
                self.target_gain
            )));
        }
        Ok(())
    }
}

impl Default for QuantizationConfig {
    fn default() -> Self {
        Self {
            coefficient_format: FixedFormat::Q8_8,
            target_gain: 1.0,
        }
    }
}

/// Streaming engine configuration
///
/// The accumulator width is `data_format.total_bits() + coefficient bits +
/// guard bits`. Guard bits default to the value derived from the coefficient
/// table's worst-case growth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Format of input and output sample words
    pub data_format: FixedFormat,
    /// Explicit guard bits; `None` derives them from the table
    pub guard_bits: Option<u32>,
    /// Saturate or wrap on input, accumulator and output overflow
    pub overflow: OverflowPolicy,
    /// Explicit output shift; must match the table's fractional bits
    pub shift: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_format: FixedFormat::Q8_8,
            guard_bits: None,
            overflow: OverflowPolicy::Saturate,
            shift: None,
        }
    }
}

/// Cross-validation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest engine vs. reference difference, in output LSBs, before a
    /// sample is reported as a mismatch
    pub tolerance_lsb: f64,
    /// Lowest acceptable fixed vs. floating SNR in dB for sweep points
    pub min_snr_db: f64,
    /// Word widths for the quantization-error characterization
    pub bit_widths: Vec<u32>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            tolerance_lsb: 1.0,
            min_snr_db: 20.0,
            bit_widths: vec![8, 12, 16, 24],
        }
    }
}

/// Complete pipeline configuration
///
/// # Example
/// ```
/// use foldfir::config::PipelineConfig;
///
/// let config = PipelineConfig::from_toml_str("[design]\ntaps = 21\n").unwrap();
/// assert_eq!(config.design.taps, 21);
/// assert_eq!(config.design.sample_rate, 1000.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub design: FilterSpec,
    pub quantization: QuantizationConfig,
    pub engine: EngineConfig,
    pub validation: ValidationConfig,
}

impl PipelineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| FirError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_valid() {
        assert!(FilterSpec::default().validate().is_ok());
    }

    #[test]
    fn test_spec_rejects_unordered_edges() {
        let spec = FilterSpec {
            passband_hz: 200.0,
            stopband_hz: 100.0,
            ..FilterSpec::default()
        };
        assert!(matches!(spec.validate(), Err(FirError::Range(_))));
    }

    #[test]
    fn test_spec_rejects_edges_beyond_nyquist() {
        let spec = FilterSpec::lowpass(11, 480.0, 60.0, 1000.0);
        assert!(matches!(spec.validate(), Err(FirError::Range(_))));

        let spec = FilterSpec::lowpass(11, 10.0, 40.0, 1000.0);
        assert!(matches!(spec.validate(), Err(FirError::Range(_))));
    }

    #[test]
    fn test_spec_rejects_empty_iteration_budget() {
        let spec = FilterSpec {
            max_iterations: 0,
            ..FilterSpec::default()
        };
        assert!(matches!(spec.validate(), Err(FirError::Config(_))));
    }

    #[test]
    fn test_non_finite_target_gain_rejected() {
        let config = QuantizationConfig {
            target_gain: f64::NAN,
            ..QuantizationConfig::default()
        };
        assert!(matches!(config.validate(), Err(FirError::Config(_))));
        assert!(QuantizationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_spec_rejects_even_taps() {
        let spec = FilterSpec::default().with_taps(10);
        assert!(matches!(spec.validate(), Err(FirError::InvalidTaps(10))));
    }

    #[test]
    fn test_with_cutoff_keeps_transition() {
        let spec = FilterSpec::default().with_cutoff(200.0);
        assert_eq!(spec.passband_hz, 150.0);
        assert_eq!(spec.stopband_hz, 250.0);
        assert_eq!(spec.cutoff_hz(), 200.0);
    }

    #[test]
    fn test_toml_partial_override() {
        let config = PipelineConfig::from_toml_str(
            r#"
            [quantization]
            coefficient_format = "q1.15"

            [engine]
            overflow = "wrap"
            guard_bits = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.quantization.coefficient_format.frac_bits(), 15);
        assert_eq!(config.quantization.target_gain, 1.0);
        assert_eq!(config.engine.overflow, OverflowPolicy::Wrap);
        assert_eq!(config.engine.guard_bits, Some(2));
        assert_eq!(config.design, FilterSpec::default());
    }

    #[test]
    fn test_toml_invalid_format() {
        let result = PipelineConfig::from_toml_str("[quantization]\ncoefficient_format = \"q8\"\n");
        assert!(matches!(result, Err(FirError::Config(_))));
    }
}
