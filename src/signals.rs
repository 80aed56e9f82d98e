//! Deterministic stimulus generation and sample-format conversion.

use std::f64::consts::PI;

use crate::fixed_point::FixedFormat;

/// Sinusoid of `len` samples
pub fn tone(len: usize, freq_hz: f64, sample_rate: f64, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|n| amplitude * (2.0 * PI * freq_hz * n as f64 / sample_rate).sin())
        .collect()
}

/// Single non-zero sample at index `at`
pub fn impulse(len: usize, at: usize, amplitude: f64) -> Vec<f64> {
    let mut signal = vec![0.0; len];
    if let Some(s) = signal.get_mut(at) {
        *s = amplitude;
    }
    signal
}

/// Zero before `at`, `amplitude` from `at` on
pub fn step(len: usize, at: usize, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|n| if n >= at { amplitude } else { 0.0 })
        .collect()
}

/// Element-wise sum of equal-length signals
pub fn mix(signals: &[&[f64]]) -> Vec<f64> {
    let len = signals.iter().map(|s| s.len()).min().unwrap_or(0);
    (0..len)
        .map(|n| signals.iter().map(|s| s[n]).sum())
        .collect()
}

/// Quantize samples to raw data words, rounding ties to even and saturating
pub fn to_fixed(signal: &[f64], format: FixedFormat) -> Vec<i32> {
    signal.iter().map(|&x| format.to_raw(x).0).collect()
}

pub fn from_fixed(raw: &[i32], format: FixedFormat) -> Vec<f64> {
    raw.iter().map(|&r| format.to_real(r as i64)).collect()
}

/// The hardware testbench's stimulus set: `dc`, `sine_low` and `step`
///
/// `sine_low` is the first 50 points of a 50 Hz, 0.5 amplitude sinusoid
/// sampled on a 100-point grid spanning one second.
pub fn standard_stimuli() -> Vec<(&'static str, Vec<f64>)> {
    let dt = 1.0 / 99.0;
    let sine_low = (0..50)
        .map(|n| 0.5 * (2.0 * PI * 50.0 * n as f64 * dt).sin())
        .collect();
    vec![
        ("dc", vec![1.0; 50]),
        ("sine_low", sine_low),
        ("step", step(50, 25, 1.0)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_impulse_and_step() {
        assert_eq!(impulse(4, 1, 2.0), vec![0.0, 2.0, 0.0, 0.0]);
        assert_eq!(impulse(2, 5, 1.0), vec![0.0, 0.0]);
        assert_eq!(step(4, 2, 1.0), vec![0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_tone_period() {
        let t = tone(8, 125.0, 1000.0, 1.0);
        assert!(t[0].abs() < 1e-12);
        assert!((t[2] - 1.0).abs() < 1e-12);
        assert!((t[6] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mix_truncates_to_shortest() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.5, 0.5];
        assert_eq!(mix(&[&a, &b]), vec![1.5, 2.5]);
    }

    #[test]
    fn test_fixed_conversion() {
        let raw = to_fixed(&[1.0, -0.5, 200.0], FixedFormat::Q8_8);
        assert_eq!(raw, vec![256, -128, 32767]);
        assert_eq!(from_fixed(&raw[..2], FixedFormat::Q8_8), vec![1.0, -0.5]);
    }

    #[test]
    fn test_standard_stimuli() {
        let stimuli = standard_stimuli();
        let names: Vec<&str> = stimuli.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["dc", "sine_low", "step"]);
        assert!(stimuli.iter().all(|(_, s)| s.len() == 50));
        assert!(stimuli[1].1.iter().all(|x| x.abs() <= 0.5));
    }
}
