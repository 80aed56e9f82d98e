use num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

/// One bin of a one-sided amplitude spectrum
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumBin {
    pub freq_hz: f64,
    pub magnitude: f64,
}

/// One-sided amplitude spectrum of `signal`, zero-padded by `zero_padding`
/// samples
///
/// Magnitudes are scaled by `2 / len` of the unpadded signal, so a sinusoid
/// of amplitude `A` that falls on a bin peaks at `A`. Padding only
/// interpolates between bins.
pub fn spectrum(signal: &[f64], sample_rate: f64, zero_padding: usize) -> Vec<SpectrumBin> {
    if signal.is_empty() {
        return Vec::new();
    }
    let nfft = signal.len() + zero_padding;
    let mut buf: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat_n(Complex::new(0.0, 0.0), zero_padding))
        .collect();

    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(nfft).process(&mut buf);

    let scale = 2.0 / signal.len() as f64;
    buf.iter()
        .take(nfft / 2)
        .enumerate()
        .map(|(k, c)| SpectrumBin {
            freq_hz: k as f64 * sample_rate / nfft as f64,
            magnitude: c.norm() * scale,
        })
        .collect()
}

/// Strongest bin with `lo_hz <= freq <= hi_hz`
pub fn peak_in_band(bins: &[SpectrumBin], lo_hz: f64, hi_hz: f64) -> Option<SpectrumBin> {
    bins.iter()
        .filter(|b| b.freq_hz >= lo_hz && b.freq_hz <= hi_hz)
        .copied()
        .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{mix, tone};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_tone_peaks_at_its_amplitude() {
        let signal = tone(1000, 50.0, 1000.0, 0.5);
        let bins = spectrum(&signal, 1000.0, 0);
        assert_eq!(bins.len(), 500);
        assert_abs_diff_eq!(bins[1].freq_hz, 1.0);

        let peak = peak_in_band(&bins, 0.0, 500.0).unwrap();
        assert_abs_diff_eq!(peak.freq_hz, 50.0);
        assert_abs_diff_eq!(peak.magnitude, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_padding_refines_bins() {
        let signal = tone(200, 50.0, 1000.0, 1.0);
        let plain = spectrum(&signal, 1000.0, 0);
        let padded = spectrum(&signal, 1000.0, 1800);
        assert_eq!(plain.len(), 100);
        assert_eq!(padded.len(), 1000);
        assert_abs_diff_eq!(padded[1].freq_hz, 0.5);

        let peak = peak_in_band(&padded, 0.0, 500.0).unwrap();
        assert_abs_diff_eq!(peak.freq_hz, 50.0);
        assert_abs_diff_eq!(peak.magnitude, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_two_tones_resolved() {
        let a = tone(1000, 40.0, 1000.0, 0.4);
        let b = tone(1000, 300.0, 1000.0, 0.1);
        let bins = spectrum(&mix(&[&a, &b]), 1000.0, 0);
        let low = peak_in_band(&bins, 0.0, 100.0).unwrap();
        let high = peak_in_band(&bins, 200.0, 500.0).unwrap();
        assert_abs_diff_eq!(low.magnitude, 0.4, epsilon = 1e-9);
        assert_abs_diff_eq!(high.magnitude, 0.1, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_signal() {
        assert!(spectrum(&[], 1000.0, 16).is_empty());
        assert!(peak_in_band(&[], 0.0, 1.0).is_none());
    }
}
