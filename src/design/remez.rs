use pm_remez::{
    BandSetting, DesignParameters, ParametersBuilder, constant, pm_parameters, pm_remez,
};

use crate::config::FilterSpec;
use crate::design::CoefficientVector;
use crate::error::{FirError, Result};

/// Design a type-I equiripple lowpass
///
/// Uses the Parks-McClellan (Remez exchange) algorithm to minimise the
/// weighted maximum error over a passband with desired gain 1 and a stopband
/// with desired gain 0. The result is symmetrized exactly and its DC gain is
/// left as designed; gain correction happens after quantization.
///
/// # Errors
/// - `FirError::InvalidTaps` for even or too-small tap counts
/// - `FirError::Range` if the band edges are unordered or outside (0, Nyquist)
/// - `FirError::Design` if the exchange is not flat within
///   `spec.max_iterations` iterations or produces a non-finite response
pub fn design(spec: &FilterSpec) -> Result<CoefficientVector> {
    spec.validate()?;

    let design_err = |reason: String| FirError::Design {
        taps: spec.taps,
        passband_hz: spec.passband_hz,
        stopband_hz: spec.stopband_hz,
        reason,
    };

    let normalize = |hz: f64| hz / spec.sample_rate;
    let pass_end = normalize(spec.passband_hz);
    let stop_start = normalize(spec.stopband_hz);

    let bands = [
        BandSetting::with_weight(
            0.0,
            pass_end,
            constant(1.0),
            constant(spec.passband_weight),
        )
        .map_err(|e| design_err(format!("Passband: {:?}", e)))?,
        BandSetting::with_weight(
            stop_start,
            0.5,
            constant(0.0),
            constant(spec.stopband_weight),
        )
        .map_err(|e| design_err(format!("Stopband: {:?}", e)))?,
    ];

    let mut params = pm_parameters(spec.taps, &bands)
        .map_err(|e| design_err(format!("PM parameters: {:?}", e)))?;
    params.set_max_iterations(spec.max_iterations);

    let design = pm_remez(&params).map_err(|e| design_err(format!("PM Remez: {:?}", e)))?;

    // pm_remez returns Ok when it runs out of iterations
    let threshold = params.flatness_threshold();
    if design.flatness.is_nan() || design.flatness > threshold {
        return Err(design_err(format!(
            "no convergence after {} iterations (flatness {:.3e}, threshold {:.1e})",
            design.num_iterations,
            design.flatness,
            threshold
        )));
    }

    if !design.weighted_error.is_finite()
        || design.impulse_response.iter().any(|h| !h.is_finite())
    {
        return Err(design_err("non-finite impulse response".to_string()));
    }
    if design.impulse_response.len() != spec.taps {
        return Err(design_err(format!(
            "optimizer returned {} taps",
            design.impulse_response.len()
        )));
    }

    log::debug!(
        "Remez design: {} taps, edges {:.4}/{:.4}, weighted error {:.3e}, {} iterations",
        spec.taps,
        pass_end,
        stop_start,
        design.weighted_error,
        design.num_iterations
    );

    let coefficients = CoefficientVector::symmetrized(design.impulse_response)?;
    log::info!(
        "Designed {}-tap lowpass, DC gain {:.6}",
        coefficients.num_taps(),
        coefficients.dc_gain()
    );
    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn magnitude_at(taps: &[f64], freq_norm: f64) -> f64 {
        let (re, im) = taps
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(re, im), (n, h)| {
                let w = 2.0 * PI * freq_norm * n as f64;
                (re + h * w.cos(), im - h * w.sin())
            });
        (re * re + im * im).sqrt()
    }

    #[test]
    fn test_design_eleven_taps() {
        let spec = FilterSpec::lowpass(11, 100.0, 100.0, 1000.0);
        let coeffs = design(&spec).unwrap();
        assert_eq!(coeffs.num_taps(), 11);
        assert_eq!(coeffs.folded_len(), 6);
    }

    #[test]
    fn test_design_is_symmetric() {
        let coeffs = design(&FilterSpec::lowpass(31, 100.0, 60.0, 1000.0)).unwrap();
        let h = coeffs.taps();
        let n = h.len();
        for i in 0..n {
            assert_eq!(h[i], h[n - 1 - i], "tap {} not mirrored", i);
        }
    }

    #[test]
    fn test_design_center_tap_dominates() {
        let coeffs = design(&FilterSpec::lowpass(21, 100.0, 80.0, 1000.0)).unwrap();
        let center = coeffs.taps()[coeffs.center()];
        assert!(coeffs.taps().iter().all(|&h| h <= center));
    }

    #[test]
    fn test_design_passes_low_and_rejects_high() {
        let coeffs = design(&FilterSpec::lowpass(41, 100.0, 60.0, 1000.0)).unwrap();
        let pass = magnitude_at(coeffs.taps(), 0.02);
        let stop = magnitude_at(coeffs.taps(), 0.3);
        assert!((pass - 1.0).abs() < 0.1, "passband gain {}", pass);
        assert!(20.0 * stop.log10() < -30.0, "stopband gain {}", stop);
    }

    #[test]
    fn test_design_rejects_bad_edges() {
        let spec = FilterSpec {
            passband_hz: 300.0,
            stopband_hz: 200.0,
            ..FilterSpec::default()
        };
        assert!(matches!(design(&spec), Err(FirError::Range(_))));

        let spec = FilterSpec {
            stopband_hz: 600.0,
            ..FilterSpec::default()
        };
        assert!(matches!(design(&spec), Err(FirError::Range(_))));
    }

    #[test]
    fn test_design_rejects_exhausted_iteration_budget() {
        let spec = FilterSpec {
            max_iterations: 1,
            ..FilterSpec::default()
        };
        let err = design(&spec).unwrap_err();
        assert!(matches!(err, FirError::Design { taps: 11, .. }), "{}", err);
        assert!(err.to_string().contains("no convergence"));

        assert!(design(&FilterSpec::default()).is_ok());
    }

    #[test]
    fn test_design_rejects_even_taps() {
        let spec = FilterSpec::default().with_taps(12);
        assert!(matches!(design(&spec), Err(FirError::InvalidTaps(12))));
    }
}
