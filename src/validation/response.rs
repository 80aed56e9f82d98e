use std::f64::consts::PI;

use num_complex::Complex;
use serde::Serialize;

use crate::constants::{RESPONSE_GOOD_THRESHOLD, RESPONSE_PASS_THRESHOLD};

/// Complex frequency response on `points` evenly spaced frequencies in
/// `[0, 0.5)` cycles per sample
///
/// Returns `(normalized frequency, H(e^jw))` pairs.
pub fn frequency_response(taps: &[f64], points: usize) -> Vec<(f64, Complex<f64>)> {
    (0..points)
        .map(|k| {
            let f = 0.5 * k as f64 / points as f64;
            let h = taps
                .iter()
                .enumerate()
                .map(|(n, &c)| Complex::from_polar(c, -2.0 * PI * f * n as f64))
                .sum();
            (f, h)
        })
        .collect()
}

/// Magnitude response in dB, floored to avoid `log10(0)`
pub fn magnitude_db(response: &[(f64, Complex<f64>)]) -> Vec<(f64, f64)> {
    response
        .iter()
        .map(|(f, h)| (*f, 20.0 * (h.norm() + 1e-10).log10()))
        .collect()
}

/// How closely an implementation tracks its design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseVerdict {
    /// Max magnitude error below 0.01
    Pass,
    /// Max magnitude error below 0.1
    Good,
    /// Significant differences
    Check,
}

/// Magnitude-response difference between a design and its implementation
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponseError {
    pub mse: f64,
    pub max_error: f64,
    pub verdict: ResponseVerdict,
}

/// Compare magnitude responses of two full-length tap vectors
pub fn response_error(designed: &[f64], implemented: &[f64], points: usize) -> ResponseError {
    let a = frequency_response(designed, points);
    let b = frequency_response(implemented, points);

    let diffs: Vec<f64> = a
        .iter()
        .zip(&b)
        .map(|((_, ha), (_, hb))| ha.norm() - hb.norm())
        .collect();
    let mse = if diffs.is_empty() {
        0.0
    } else {
        diffs.iter().map(|d| d * d).sum::<f64>() / diffs.len() as f64
    };
    let max_error = diffs.iter().fold(0.0f64, |m, d| m.max(d.abs()));

    let verdict = if max_error < RESPONSE_PASS_THRESHOLD {
        ResponseVerdict::Pass
    } else if max_error < RESPONSE_GOOD_THRESHOLD {
        ResponseVerdict::Good
    } else {
        ResponseVerdict::Check
    };

    ResponseError {
        mse,
        max_error,
        verdict,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_dc_point_is_coefficient_sum() {
        let taps = [0.1, 0.2, 0.4, 0.2, 0.1];
        let response = frequency_response(&taps, 16);
        assert_eq!(response[0].0, 0.0);
        assert_abs_diff_eq!(response[0].1.re, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(response[0].1.im, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_moving_average_null() {
        // 0.5 (1 + z^-2) nulls at a quarter of the sample rate
        let taps = [0.5, 0.0, 0.5];
        let response = frequency_response(&taps, 4);
        assert_abs_diff_eq!(response[2].1.norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_identical_responses_pass() {
        let taps = [0.1, 0.2, 0.4, 0.2, 0.1];
        let err = response_error(&taps, &taps, 64);
        assert_eq!(err.max_error, 0.0);
        assert_eq!(err.verdict, ResponseVerdict::Pass);
    }

    #[test]
    fn test_scaled_response_is_flagged() {
        let taps = [0.1, 0.2, 0.4, 0.2, 0.1];
        let scaled: Vec<f64> = taps.iter().map(|t| t * 1.05).collect();
        assert_eq!(
            response_error(&taps, &scaled, 64).verdict,
            ResponseVerdict::Good
        );
        let scaled: Vec<f64> = taps.iter().map(|t| t * 1.5).collect();
        assert_eq!(
            response_error(&taps, &scaled, 64).verdict,
            ResponseVerdict::Check
        );
    }

    #[test]
    fn test_magnitude_db() {
        let db = magnitude_db(&frequency_response(&[1.0], 2));
        assert_abs_diff_eq!(db[0].1, 0.0, epsilon = 1e-6);
    }
}
