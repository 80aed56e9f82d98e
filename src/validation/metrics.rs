use serde::Serialize;

use crate::error::{FirError, Result};

/// Error between a reference signal and an implementation's output
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ErrorMetrics {
    /// Mean squared error
    pub mse: f64,
    /// `10 log10(signal power / MSE)`; `+inf` when the outputs match exactly
    /// (serialized as `null`)
    pub snr_db: f64,
}

impl ErrorMetrics {
    pub fn is_exact(&self) -> bool {
        self.mse == 0.0
    }
}

/// Compare an implementation's output against a reference
///
/// Signal power is the mean squared reference. An exact match reports an
/// infinite SNR rather than dividing by zero.
///
/// # Errors
/// `FirError::Config` if the signals are empty or differ in length.
pub fn evaluate(reference: &[f64], actual: &[f64]) -> Result<ErrorMetrics> {
    if reference.is_empty() || reference.len() != actual.len() {
        return Err(FirError::Config(format!(
            "cannot compare signals of length {} and {}",
            reference.len(),
            actual.len()
        )));
    }

    let n = reference.len() as f64;
    let mse = reference
        .iter()
        .zip(actual)
        .map(|(r, a)| (r - a) * (r - a))
        .sum::<f64>()
        / n;
    let signal_power = reference.iter().map(|r| r * r).sum::<f64>() / n;

    let snr_db = if mse == 0.0 {
        f64::INFINITY
    } else {
        10.0 * (signal_power / mse).log10()
    };

    Ok(ErrorMetrics { mse, snr_db })
}

/// One sample where the implementation diverged beyond tolerance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValidationMismatch {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
}

impl ValidationMismatch {
    pub fn difference(&self) -> f64 {
        self.actual - self.expected
    }
}

/// Outcome of a sample-by-sample comparison
///
/// Every divergent sample is listed; nothing is raised part-way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub compared: usize,
    pub tolerance: f64,
    pub max_abs_error: f64,
    pub mismatches: Vec<ValidationMismatch>,
}

impl ComparisonResult {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// List every sample where `|actual - expected| > tolerance`
///
/// Only the common prefix is compared; a length difference shows up as
/// `compared` being shorter than either input.
pub fn compare(expected: &[f64], actual: &[f64], tolerance: f64) -> ComparisonResult {
    let mut max_abs_error = 0.0f64;
    let mut mismatches = Vec::new();

    for (index, (&e, &a)) in expected.iter().zip(actual).enumerate() {
        let err = (a - e).abs();
        max_abs_error = max_abs_error.max(err);
        if err > tolerance {
            mismatches.push(ValidationMismatch {
                index,
                expected: e,
                actual: a,
            });
        }
    }

    ComparisonResult {
        compared: expected.len().min(actual.len()),
        tolerance,
        max_abs_error,
        mismatches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_evaluate_known_error() {
        let reference = [1.0, -1.0, 1.0, -1.0];
        let actual = [0.9, -0.9, 0.9, -0.9];
        let metrics = evaluate(&reference, &actual).unwrap();
        assert_relative_eq!(metrics.mse, 0.01, epsilon = 1e-12);
        assert_relative_eq!(metrics.snr_db, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_evaluate_exact_match_is_infinite() {
        let metrics = evaluate(&[0.5, 0.25], &[0.5, 0.25]).unwrap();
        assert!(metrics.is_exact());
        assert_eq!(metrics.snr_db, f64::INFINITY);
    }

    #[test]
    fn test_evaluate_rejects_bad_lengths() {
        assert!(evaluate(&[], &[]).is_err());
        assert!(evaluate(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_compare_lists_all_mismatches() {
        let result = compare(&[0.0, 1.0, 2.0, 3.0], &[0.0, 1.5, 2.0, 1.0], 0.25);
        assert!(!result.passed());
        assert_eq!(result.compared, 4);
        let indices: Vec<usize> = result.mismatches.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![1, 3]);
        assert_eq!(result.mismatches[1].difference(), -2.0);
        assert_eq!(result.max_abs_error, 2.0);
    }

    #[test]
    fn test_compare_within_tolerance() {
        let result = compare(&[1.0, 2.0], &[1.003, 1.997], 1.0 / 256.0);
        assert!(result.passed());
        assert!(result.max_abs_error < 1.0 / 256.0);
    }

    #[test]
    fn test_compare_tolerance_edge_is_inclusive() {
        let lsb = 1.0 / 256.0;
        assert!(compare(&[0.0, 1.0], &[lsb, 1.0 - lsb], lsb).passed());

        let result = compare(&[0.0], &[2.0 * lsb], lsb);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].index, 0);
    }
}
