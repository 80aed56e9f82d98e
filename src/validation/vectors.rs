use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::{FoldedFirEngine, OverflowFault};
use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, FoldedCoefficients};
use crate::validation::{ComparisonResult, compare};

/// One input word and the output the hardware must produce on that clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TestVector {
    pub input: i32,
    pub expected: i32,
}

/// Golden vectors for one stimulus
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestVectorSet {
    pub name: String,
    pub format: FixedFormat,
    pub vectors: Vec<TestVector>,
    /// Overflows recorded while generating; expected outputs already carry
    /// the configured policy
    pub faults: Vec<OverflowFault>,
}

/// Drive a freshly reset engine through `inputs`
///
/// The engine sees one reset edge and then one clock per input, so repeated
/// calls with the same table, configuration and inputs are identical.
pub fn generate_test_vectors(
    name: &str,
    table: &FoldedCoefficients,
    config: &EngineConfig,
    inputs: &[i32],
) -> Result<TestVectorSet> {
    let mut engine = FoldedFirEngine::new(table.clone(), config)?;
    engine.reset();

    let vectors = inputs
        .iter()
        .map(|&input| TestVector {
            input,
            expected: engine.step(input),
        })
        .collect();
    let faults = engine.take_faults();
    if !faults.is_empty() {
        log::warn!(
            "Test vectors '{}': {} overflow faults while generating",
            name,
            faults.len()
        );
    }

    Ok(TestVectorSet {
        name: name.to_string(),
        format: config.data_format,
        vectors,
        faults,
    })
}

impl TestVectorSet {
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn inputs(&self) -> Vec<i32> {
        self.vectors.iter().map(|v| v.input).collect()
    }

    pub fn expected(&self) -> Vec<i32> {
        self.vectors.iter().map(|v| v.expected).collect()
    }

    /// Decimal CSV with an `input,expected` header
    pub fn to_csv(&self) -> String {
        let mut out = String::from("input,expected\n");
        for v in &self.vectors {
            let _ = writeln!(out, "{},{}", v.input, v.expected);
        }
        out
    }

    /// Parse vectors written by [`TestVectorSet::to_csv`]
    pub fn from_csv(name: &str, format: FixedFormat, text: &str) -> Result<Self> {
        let mut vectors = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || (idx == 0 && line.starts_with("input")) {
                continue;
            }
            let parse = |field: Option<&str>| -> Result<i32> {
                field
                    .map(str::trim)
                    .and_then(|f| f.parse().ok())
                    .ok_or_else(|| FirError::Interchange {
                        line: idx + 1,
                        reason: format!("expected `input,expected`, got '{}'", line),
                    })
            };
            let mut fields = line.split(',');
            let input = parse(fields.next())?;
            let expected = parse(fields.next())?;
            vectors.push(TestVector { input, expected });
        }
        Ok(Self {
            name: name.to_string(),
            format,
            vectors,
            faults: Vec::new(),
        })
    }

    fn memh(&self, values: impl Iterator<Item = i32>) -> String {
        let digits = self.format.total_bits().div_ceil(4) as usize;
        let mut out = String::new();
        for v in values {
            let _ = writeln!(out, "{:0width$X}", self.format.to_bits(v), width = digits);
        }
        out
    }

    /// `$readmemh` image of the input words
    pub fn input_memh(&self) -> String {
        self.memh(self.vectors.iter().map(|v| v.input))
    }

    /// `$readmemh` image of the expected outputs
    pub fn expected_memh(&self) -> String {
        self.memh(self.vectors.iter().map(|v| v.expected))
    }

    /// Write `<name>_vectors.csv`, `<name>_input.mem` and
    /// `<name>_expected.mem` into `dir`
    pub fn save(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let files = [
            (format!("{}_vectors.csv", self.name), self.to_csv()),
            (format!("{}_input.mem", self.name), self.input_memh()),
            (format!("{}_expected.mem", self.name), self.expected_memh()),
        ];
        let mut written = Vec::with_capacity(files.len());
        for (file, content) in files {
            let path = dir.join(file);
            fs::write(&path, content)?;
            written.push(path);
        }
        Ok(written)
    }

    /// Check an implementation's observed outputs against the expected ones,
    /// in output LSBs
    pub fn check(&self, observed: &[i32], tolerance_lsb: f64) -> ComparisonResult {
        let expected: Vec<f64> = self.vectors.iter().map(|v| v.expected as f64).collect();
        let observed: Vec<f64> = observed.iter().map(|&v| v as f64).collect();
        compare(&expected, &observed, tolerance_lsb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FoldedCoefficients {
        FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![32, 64, 64]).unwrap()
    }

    #[test]
    fn test_impulse_vectors() {
        let set =
            generate_test_vectors("impulse", &table(), &EngineConfig::default(), &[256, 0, 0, 0, 0, 0])
                .unwrap();
        assert_eq!(set.expected(), vec![32, 64, 64, 64, 32, 0]);
        assert_eq!(set.inputs(), vec![256, 0, 0, 0, 0, 0]);
        assert!(set.faults.is_empty());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let input = [100, -200, 300, 0, 50, 50, -7];
        let config = EngineConfig::default();
        let a = generate_test_vectors("a", &table(), &config, &input).unwrap();
        let b = generate_test_vectors("a", &table(), &config, &input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_csv_round_trip() {
        let set =
            generate_test_vectors("s", &table(), &EngineConfig::default(), &[256, -256, 0]).unwrap();
        let csv = set.to_csv();
        assert!(csv.starts_with("input,expected\n256,32\n"));
        let parsed = TestVectorSet::from_csv("s", FixedFormat::Q8_8, &csv).unwrap();
        assert_eq!(parsed.vectors, set.vectors);
    }

    #[test]
    fn test_csv_rejects_garbage() {
        let err = TestVectorSet::from_csv("s", FixedFormat::Q8_8, "input,expected\n1,x\n");
        assert!(matches!(err, Err(FirError::Interchange { line: 2, .. })));
    }

    #[test]
    fn test_memh_is_twos_complement() {
        let set = generate_test_vectors("s", &table(), &EngineConfig::default(), &[-1, 256]).unwrap();
        assert_eq!(set.input_memh(), "FFFF\n0100\n");
    }

    #[test]
    fn test_check_reports_divergence() {
        let set =
            generate_test_vectors("s", &table(), &EngineConfig::default(), &[256, 0, 0]).unwrap();
        assert!(set.check(&[32, 64, 64], 0.0).passed());
        let result = set.check(&[32, 66, 64], 1.0);
        assert_eq!(result.mismatches.len(), 1);
        assert_eq!(result.mismatches[0].index, 1);
    }
}
