use crate::config::PipelineConfig;
use crate::design::{CoefficientVector, design};
use crate::engine::FoldedFirEngine;
use crate::error::Result;
use crate::fixed_point::{FoldedCoefficients, QuantizedCoefficients, compensate_gain, fold, quantize};
use crate::signals::{mix, standard_stimuli, to_fixed, tone};
use crate::validation::{
    SweepParameter, SweepReport, SweepStimulus, TestVectorSet, ValidationReport,
    generate_test_vectors, report, sweep,
};

/// Samples in the evaluation stimulus
const EVALUATION_LEN: usize = 500;

/// Artifacts of one design-to-engine run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub coefficients: CoefficientVector,
    pub quantized: QuantizedCoefficients,
    /// Folded, gain-compensated table loaded into the engine
    pub table: FoldedCoefficients,
    /// Engine in reset, ready for streaming
    pub engine: FoldedFirEngine,
    pub report: ValidationReport,
    pub vectors: Vec<TestVectorSet>,
}

/// Design, quantize, fold, compensate, build the engine and validate it
///
/// Stages hand their results on by value; nothing is shared between runs.
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.design.validate()?;
        config.quantization.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn design(&self) -> Result<CoefficientVector> {
        design(&self.config.design)
    }

    /// Quantize and fold a design, then correct its DC gain
    pub fn quantize(
        &self,
        coeffs: &CoefficientVector,
    ) -> Result<(QuantizedCoefficients, FoldedCoefficients)> {
        let q = &self.config.quantization;
        let quantized = quantize(coeffs, q.coefficient_format);
        log::debug!(
            "Quantized {} taps to {}, coefficient MSE {:.3e}",
            quantized.num_taps(),
            q.coefficient_format,
            quantized.mean_squared_error()
        );
        let table = compensate_gain(&fold(&quantized)?, q.target_gain)?;
        Ok((quantized, table))
    }

    pub fn build_engine(&self, table: FoldedCoefficients) -> Result<FoldedFirEngine> {
        let mut engine = FoldedFirEngine::new(table, &self.config.engine)?;
        engine.reset();
        Ok(engine)
    }

    /// Three tones at 5%, 12% and 25% of the sample rate, scaled to fit the
    /// engine's data format
    pub fn evaluation_stimulus(&self) -> Vec<f64> {
        let fs = self.config.design.sample_rate;
        let format = self.config.engine.data_format;
        let peak = 0.9 * format.to_real(format.max_raw());
        let scale = (peak / 1.8).min(1.0);

        let a = tone(EVALUATION_LEN, 0.05 * fs, fs, scale);
        let b = tone(EVALUATION_LEN, 0.12 * fs, fs, 0.5 * scale);
        let c = tone(EVALUATION_LEN, 0.25 * fs, fs, 0.3 * scale);
        mix(&[&a, &b, &c])
    }

    /// Golden vectors for the `dc`, `sine_low` and `step` stimuli
    pub fn test_vectors(&self, table: &FoldedCoefficients) -> Result<Vec<TestVectorSet>> {
        let format = self.config.engine.data_format;
        standard_stimuli()
            .into_iter()
            .map(|(name, signal)| {
                generate_test_vectors(name, table, &self.config.engine, &to_fixed(&signal, format))
            })
            .collect()
    }

    pub fn run(&self) -> Result<PipelineOutput> {
        let coefficients = self.design()?;
        let (quantized, table) = self.quantize(&coefficients)?;
        let engine = self.build_engine(table.clone())?;

        let report = report(
            &coefficients,
            &engine,
            &self.evaluation_stimulus(),
            &self.config.validation,
        )?;
        let vectors = self.test_vectors(&table)?;

        log::info!(
            "Pipeline complete: {} taps folded to {} multipliers, {} vector sets",
            coefficients.num_taps(),
            table.len(),
            vectors.len()
        );

        Ok(PipelineOutput {
            coefficients,
            quantized,
            table,
            engine,
            report,
            vectors,
        })
    }

    /// Sweep one parameter with every other setting taken from this pipeline
    pub fn sweep(
        &self,
        parameter: SweepParameter,
        values: &[f64],
        stimulus: &SweepStimulus,
    ) -> SweepReport {
        sweep(&self.config, parameter, values, stimulus)
    }
}
