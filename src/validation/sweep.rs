use std::collections::BTreeMap;
use std::thread;

use crossbeam_channel::unbounded;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::design::design;
use crate::engine::{FirFilterCore, FoldedFirEngine, SampleFilter};
use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, compensate_gain, fold, quantize};
use crate::signals::{from_fixed, mix, to_fixed, tone};
use crate::validation::evaluate;

/// Design parameter varied across a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SweepParameter {
    /// Filter length; values must be odd integers
    Taps,
    /// Passband edge in Hz, transition width held
    Cutoff,
    /// Coefficient fractional bits, word width held
    FracBits,
}

/// Input signal and the ideal filtered signal it should produce
#[derive(Debug, Clone, PartialEq)]
pub struct SweepStimulus {
    pub input: Vec<f64>,
    pub reference: Vec<f64>,
}

impl SweepStimulus {
    pub fn new(input: Vec<f64>, reference: Vec<f64>) -> Self {
        Self { input, reference }
    }

    /// A passband tone plus a stopband tone; the reference is the passband
    /// tone alone
    pub fn two_tone(
        len: usize,
        pass_hz: f64,
        stop_hz: f64,
        sample_rate: f64,
        amplitude: f64,
    ) -> Self {
        let pass = tone(len, pass_hz, sample_rate, amplitude);
        let stop = tone(len, stop_hz, sample_rate, amplitude);
        Self {
            input: mix(&[&pass, &stop]),
            reference: pass,
        }
    }

    /// Add seeded white noise at `snr_db` to the input only
    #[cfg(feature = "simulation")]
    pub fn with_noise(mut self, snr_db: f64, seed: u64) -> Self {
        self.input = crate::simulation::add_white_noise(&self.input, snr_db, Some(seed));
        self
    }
}

/// Scores for one evaluated sweep point
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointScores {
    /// Engine output vs. the stimulus reference, group delay removed
    pub snr_db: f64,
    pub mse: f64,
    /// Engine output vs. the floating design's output
    pub quantization_snr_db: f64,
    pub quantization_mse: f64,
    /// Simulation overflows recorded while running the stimulus
    pub faults: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SweepOutcome {
    Evaluated(PointScores),
    /// The point's design, quantization or engine setup failed
    Skipped { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub value: f64,
    pub outcome: SweepOutcome,
}

impl SweepPoint {
    pub fn scores(&self) -> Option<&PointScores> {
        match &self.outcome {
            SweepOutcome::Evaluated(scores) => Some(scores),
            SweepOutcome::Skipped { .. } => None,
        }
    }
}

/// An evaluated point whose fixed vs. floating SNR missed the threshold
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepMismatch {
    pub value: f64,
    pub quantization_snr_db: f64,
    pub min_snr_db: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepReport {
    pub parameter: SweepParameter,
    /// One entry per requested value, in request order
    pub points: Vec<SweepPoint>,
    pub mismatches: Vec<SweepMismatch>,
}

impl SweepReport {
    pub fn evaluated(&self) -> impl Iterator<Item = (f64, &PointScores)> {
        self.points
            .iter()
            .filter_map(|p| p.scores().map(|s| (p.value, s)))
    }

    pub fn skipped(&self) -> usize {
        self.points.iter().filter(|p| p.scores().is_none()).count()
    }

    /// Evaluated points whose SNR fell more than `residual_db` below the best
    /// SNR seen at an earlier point
    pub fn trend_violations(&self, residual_db: f64) -> Vec<(f64, f64)> {
        let mut best = f64::NEG_INFINITY;
        let mut violations = Vec::new();
        for (value, scores) in self.evaluated() {
            if scores.snr_db < best - residual_db {
                violations.push((value, scores.snr_db));
            }
            best = best.max(scores.snr_db);
        }
        violations
    }
}

/// Apply one sweep value to a copy of the configuration
fn configure(base: &PipelineConfig, parameter: SweepParameter, value: f64) -> Result<PipelineConfig> {
    let mut config = base.clone();
    match parameter {
        SweepParameter::Taps => {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(FirError::Config(format!("tap count {} is not an integer", value)));
            }
            config.design = config.design.with_taps(value as usize);
        }
        SweepParameter::Cutoff => {
            config.design = config.design.with_cutoff(value);
        }
        SweepParameter::FracBits => {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(FirError::Config(format!(
                    "fractional bit count {} is not an integer",
                    value
                )));
            }
            let total = config.quantization.coefficient_format.total_bits();
            config.quantization.coefficient_format = FixedFormat::new(total, value as u32)?;
            config.engine.shift = None;
        }
    }
    Ok(config)
}

fn evaluate_point(
    base: &PipelineConfig,
    parameter: SweepParameter,
    value: f64,
    stimulus: &SweepStimulus,
) -> Result<PointScores> {
    let config = configure(base, parameter, value)?;
    let coeffs = design(&config.design)?;
    let quantized = quantize(&coeffs, config.quantization.coefficient_format);
    let table = compensate_gain(&fold(&quantized)?, config.quantization.target_gain)?;
    let mut engine = FoldedFirEngine::new(table, &config.engine)?;

    let taps = coeffs.num_taps();
    let delay = coeffs.group_delay_samples();
    let len = stimulus.input.len().min(stimulus.reference.len());
    if len < taps {
        return Err(FirError::Config(format!(
            "stimulus of {} samples is shorter than the {}-tap filter",
            len, taps
        )));
    }

    let data_format = config.engine.data_format;
    let fixed_out = from_fixed(&engine.run(&to_fixed(&stimulus.input[..len], data_format)), data_format);
    let float_out = FirFilterCore::new(coeffs.taps().to_vec()).filter(&stimulus.input[..len]);

    // Skip the T-1 samples before the delay line fills
    let warm = taps - 1;
    let against_reference = evaluate(&stimulus.reference[warm - delay..len - delay], &fixed_out[warm..])?;
    let against_design = evaluate(&float_out[warm..], &fixed_out[warm..])?;

    Ok(PointScores {
        snr_db: against_reference.snr_db,
        mse: against_reference.mse,
        quantization_snr_db: against_design.snr_db,
        quantization_mse: against_design.mse,
        faults: engine.faults().len(),
    })
}

/// Run the full design-to-engine chain for every value of `parameter`
///
/// Points are spread over scoped worker threads fed from a channel and
/// reassembled in request order. A point that fails to design or quantize is
/// kept as `Skipped`; it never aborts the sweep.
pub fn sweep(
    config: &PipelineConfig,
    parameter: SweepParameter,
    values: &[f64],
    stimulus: &SweepStimulus,
) -> SweepReport {
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, values.len().max(1));
    log::info!(
        "Sweeping {:?} over {} values on {} workers",
        parameter,
        values.len(),
        workers
    );

    let (job_tx, job_rx) = unbounded::<(usize, f64)>();
    let (result_tx, result_rx) = unbounded::<(usize, SweepPoint)>();
    for job in values.iter().copied().enumerate() {
        if job_tx.send(job).is_err() {
            break;
        }
    }
    drop(job_tx);

    thread::scope(|s| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            s.spawn(move || {
                for (index, value) in job_rx.iter() {
                    let outcome = match evaluate_point(config, parameter, value, stimulus) {
                        Ok(scores) => SweepOutcome::Evaluated(scores),
                        Err(e) => {
                            log::warn!("Sweep point {:?} = {} skipped: {}", parameter, value, e);
                            SweepOutcome::Skipped {
                                error: e.to_string(),
                            }
                        }
                    };
                    if result_tx.send((index, SweepPoint { value, outcome })).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let ordered: BTreeMap<usize, SweepPoint> = result_rx.iter().collect();
    let points: Vec<SweepPoint> = ordered.into_values().collect();

    let min_snr_db = config.validation.min_snr_db;
    let mismatches = points
        .iter()
        .filter_map(|p| {
            p.scores()
                .filter(|s| s.quantization_snr_db < min_snr_db)
                .map(|s| SweepMismatch {
                    value: p.value,
                    quantization_snr_db: s.quantization_snr_db,
                    min_snr_db,
                })
        })
        .collect();

    SweepReport {
        parameter,
        points,
        mismatches,
    }
}
