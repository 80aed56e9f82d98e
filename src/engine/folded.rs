use serde::Serialize;

use crate::config::EngineConfig;
use crate::engine::{AccumulatorSpec, SampleFilter};
use crate::error::{FirError, Result};
use crate::fixed_point::{FixedFormat, FoldedCoefficients, OverflowPolicy, fits_signed};

/// Engine control state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineState {
    /// Reset asserted (or never released); delay line and output are zero
    Reset,
    /// Clocking samples
    Running,
}

/// Where an out-of-range value was caught
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowStage {
    /// Input word wider than the data format
    Input,
    /// Sum of products beyond the declared accumulator width
    Accumulator,
    /// Scaled result wider than the data format
    Output,
}

/// One recorded simulation overflow
///
/// Faults are logged and the run continues with the configured policy
/// applied, so test-vector generation stays deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverflowFault {
    /// Clock edge on which the overflow happened
    pub cycle: u64,
    pub stage: OverflowStage,
    /// Value before the overflow policy was applied
    pub value: i128,
}

/// Result of evaluating one clock edge, not yet committed
#[derive(Debug, Clone)]
struct Evaluation {
    sample: i32,
    output: i32,
    faults: Vec<OverflowFault>,
}

/// Cycle-accurate folded FIR engine
///
/// Models the synchronous hardware: a `T`-deep delay line, `H = (T+1)/2`
/// multipliers fed by pre-added mirrored pairs, a declared-width accumulator
/// and a registered output. Each clock edge is evaluated from the current
/// state and input, then committed in one step.
///
/// # Example
/// ```
/// use foldfir::config::EngineConfig;
/// use foldfir::engine::FoldedFirEngine;
/// use foldfir::fixed_point::{FixedFormat, FoldedCoefficients};
///
/// let table = FoldedCoefficients::from_raw(FixedFormat::Q8_8, vec![32, 64, 64]).unwrap();
/// let mut engine = FoldedFirEngine::new(table, &EngineConfig::default()).unwrap();
/// let out: Vec<i32> = [256, 0, 0, 0, 0, 0].iter().map(|&x| engine.step(x)).collect();
/// assert_eq!(out, vec![32, 64, 64, 64, 32, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct FoldedFirEngine {
    coeffs: FoldedCoefficients,
    data_format: FixedFormat,
    accumulator: AccumulatorSpec,
    overflow: OverflowPolicy,
    shift: u32,
    // Ring buffer of the last T inputs; `head` is the slot written next
    delay_line: Vec<i32>,
    head: usize,
    output: i32,
    state: EngineState,
    cycle: u64,
    faults: Vec<OverflowFault>,
}

impl FoldedFirEngine {
    /// Create an engine for a folded table
    ///
    /// # Errors
    /// `FirError::Config` if a configured shift differs from the table's
    /// fractional bits or the accumulator would exceed its maximum width.
    pub fn new(coeffs: FoldedCoefficients, config: &EngineConfig) -> Result<Self> {
        let frac_bits = coeffs.format().frac_bits();
        if let Some(shift) = config.shift
            && shift != frac_bits
        {
            return Err(FirError::Config(format!(
                "output shift {} does not match coefficient format {} ({} fractional bits)",
                shift,
                coeffs.format(),
                frac_bits
            )));
        }

        let accumulator =
            AccumulatorSpec::for_table(config.data_format, &coeffs, config.guard_bits)?;
        log::debug!(
            "Folded engine: {} taps, {} multipliers, {}-bit accumulator ({} guard bits), {:?}",
            coeffs.num_taps(),
            coeffs.len(),
            accumulator.width(),
            accumulator.guard_bits,
            config.overflow
        );

        Ok(Self {
            delay_line: vec![0; coeffs.num_taps()],
            coeffs,
            data_format: config.data_format,
            accumulator,
            overflow: config.overflow,
            shift: frac_bits,
            head: 0,
            output: 0,
            state: EngineState::Reset,
            cycle: 0,
            faults: Vec::new(),
        })
    }

    /// One clock edge of the hardware port
    ///
    /// With `reset` asserted the delay line and output register clear and the
    /// engine holds in `Reset`; otherwise `sample` is shifted in and the new
    /// registered output returned.
    pub fn tick(&mut self, reset: bool, sample: i32) -> i32 {
        if reset {
            self.delay_line.fill(0);
            self.head = 0;
            self.output = 0;
            self.state = EngineState::Reset;
            self.cycle += 1;
            return 0;
        }
        let evaluation = self.evaluate(sample);
        self.commit(evaluation);
        self.output
    }

    /// Clock one sample with reset released
    pub fn step(&mut self, sample: i32) -> i32 {
        self.tick(false, sample)
    }

    /// Assert reset for one clock edge
    pub fn reset(&mut self) {
        self.tick(true, 0);
    }

    /// Sample at delay `k` after shifting `incoming` in
    fn shifted(&self, incoming: i32, k: usize) -> i32 {
        if k == 0 {
            incoming
        } else {
            let n = self.delay_line.len();
            self.delay_line[(self.head + n - k) % n]
        }
    }

    fn evaluate(&self, sample: i32) -> Evaluation {
        let mut faults = Vec::new();
        let data_bits = self.data_format.total_bits();

        let sample = if fits_signed(sample as i128, data_bits) {
            sample
        } else {
            faults.push(OverflowFault {
                cycle: self.cycle,
                stage: OverflowStage::Input,
                value: sample as i128,
            });
            self.overflow.apply(sample as i128, data_bits) as i32
        };

        let taps = self.delay_line.len();
        let center = self.coeffs.center_index();
        let values = self.coeffs.values();

        let mut acc = values[center] as i128 * self.shifted(sample, center) as i128;
        for (i, &c) in values[..center].iter().enumerate() {
            let pair_sum =
                self.shifted(sample, i) as i64 + self.shifted(sample, taps - 1 - i) as i64;
            acc += c as i128 * pair_sum as i128;
        }

        let acc_bits = self.accumulator.width();
        if !fits_signed(acc, acc_bits) {
            faults.push(OverflowFault {
                cycle: self.cycle,
                stage: OverflowStage::Accumulator,
                value: acc,
            });
            acc = self.overflow.apply(acc, acc_bits);
        }

        let scaled = acc >> self.shift;
        let output = if fits_signed(scaled, data_bits) {
            scaled as i32
        } else {
            faults.push(OverflowFault {
                cycle: self.cycle,
                stage: OverflowStage::Output,
                value: scaled,
            });
            self.overflow.apply(scaled, data_bits) as i32
        };

        Evaluation {
            sample,
            output,
            faults,
        }
    }

    fn commit(&mut self, evaluation: Evaluation) {
        for fault in &evaluation.faults {
            log::warn!(
                "Simulation overflow at cycle {} ({:?}): {}",
                fault.cycle,
                fault.stage,
                fault.value
            );
        }
        self.faults.extend(evaluation.faults);

        self.delay_line[self.head] = evaluation.sample;
        self.head = (self.head + 1) % self.delay_line.len();
        self.output = evaluation.output;
        self.state = EngineState::Running;
        self.cycle += 1;
    }

    /// Run a whole input sequence, returning one output per input
    pub fn run(&mut self, input: &[i32]) -> Vec<i32> {
        input.iter().map(|&x| self.step(x)).collect()
    }

    pub fn coefficients(&self) -> &FoldedCoefficients {
        &self.coeffs
    }

    pub fn data_format(&self) -> FixedFormat {
        self.data_format
    }

    pub fn accumulator(&self) -> AccumulatorSpec {
        self.accumulator
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow
    }

    /// Right shift applied to the accumulator, equal to the table's
    /// fractional bits
    pub fn shift(&self) -> u32 {
        self.shift
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Current registered output
    pub fn output(&self) -> i32 {
        self.output
    }

    /// Clock edges seen since construction, reset edges included
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Cycles from an impulse to the center tap's contribution, `H - 1`
    pub fn latency(&self) -> usize {
        self.coeffs.center_index()
    }

    /// Delay line contents, newest sample first
    pub fn delay_line(&self) -> Vec<i32> {
        let n = self.delay_line.len();
        (1..=n)
            .map(|k| self.delay_line[(self.head + n - k) % n])
            .collect()
    }

    pub fn faults(&self) -> &[OverflowFault] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<OverflowFault> {
        std::mem::take(&mut self.faults)
    }
}

impl SampleFilter for FoldedFirEngine {
    type Sample = i32;

    fn process(&mut self, sample: i32) -> i32 {
        self.step(sample)
    }
}
