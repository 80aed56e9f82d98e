use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

use foldfir::config::PipelineConfig;
use foldfir::fixed_point::{FixedFormat, OverflowPolicy, table};
use foldfir::validation::{SweepParameter, SweepReport, SweepStimulus};
use foldfir::{Pipeline, PipelineOutput};

#[derive(Parser, Debug)]
#[command(name = "foldfir")]
#[command(about = "Design, quantize and verify a folded fixed-point lowpass FIR", long_about = None)]
struct Args {
    /// TOML configuration file; unset fields keep their defaults
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Directory for coefficient, table, vector and report files
    #[arg(short = 'o', long, default_value = "foldfir_out")]
    output_dir: PathBuf,

    /// Number of taps (odd)
    #[arg(short = 't', long)]
    taps: Option<usize>,

    /// Transition-band center in Hz
    #[arg(long)]
    cutoff: Option<f64>,

    /// Coefficient format, e.g. "q8.8" or "q1.15"
    #[arg(long)]
    coeff_format: Option<FixedFormat>,

    /// Data format of input and output samples
    #[arg(long)]
    data_format: Option<FixedFormat>,

    /// Overflow policy for simulation
    #[arg(long, value_enum)]
    overflow: Option<OverflowPolicy>,

    /// Sweep a design parameter instead of a single run
    #[arg(long, value_enum)]
    sweep: Option<SweepParameter>,

    /// Comma-separated sweep values
    #[arg(long, value_delimiter = ',', requires = "sweep")]
    values: Vec<f64>,

    /// Increase output verbosity
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = build_config(&args)?;
    let pipeline = Pipeline::new(config).context("Invalid filter configuration")?;

    fs::create_dir_all(&args.output_dir).context("Failed to create output directory")?;

    match args.sweep {
        Some(parameter) => {
            let spec = &pipeline.config().design;
            let stimulus = SweepStimulus::two_tone(
                2000,
                0.4 * spec.passband_hz,
                0.5 * (spec.stopband_hz + spec.nyquist()),
                spec.sample_rate,
                0.45,
            );
            let report = pipeline.sweep(parameter, &args.values, &stimulus);
            print_sweep(&report);
            let path = args.output_dir.join("sweep.json");
            write_json(&path, &report)?;
            println!("Wrote {}", path.display());
        }
        None => {
            let output = pipeline.run().context("Pipeline failed")?;
            print_summary(&output);
            for path in save_artifacts(&output, &args.output_dir)? {
                println!("Wrote {}", path.display());
            }
        }
    }

    Ok(())
}

fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match args.config {
        Some(ref path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(taps) = args.taps {
        config.design.taps = taps;
    }
    if let Some(cutoff) = args.cutoff {
        config.design = config.design.with_cutoff(cutoff);
    }
    if let Some(format) = args.coeff_format {
        config.quantization.coefficient_format = format;
    }
    if let Some(format) = args.data_format {
        config.engine.data_format = format;
    }
    if let Some(policy) = args.overflow {
        config.engine.overflow = policy;
    }
    Ok(config)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize report")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn save_artifacts(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let path = dir.join("coefficients.txt");
    output
        .coefficients
        .save(&path)
        .context("Failed to write coefficient file")?;
    written.push(path);

    let path = dir.join("coefficients.mem");
    table::save_table(&output.table, &path).context("Failed to write coefficient table")?;
    written.push(path);

    for set in &output.vectors {
        written.extend(
            set.save(dir)
                .with_context(|| format!("Failed to write '{}' test vectors", set.name))?,
        );
    }

    let path = dir.join("report.json");
    write_json(&path, &output.report)?;
    written.push(path);

    Ok(written)
}

fn print_summary(output: &PipelineOutput) {
    let report = &output.report;
    println!("=== Folded FIR ===");
    println!(
        "Taps: {} ({} folded multipliers)",
        report.taps,
        output.table.len()
    );
    println!(
        "Coefficients: {}, data: {}, accumulator: {} bits ({} guard)",
        report.coefficient_format, report.data_format, report.accumulator_bits, report.guard_bits
    );
    println!(
        "DC gain: design {:.6}, fixed {:.6}",
        report.dc_gain, report.fixed_dc_gain
    );
    println!(
        "Output vs design: SNR {:.2} dB, MSE {:.3e}",
        report.output.snr_db, report.output.mse
    );
    println!(
        "Response: {:?} (max error {:.5}, MSE {:.3e})",
        report.response.verdict, report.response.max_error, report.response.mse
    );
    println!(
        "Implementation check: {} of {} samples beyond {} LSB",
        report.implementation.mismatches.len(),
        report.implementation.compared,
        report.implementation.tolerance / report.data_format.lsb()
    );
    println!();
    println!("{:>6} {:>8} {:>12} {:>12} {:>12}", "Bits", "Format", "Max |e|", "Mean |e|", "MSE");
    for w in &report.bit_widths {
        println!(
            "{:>6} {:>8} {:>12.3e} {:>12.3e} {:>12.3e}",
            w.bits,
            w.format.to_string(),
            w.max_abs_error,
            w.mean_abs_error,
            w.mse
        );
    }
    if !report.faults.is_empty() {
        println!();
        println!("{} simulation overflows", report.faults.len());
    }
    println!();
}

fn print_sweep(report: &SweepReport) {
    println!("=== Sweep over {:?} ===", report.parameter);
    println!("{:>10} {:>10} {:>12} {:>10}", "Value", "SNR dB", "Quant dB", "Faults");
    for point in &report.points {
        match point.scores() {
            Some(s) => println!(
                "{:>10} {:>10.2} {:>12.2} {:>10}",
                point.value, s.snr_db, s.quantization_snr_db, s.faults
            ),
            None => println!("{:>10} {:>10}", point.value, "skipped"),
        }
    }
    for m in &report.mismatches {
        println!(
            "Mismatch at {}: quantization SNR {:.2} dB below {:.2} dB",
            m.value, m.quantization_snr_db, m.min_snr_db
        );
    }
    println!();
}
