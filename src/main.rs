//! stressgauge: Stress classification from self-reported vitals.
//!
//! ```text
//! stressgauge --heart-rate 72 --systolic 118 --diastolic 76 --sleep 8 --symptoms none [--json]
//! stressgauge --batch readings.jsonl [--json]
//! ```
//!
//! Exit codes: 0 on success, 1 if a reading was rejected, 2 on usage errors.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use stressgauge::adapters::forest::{ForestConfig, RandomForestModel};
use stressgauge::adapters::sanitize::SanitizingMakeWriter;
use stressgauge::application::{Pipeline, PipelineOutput, SessionLog, TrendAnalysis};
use stressgauge::domain::{Parameter, SymptomSeverity, ValidationError, VitalSigns};
use stressgauge::PipelineError;

const EXIT_REJECTED: i32 = 1;
const EXIT_USAGE: i32 = 2;

#[derive(Debug, PartialEq)]
enum Command {
    Single { vitals: VitalSigns, json: bool },
    /// A well-formed command line carrying a reading that cannot be valid.
    Rejected(ValidationError),
    Batch { path: PathBuf, json: bool },
}

fn usage() -> String {
    "Usage: stressgauge --heart-rate <bpm> --systolic <mmHg> --diastolic <mmHg> --sleep <hours> --symptoms <none|mild|moderate|severe> [--json]\n       stressgauge --batch <file.jsonl> [--json]".to_string()
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
    let value = value.ok_or_else(usage)?;
    value.trim().parse::<T>().map_err(|_| {
        if value.trim().parse::<i128>().is_ok() {
            format!("{flag} value {} is out of range", value.trim())
        } else {
            format!("{flag} expects a number, got {value:?}")
        }
    })
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command, String> {
    let mut args = args.into_iter();
    let mut heart_rate: Option<u16> = None;
    let mut systolic: Option<u16> = None;
    let mut diastolic: Option<u16> = None;
    let mut sleep: Option<f64> = None;
    let mut symptoms: Option<String> = None;
    let mut batch: Option<PathBuf> = None;
    let mut json = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--heart-rate" => heart_rate = Some(parse_number(&arg, args.next())?),
            "--systolic" => systolic = Some(parse_number(&arg, args.next())?),
            "--diastolic" => diastolic = Some(parse_number(&arg, args.next())?),
            "--sleep" => sleep = Some(parse_number(&arg, args.next())?),
            "--symptoms" => symptoms = Some(args.next().ok_or_else(usage)?),
            "--batch" => batch = Some(PathBuf::from(args.next().ok_or_else(usage)?)),
            "--json" => json = true,
            "-h" | "--help" => return Err(usage()),
            other => return Err(format!("Unknown argument {other:?}\n{}", usage())),
        }
    }

    if let Some(path) = batch {
        if heart_rate.is_some()
            || systolic.is_some()
            || diastolic.is_some()
            || sleep.is_some()
            || symptoms.is_some()
        {
            return Err(usage());
        }
        return Ok(Command::Batch { path, json });
    }

    let (Some(heart_rate), Some(systolic), Some(diastolic), Some(sleep)) =
        (heart_rate, systolic, diastolic, sleep)
    else {
        return Err(usage());
    };

    // An unknown severity label is a rejected reading, not a usage error.
    let symptoms = match symptoms.as_deref().map(str::parse::<SymptomSeverity>) {
        None => SymptomSeverity::default(),
        Some(Ok(severity)) => severity,
        Some(Err(e)) => return Ok(Command::Rejected(e)),
    };

    Ok(Command::Single {
        vitals: VitalSigns::new(heart_rate, systolic, diastolic, sleep, symptoms),
        json,
    })
}

fn init_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    // Results go to stdout, so logs default to stderr.
    let log_mode =
        std::env::var("STRESSGAUGE_LOG_MODE").unwrap_or_else(|_| "stderr".to_string());

    let (writer, guard) = match log_mode.as_str() {
        "file" => {
            let log_file = std::env::var("STRESSGAUGE_LOG_FILE")
                .unwrap_or_else(|_| "stressgauge.log".to_string());

            if let Some(parent) = Path::new(&log_file).parent() {
                // Best-effort: don't fail startup just because the directory is missing.
                let _ = std::fs::create_dir_all(parent);
            }

            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_file)
                .with_context(|| format!("Failed to open log file {log_file}"))?;
            tracing_appender::non_blocking(file)
        }
        "stdout" => tracing_appender::non_blocking(std::io::stdout()),
        _ => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    Ok(guard)
}

fn format_value(parameter: Parameter, output: &PipelineOutput) -> String {
    let vitals = output.input.vitals();
    match parameter {
        Parameter::Symptoms => vitals.symptoms.to_string(),
        Parameter::Sleep => format!("{:.1} {}", vitals.sleep_hours, parameter.unit()),
        _ => format!("{} {}", vitals.value(parameter), parameter.unit()),
    }
}

fn print_report(output: &PipelineOutput) {
    let c = &output.classification;
    println!("Stress tier:   {} (confidence {:.0}%)", c.tier, c.confidence * 100.0);
    println!("               {}", c.tier.description());
    println!(
        "Risk score:    {:.2} ({})",
        output.risk.score, output.risk.category
    );
    println!(
        "Priority:      {} - {}",
        output.priority,
        output.priority.action_required()
    );
    println!("Status:        {}", output.summary.overall.description());
    if let Some(primary) = output.primary_factor {
        println!("Primary factor: {}", primary.label());
    }

    println!();
    println!("Parameters:");
    for band in output.bands.values() {
        println!(
            "  {:<26} {:>12}  {}",
            band.parameter.label(),
            format_value(band.parameter, output),
            band.band
        );
    }

    if !output.input.warnings().is_empty() {
        println!();
        println!("Warnings:");
        for warning in output.input.warnings() {
            println!("  ! {warning}");
        }
    }

    if !output.protective_factors.is_empty() {
        println!();
        println!("Protective factors:");
        for text in &output.protective_factors {
            println!("  + {text}");
        }
    }

    println!();
    println!("Recommendations:");
    for text in output.insights.texts() {
        println!("  - {text}");
    }
}

fn print_trend(trend: &TrendAnalysis) {
    match trend {
        TrendAnalysis::InsufficientData { readings } => {
            println!("Trend: insufficient data ({readings} reading(s))");
        }
        TrendAnalysis::Available(summary) => {
            println!("Trend over {} readings:", summary.readings);
            println!("  Stress:      {:?}", summary.stress);
            println!(
                "  Heart rate:  {:?} ({:+.1} bpm/reading)",
                summary.heart_rate, summary.heart_rate_slope
            );
            println!(
                "  Systolic:    {:?} ({:+.1} mmHg/reading)",
                summary.systolic, summary.systolic_slope
            );
            println!(
                "  Prognosis:   {:?} - {}",
                summary.prognosis,
                summary.prognosis.description()
            );
        }
    }
}

/// Returns the process exit code.
fn run_single(
    pipeline: &Pipeline<RandomForestModel>,
    vitals: &VitalSigns,
    json: bool,
) -> Result<i32> {
    match pipeline.run(vitals) {
        Ok(output) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_report(&output);
            }
            Ok(0)
        }
        Err(PipelineError::Validation(e)) => {
            eprintln!("Rejected reading: {e}");
            Ok(EXIT_REJECTED)
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns the process exit code.
fn run_batch(pipeline: &Pipeline<RandomForestModel>, path: &Path, json: bool) -> Result<i32> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file {}", path.display()))?;

    let mut session = SessionLog::new();
    let mut rejected = 0usize;

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let vitals: VitalSigns = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("Line {}: malformed reading: {e}", line_no + 1);
                rejected += 1;
                continue;
            }
        };

        match pipeline.run(&vitals) {
            Ok(output) => {
                if json {
                    println!("{}", serde_json::to_string(&output)?);
                } else {
                    println!("== Reading {} ==", line_no + 1);
                    print_report(&output);
                    println!();
                }
                session.record(vitals, output);
            }
            Err(PipelineError::Validation(e)) => {
                eprintln!("Line {}: rejected reading: {e}", line_no + 1);
                rejected += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Batch complete: {} assessed, {} rejected",
        session.len(),
        rejected
    );

    let trend = session.trend();
    if json {
        println!("{}", serde_json::to_string(&trend)?);
    } else {
        print_trend(&trend);
    }

    Ok(if rejected > 0 { EXIT_REJECTED } else { 0 })
}

fn main() -> Result<()> {
    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(EXIT_USAGE);
        }
    };

    let guard = init_logging()?;

    tracing::info!("Starting stressgauge...");
    let model = RandomForestModel::trained(ForestConfig::from_env_or_default())
        .context("Failed to train stress model")?;
    let pipeline = Pipeline::new(Arc::new(model));

    let code = match &command {
        Command::Single { vitals, json } => run_single(&pipeline, vitals, *json)?,
        Command::Rejected(e) => {
            eprintln!("Rejected reading: {e}");
            EXIT_REJECTED
        }
        Command::Batch { path, json } => run_batch(&pipeline, path, *json)?,
    };

    // Flush buffered log lines before a non-zero exit skips destructors.
    drop(guard);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
