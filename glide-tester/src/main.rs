use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use glide_sim::{FlightConditionsDistribution, SimulationConfig};
use glide_tester::logic::{
    ComparisonRun, DEFAULT_POLICIES, ResultStore, RunOptions, reports, resolve_policies,
    run_comparison, split_csv,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Coloured summary for terminals
    Console,
    /// Full comparison as JSON
    Json,
    /// Markdown table
    Markdown,
    /// One CSV row per policy
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "glide-tester", version = "0.1.0")]
#[command(about = "Monte Carlo comparison of thermal decision policies for cross-country gliding")]
struct Args {
    /// Policies to compare (comma-separated: never, always, three-zones:P:L, learned:PATH, all)
    #[arg(long, default_value = DEFAULT_POLICIES)]
    policies: String,

    /// Flights simulated per policy
    #[arg(long, default_value_t = 100)]
    flights: usize,

    /// Batch seed shared by every policy
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Lower bound of the per-flight climb mean (m/s)
    #[arg(long)]
    climb_mean_min: Option<f64>,

    /// Upper bound of the per-flight climb mean (m/s)
    #[arg(long)]
    climb_mean_max: Option<f64>,

    /// Simulation config JSON (distribution, aircraft, climb step)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory caching simulated batches between runs
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Abort on the first failing flight instead of reporting it
    #[arg(long)]
    fail_fast: bool,

    /// Fly batches on the calling thread
    #[arg(long)]
    sequential: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    announce_banner();
    let start_time = Instant::now();

    let config = load_config(&args)?;
    let policies = resolve_policies(&split_csv(&args.policies))?;
    let store = args
        .cache_dir
        .as_deref()
        .map(ResultStore::open)
        .transpose()
        .context("cannot open cache directory")?;

    let options = RunOptions {
        config,
        flights: args.flights,
        seed: args.seed,
        fail_fast: args.fail_fast,
        parallel: !args.sequential,
        verbose: args.verbose,
    };
    let run = run_comparison(&options, &policies, store.as_ref())?;

    write_reports(&args, &run, start_time)?;

    let failures = run.failure_count();
    if failures > 0 {
        eprintln!(
            "{} {failures} flights failed and were left out of the summaries",
            "⚠️ ".yellow()
        );
    }
    Ok(())
}

fn announce_banner() {
    eprintln!("{}", "🪂 Glide Policy Tester".bright_cyan().bold());
    eprintln!("{}", "======================".cyan());
}

fn load_config(args: &Args) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => SimulationConfig::default_config(),
    };
    apply_climb_overrides(&mut config, args.climb_mean_min, args.climb_mean_max)?;
    config.validate().context("invalid simulation configuration")?;
    Ok(config)
}

fn read_config(path: &Path) -> Result<SimulationConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SimulationConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn apply_climb_overrides(
    config: &mut SimulationConfig,
    min: Option<f64>,
    max: Option<f64>,
) -> Result<()> {
    if min.is_none() && max.is_none() {
        return Ok(());
    }
    let FlightConditionsDistribution::ClimbMeanRange(range) = &mut config.distribution else {
        bail!("--climb-mean-min/--climb-mean-max need a climb_mean_range distribution");
    };
    if let Some(min) = min {
        range.climb_mean_min_m_s = min;
    }
    if let Some(max) = max {
        range.climb_mean_max_m_s = max;
    }
    Ok(())
}

fn write_reports(args: &Args, run: &ComparisonRun, start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, run)?,
        ReportFormat::Markdown => reports::generate_markdown_report(&mut output_target, run)?,
        ReportFormat::Csv => reports::generate_csv_report(&mut output_target, run)?,
        ReportFormat::Console => {
            reports::generate_console_report(&mut output_target, run, start_time.elapsed())?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Stdout(w) => w.write(buf),
            Self::File(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn climb_overrides_update_range() {
        let mut config = SimulationConfig::default_config();
        apply_climb_overrides(&mut config, Some(1.0), Some(2.5)).unwrap();
        let FlightConditionsDistribution::ClimbMeanRange(range) = &config.distribution else {
            panic!("expected a climb mean range");
        };
        assert!((range.climb_mean_min_m_s - 1.0).abs() < f64::EPSILON);
        assert!((range.climb_mean_max_m_s - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn climb_overrides_reject_fixed_distribution() {
        let mut config = SimulationConfig {
            distribution: FlightConditionsDistribution::Fixed(Default::default()),
            ..SimulationConfig::default()
        };
        assert!(apply_climb_overrides(&mut config, Some(1.0), None).is_err());
        assert!(apply_climb_overrides(&mut config, None, None).is_ok());
    }

    #[test]
    fn args_parse_with_defaults() {
        let args = Args::parse_from(["glide-tester"]);
        assert_eq!(args.flights, 100);
        assert_eq!(args.report, ReportFormat::Console);
        assert_eq!(args.policies, DEFAULT_POLICIES);
        let args = Args::parse_from(["glide-tester", "--report", "csv", "--sequential"]);
        assert_eq!(args.report, ReportFormat::Csv);
        assert!(args.sequential);
    }
}
