use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "lambar - free-energy estimation and λ-schedule optimization for alchemical simulation trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Estimate a free-energy difference and its convergence table from one paired trajectory file.
    Analyze(AnalyzeArgs),
    /// Redistribute λ states along a schedule so per-interval error is equalized.
    Optimize(OptimizeArgs),
    /// Aggregate convergence tables from many windows into campaign-level error summaries.
    Batch(BatchArgs),
}

/// Arguments for the `analyze` subcommand.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the paired trajectory file (Tinker BAR format).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path for the output convergence table (CSV). Defaults to stdout.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the simulation temperature in Kelvin.
    #[arg(short, long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Override the simulation pressure in bar.
    #[arg(short, long, value_name = "FLOAT")]
    pub pressure: Option<f64>,

    /// Override the RNG seed for the bootstrap resampler.
    #[arg(short, long, value_name = "INT")]
    pub seed: Option<u64>,
}

/// Arguments for the `optimize` subcommand.
#[derive(Args, Debug)]
pub struct OptimizeArgs {
    /// Path to the current λ grid, one whitespace-separated row per state.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub grid: PathBuf,

    /// Path to the per-interval error values, one per line.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub errors: PathBuf,

    /// Number of states in the new schedule. Defaults to the current count.
    #[arg(short = 'n', long, value_name = "INT")]
    pub states: Option<usize>,

    /// Write one keyword file per state with this path prefix.
    #[arg(short, long, value_name = "PREFIX")]
    pub output: Option<PathBuf>,

    /// λ variable names for the keyword files, in column order.
    #[arg(
        long,
        value_name = "NAMES",
        value_delimiter = ',',
        default_value = "vdw-lambda,ele-lambda"
    )]
    pub names: Vec<String>,
}

/// Arguments for the `batch` subcommand.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Convergence table files (CSV), one per window.
    #[arg(required = true, value_name = "PATHS")]
    pub tables: Vec<PathBuf>,
}
