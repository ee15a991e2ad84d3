use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "kira-proteomicsqc",
    version,
    about = "Per-protein quality control for patient × timepoint proteomics tables"
)]
pub struct Cli {
    #[arg(long, global = true, default_value_t = false, help = "Debug-level logging")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Run(RunArgs),
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[arg(long, help = "Input table (CSV or TSV, optionally .gz)")]
    pub input: PathBuf,

    #[arg(long)]
    pub out: PathBuf,

    #[arg(long, help = "Second table to outer-join on PatientID/Timepoint")]
    pub merge: Option<PathBuf>,

    #[arg(long, help = "JSON threshold profile; absent keys keep defaults")]
    pub thresholds: Option<PathBuf>,

    #[arg(long)]
    pub top_n: Option<usize>,

    #[arg(long)]
    pub iqr_multiplier: Option<f64>,

    #[arg(long)]
    pub z_threshold: Option<f64>,

    #[arg(long, value_enum)]
    pub cv_basis: Option<CvBasisArg>,

    #[arg(long, help = "Minimum % of records with a value to keep a protein in cleaned_data.tsv")]
    pub min_coverage: Option<f64>,

    #[arg(long, default_value_t = 0, help = "Number of threads (0 = auto)")]
    pub threads: usize,

    #[arg(long, value_enum, default_value_t = RunModeArg::Standalone)]
    pub run_mode: RunModeArg,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[arg(long, help = "Input table (CSV or TSV, optionally .gz)")]
    pub input: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CvBasisArg {
    NonZero,
    NonMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunModeArg {
    Standalone,
    Pipeline,
}
