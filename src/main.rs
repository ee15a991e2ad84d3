mod cli;
mod error;
mod input;
mod logging;
mod math;
mod model;
mod pipeline;
mod report;

use std::path::{Path, PathBuf};

use clap::Parser;

use crate::cli::{Cli, Commands, CvBasisArg, RunArgs, RunModeArg, ValidateArgs};
use crate::error::Result;
use crate::input::load_dataset;
use crate::model::thresholds::{CvBasis, QcThresholds};
use crate::pipeline::run_qc;
use crate::pipeline::stage1_load::run_stage1;
use crate::pipeline::stage7_report::{RunMode, Stage7Context, write_reports};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    if let Err(err) = run(cli) {
        tracing::error!("{err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run(args) => run_command(&args),
        Commands::Validate(args) => validate_command(&args),
    }
}

fn run_command(args: &RunArgs) -> Result<()> {
    let thresholds = resolve_thresholds(args)?;
    let run_mode = match args.run_mode {
        RunModeArg::Standalone => RunMode::Standalone,
        RunModeArg::Pipeline => RunMode::Pipeline,
    };
    let out_dir = resolve_output_dir(&args.out, run_mode);

    let loaded = run_stage1(&args.input, args.merge.as_deref())?;
    let run = with_thread_pool(args.threads, || run_qc(loaded, &thresholds))?;

    let ctx = Stage7Context {
        input_path: args.input.display().to_string(),
        merge_path: args.merge.as_ref().map(|p| p.display().to_string()),
        run_mode,
    };
    write_reports(&run, &ctx, &out_dir)?;

    let top = run.flags.top(thresholds.top_n);
    tracing::info!(
        proteins = run.dataset.n_proteins(),
        flagged = run.flags.ranking.len(),
        top_problem = top.first().map(|e| e.protein.as_str()).unwrap_or("none"),
        "run complete"
    );
    Ok(())
}

fn validate_command(args: &ValidateArgs) -> Result<()> {
    let loaded = load_dataset(&args.input)?;
    let ds = &loaded.dataset;
    println!(
        "records={} patients={} timepoints={} proteins={} parse_issues={} skipped_rows={}",
        ds.n_records(),
        ds.n_patients(),
        ds.n_timepoints(),
        ds.n_proteins(),
        loaded.issues.len(),
        loaded.skipped_rows
    );
    for issue in &loaded.issues {
        println!(
            "{}\trow {}\t{}\t{}",
            issue.source, issue.row, issue.column, issue.raw
        );
    }
    Ok(())
}

/// Defaults, then the JSON profile, then individual flags.
fn resolve_thresholds(args: &RunArgs) -> Result<QcThresholds> {
    let mut t = match &args.thresholds {
        Some(path) => QcThresholds::from_json_file(path)?,
        None => QcThresholds::default_v1(),
    };
    if let Some(n) = args.top_n {
        t.top_n = n;
    }
    if let Some(k) = args.iqr_multiplier {
        t.iqr_multiplier = k;
    }
    if let Some(z) = args.z_threshold {
        t.z_threshold = z;
    }
    if let Some(basis) = args.cv_basis {
        t.cv_basis = match basis {
            CvBasisArg::NonZero => CvBasis::NonZero,
            CvBasisArg::NonMissing => CvBasis::NonMissing,
        };
    }
    if let Some(pct) = args.min_coverage {
        t.min_coverage_percent = pct;
    }
    t.validate()?;
    Ok(t)
}

fn resolve_output_dir(base: &Path, run_mode: RunMode) -> PathBuf {
    match run_mode {
        RunMode::Standalone => base.to_path_buf(),
        RunMode::Pipeline => base.join("kira-proteomicsqc"),
    }
}

#[cfg(feature = "mt")]
fn with_thread_pool<T, F>(threads: usize, f: F) -> Result<T>
where
    T: Send,
    F: FnOnce() -> T + Send,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| {
            crate::error::QcError::InvalidParameter(format!("failed to build thread pool: {e}"))
        })?;
    tracing::debug!(threads = pool.current_num_threads(), "thread pool ready");
    Ok(pool.install(f))
}

#[cfg(not(feature = "mt"))]
fn with_thread_pool<T, F>(threads: usize, f: F) -> Result<T>
where
    F: FnOnce() -> T,
{
    if threads > 1 {
        tracing::warn!(threads, "built without the `mt` feature; running single-threaded");
    }
    Ok(f())
}

#[cfg(test)]
#[path = "../tests/src_inline/main_inline.rs"]
mod tests;
