pub mod stage1_load;
pub mod stage2_coverage;
pub mod stage3_stats;
pub mod stage4_outliers;
pub mod stage5_flags;
pub mod stage6_validate;
pub mod stage7_report;

use crate::input::ParseIssue;
use crate::input::merge::MergeAudit;
use crate::model::dataset::Dataset;
use crate::model::stats::ProteinStats;
use crate::model::thresholds::QcThresholds;
use stage1_load::Stage1Output;
use stage2_coverage::{Stage2Output, run_stage2};
use stage3_stats::run_stage3;
use stage4_outliers::{Stage4Inputs, Stage4Output, run_stage4};
use stage5_flags::{Stage5Output, run_stage5};
use stage6_validate::{Stage6Inputs, ValidationCheck, run_stage6};

/// Runs `f` once per protein index and collects results in index order.
#[cfg(feature = "mt")]
pub fn map_proteins<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    use rayon::prelude::*;
    (0..n).into_par_iter().map(f).collect()
}

#[cfg(not(feature = "mt"))]
pub fn map_proteins<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    (0..n).map(f).collect()
}

/// Immutable result of one batch run, assembled after every stage completed.
#[derive(Debug, Clone)]
pub struct QcRun {
    pub dataset: Dataset,
    pub parse_issues: Vec<ParseIssue>,
    pub skipped_rows: usize,
    pub merge: Option<MergeAudit>,
    pub thresholds: QcThresholds,
    pub coverage: Stage2Output,
    pub stats: Vec<ProteinStats>,
    pub outliers: Stage4Output,
    pub flags: Stage5Output,
    pub validation: Vec<ValidationCheck>,
}

pub fn run_qc(loaded: Stage1Output, thresholds: &QcThresholds) -> QcRun {
    let dataset = loaded.dataset;

    let coverage = run_stage2(&dataset, thresholds.min_coverage_percent);
    let stats = run_stage3(&dataset, thresholds.cv_basis);
    let outliers = run_stage4(&Stage4Inputs {
        dataset: &dataset,
        stats: &stats,
        iqr_multiplier: thresholds.iqr_multiplier,
        z_threshold: thresholds.z_threshold,
    });
    let flags = run_stage5(&stats, &outliers.summaries, thresholds);
    let validation = run_stage6(&Stage6Inputs {
        dataset: &dataset,
        parse_issues: &loaded.parse_issues,
        stats: &stats,
        outliers: &outliers.summaries,
        flags: &flags,
    });

    QcRun {
        dataset,
        parse_issues: loaded.parse_issues,
        skipped_rows: loaded.skipped_rows,
        merge: loaded.merge,
        thresholds: thresholds.clone(),
        coverage,
        stats,
        outliers,
        flags,
        validation,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/scenarios.rs"]
mod tests;
