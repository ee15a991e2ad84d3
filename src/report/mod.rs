pub mod json;
pub mod text;

use serde::Serialize;

use crate::model::dataset::LabelScheme;
use crate::model::flags::{QualityFlag, flag_name, flag_order};
use crate::model::stats::{DataStatus, Estimate};
use crate::pipeline::QcRun;
use crate::pipeline::stage6_validate::CheckStatus;

#[derive(Debug, Clone, Serialize)]
pub struct FlagCount {
    pub flag: &'static str,
    pub proteins: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub n_patients: usize,
    pub n_timepoints: usize,
    pub n_records: usize,
    pub n_proteins: usize,
    pub n_af_proteins: usize,
    pub n_fused_proteins: usize,
    pub avg_missing_percent: f64,
    pub insufficient_data_proteins: usize,
    pub flag_counts: Vec<FlagCount>,
    pub flagged_proteins: usize,
    pub iqr_outliers_total: usize,
    pub zscore_outliers_total: usize,
    pub excluded_by_coverage: usize,
    pub parse_issues: usize,
    pub skipped_rows: usize,
    pub validation_failures: usize,
    pub validation_warnings: usize,
}

pub fn build_quality_summary(run: &QcRun) -> QualitySummary {
    let n_proteins = run.dataset.n_proteins();
    let avg_missing_percent = if n_proteins == 0 {
        0.0
    } else {
        run.stats.iter().map(|s| s.missing_fraction).sum::<f64>() / n_proteins as f64 * 100.0
    };
    let flag_counts = flag_order()
        .iter()
        .map(|&f| FlagCount {
            flag: flag_name(f),
            proteins: run.flags.count_flag(f),
        })
        .collect();
    let count_status = |status: CheckStatus| {
        run.validation
            .iter()
            .filter(|c| c.status == status)
            .count()
    };

    QualitySummary {
        n_patients: run.dataset.n_patients(),
        n_timepoints: run.dataset.n_timepoints(),
        n_records: run.dataset.n_records(),
        n_proteins,
        n_af_proteins: run.dataset.count_scheme(LabelScheme::Af),
        n_fused_proteins: run.dataset.count_scheme(LabelScheme::Fused),
        avg_missing_percent,
        insufficient_data_proteins: run
            .stats
            .iter()
            .filter(|s| s.status == DataStatus::InsufficientData)
            .count(),
        flag_counts,
        flagged_proteins: run.flags.ranking.len(),
        iqr_outliers_total: run.outliers.summaries.iter().map(|s| s.iqr_count()).sum(),
        zscore_outliers_total: run.outliers.summaries.iter().map(|s| s.zscore.count).sum(),
        excluded_by_coverage: run.coverage.excluded.len(),
        parse_issues: run.parse_issues.len(),
        skipped_rows: run.skipped_rows,
        validation_failures: count_status(CheckStatus::Fail),
        validation_warnings: count_status(CheckStatus::Warn),
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn format_percent_2(v: f64) -> String {
    format!("{:.2}%", v)
}

/// Six decimals, or `NA` for undefined values.
pub fn format_estimate(e: Estimate) -> String {
    match e {
        Estimate::Value(v) => format_f64_6(v),
        Estimate::Undefined(_) => "NA".to_string(),
    }
}

pub fn format_flags(flags: &[QualityFlag]) -> String {
    flag_order()
        .iter()
        .filter(|f| flags.contains(f))
        .map(|&f| flag_name(f))
        .collect::<Vec<_>>()
        .join(",")
}

pub fn scheme_name(scheme: LabelScheme) -> &'static str {
    match scheme {
        LabelScheme::Af => "AF",
        LabelScheme::Fused => "Fused",
    }
}
