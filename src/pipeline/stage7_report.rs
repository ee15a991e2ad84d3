use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::model::outliers::OutlierSummary;
use crate::model::stats::{DataStatus, ProteinStats};
use crate::model::thresholds::CvBasis;
use crate::pipeline::QcRun;
use crate::report::json::{InputMeta, render_summary_json};
use crate::report::text::render_report_markdown;
use crate::report::{
    QualitySummary, build_quality_summary, format_estimate, format_f64_6, format_flags,
    scheme_name,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Standalone,
    Pipeline,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Standalone => "standalone",
            RunMode::Pipeline => "pipeline",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage7Context {
    pub input_path: String,
    pub merge_path: Option<String>,
    pub run_mode: RunMode,
}

pub const PROTEIN_STATISTICS: &str = "protein_statistics.tsv";
pub const PROTEIN_OUTLIERS: &str = "protein_outliers.tsv";
pub const OUTLIER_VALUES: &str = "outlier_values.tsv";
pub const QUALITY_SUMMARY: &str = "quality_summary.tsv";
pub const PROBLEMATIC_PROTEINS: &str = "problematic_proteins.tsv";
pub const VALIDATION_RESULTS: &str = "validation_results.tsv";
pub const PROTEIN_SUMMARY: &str = "protein_summary.tsv";
pub const CLEANED_DATA: &str = "cleaned_data.tsv";
pub const SUMMARY_JSON: &str = "summary.json";
pub const REPORT_MD: &str = "report.md";

pub fn artifact_names() -> &'static [&'static str] {
    &[
        PROTEIN_STATISTICS,
        PROTEIN_OUTLIERS,
        OUTLIER_VALUES,
        QUALITY_SUMMARY,
        PROBLEMATIC_PROTEINS,
        VALIDATION_RESULTS,
        PROTEIN_SUMMARY,
        CLEANED_DATA,
        SUMMARY_JSON,
        REPORT_MD,
    ]
}

pub fn write_reports(run: &QcRun, ctx: &Stage7Context, out_dir: &Path) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let quality = build_quality_summary(run);

    write_statistics_tsv(
        &run.stats,
        run.thresholds.cv_basis,
        &out_dir.join(PROTEIN_STATISTICS),
    )?;
    write_outliers_tsv(&run.outliers.summaries, &out_dir.join(PROTEIN_OUTLIERS))?;
    write_outlier_values_tsv(run, &out_dir.join(OUTLIER_VALUES))?;
    write_quality_summary_tsv(&quality, &out_dir.join(QUALITY_SUMMARY))?;
    write_problems_tsv(run, &out_dir.join(PROBLEMATIC_PROTEINS))?;
    write_validation_tsv(run, &out_dir.join(VALIDATION_RESULTS))?;
    write_protein_summary_tsv(&run.stats, &out_dir.join(PROTEIN_SUMMARY))?;
    write_cleaned_tsv(run, &out_dir.join(CLEANED_DATA))?;

    let json = render_summary_json(
        run,
        &quality,
        InputMeta {
            path: &ctx.input_path,
            merge_path: ctx.merge_path.as_deref(),
            run_mode: ctx.run_mode.as_str(),
        },
        artifact_names(),
    )?;
    write_text(&out_dir.join(SUMMARY_JSON), &json)?;

    let report = render_report_markdown(run, &quality, artifact_names());
    write_text(&out_dir.join(REPORT_MD), &report)?;

    tracing::info!(
        out_dir = %out_dir.display(),
        files = artifact_names().len(),
        "reports written"
    );
    Ok(())
}

/// Tab-separated writer; fields holding tabs, quotes or line breaks are quoted.
fn tsv_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    Ok(csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(BufWriter::new(File::create(path)?)))
}

fn write_statistics_tsv(stats: &[ProteinStats], cv_basis: CvBasis, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record([
        "protein",
        "scheme",
        "total_slots",
        "count",
        "missing",
        "missing_fraction",
        "mean",
        "std",
        "cv_percent",
        "cv_basis",
        "zero_fraction",
        "negative_fraction",
        "min",
        "q1",
        "median",
        "q3",
        "max",
        "status",
    ])?;

    for s in stats {
        let (q1, median, q3) = match s.quartiles {
            Some(q) => (
                format_f64_6(q.q1),
                format_f64_6(q.median),
                format_f64_6(q.q3),
            ),
            None => ("NA".to_string(), "NA".to_string(), "NA".to_string()),
        };
        w.write_record([
            s.protein.clone(),
            scheme_name(s.scheme).to_string(),
            s.total_slots.to_string(),
            s.count.to_string(),
            s.missing.to_string(),
            format_f64_6(s.missing_fraction),
            format_estimate(s.mean),
            format_estimate(s.std),
            format_estimate(s.cv_percent),
            cv_basis.as_str().to_string(),
            format_estimate(s.zero_fraction),
            format_estimate(s.negative_fraction),
            format_estimate(s.min),
            q1,
            median,
            q3,
            format_estimate(s.max),
            status_name(s.status).to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_outliers_tsv(summaries: &[OutlierSummary], path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record([
        "protein",
        "n_values",
        "iqr_lower",
        "iqr_upper",
        "iqr_outliers",
        "iqr_fraction",
        "z_outliers",
        "z_fraction",
        "z_skipped",
    ])?;
    for s in summaries {
        let (lower, upper, fraction) = match s.iqr {
            Some(r) => (
                format_f64_6(r.lower),
                format_f64_6(r.upper),
                format_estimate(r.fraction),
            ),
            None => ("NA".to_string(), "NA".to_string(), "NA".to_string()),
        };
        w.write_record([
            s.protein.clone(),
            s.n_values.to_string(),
            lower,
            upper,
            s.iqr_count().to_string(),
            fraction,
            s.zscore.count.to_string(),
            format_estimate(s.zscore.fraction),
            s.zscore.skipped.map(|r| r.as_str()).unwrap_or("").to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_outlier_values_tsv(run: &QcRun, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(["patient_id", "timepoint", "protein", "method", "value", "score"])?;
    for v in &run.outliers.values {
        let value = format_f64_6(v.value);
        let score = format_f64_6(v.score);
        w.write_record([
            v.sample.patient_id.as_str(),
            v.sample.timepoint.as_str(),
            v.protein.as_str(),
            v.method.as_str(),
            value.as_str(),
            score.as_str(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_quality_summary_tsv(q: &QualitySummary, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(["metric", "value"])?;
    let mut rows: Vec<(String, String)> = vec![
        ("patients".into(), q.n_patients.to_string()),
        ("timepoints".into(), q.n_timepoints.to_string()),
        ("records".into(), q.n_records.to_string()),
        ("proteins".into(), q.n_proteins.to_string()),
        ("proteins_af".into(), q.n_af_proteins.to_string()),
        ("proteins_fused".into(), q.n_fused_proteins.to_string()),
        (
            "avg_missing_percent".into(),
            format!("{:.2}", q.avg_missing_percent),
        ),
        (
            "insufficient_data_proteins".into(),
            q.insufficient_data_proteins.to_string(),
        ),
        ("flagged_proteins".into(), q.flagged_proteins.to_string()),
    ];
    for fc in &q.flag_counts {
        rows.push((format!("flag_{}", fc.flag.to_ascii_lowercase()), fc.proteins.to_string()));
    }
    rows.extend([
        ("iqr_outliers_total".into(), q.iqr_outliers_total.to_string()),
        (
            "zscore_outliers_total".into(),
            q.zscore_outliers_total.to_string(),
        ),
        (
            "excluded_by_coverage".into(),
            q.excluded_by_coverage.to_string(),
        ),
        ("parse_issues".into(), q.parse_issues.to_string()),
        ("skipped_rows".into(), q.skipped_rows.to_string()),
        (
            "validation_failures".into(),
            q.validation_failures.to_string(),
        ),
        (
            "validation_warnings".into(),
            q.validation_warnings.to_string(),
        ),
    ]);
    for (metric, value) in rows {
        w.write_record([metric, value])?;
    }
    w.flush()?;
    Ok(())
}

fn write_problems_tsv(run: &QcRun, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(["rank", "protein", "flag_count", "flags", "descriptions"])?;
    for e in run.flags.top(run.thresholds.top_n) {
        w.write_record([
            e.rank.to_string(),
            e.protein.clone(),
            e.flag_count.to_string(),
            format_flags(&e.flags),
            e.descriptions.join("; "),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_validation_tsv(run: &QcRun, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(["check", "status", "detail"])?;
    for c in &run.validation {
        w.write_record([c.check, c.status.as_str(), c.detail.as_str()])?;
    }
    w.flush()?;
    Ok(())
}

fn write_protein_summary_tsv(stats: &[ProteinStats], path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    w.write_record(["protein", "coverage_percent", "count", "min", "max", "mean", "std"])?;

    let mut rows: Vec<&ProteinStats> = stats.iter().filter(|s| s.count > 0).collect();
    rows.sort_by(|a, b| {
        match b
            .coverage_percent()
            .partial_cmp(&a.coverage_percent())
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => a.protein.cmp(&b.protein),
            other => other,
        }
    });
    for s in rows {
        w.write_record([
            s.protein.clone(),
            format!("{:.2}", s.coverage_percent()),
            s.count.to_string(),
            format_estimate(s.min),
            format_estimate(s.max),
            format_estimate(s.mean),
            format_estimate(s.std),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_cleaned_tsv(run: &QcRun, path: &Path) -> Result<()> {
    let mut w = tsv_writer(path)?;
    let retained = &run.coverage.retained;
    let dataset = &run.dataset;

    let mut header = vec!["PatientID".to_string(), "Timepoint".to_string()];
    header.extend(retained.iter().map(|&p| dataset.proteins[p].name.clone()));
    w.write_record(&header)?;

    for (row, key) in dataset.samples.iter().enumerate() {
        let mut line = vec![key.patient_id.clone(), key.timepoint.clone()];
        for &p in retained {
            line.push(match dataset.columns[p][row] {
                Some(v) => v.to_string(),
                None => "NA".to_string(),
            });
        }
        w.write_record(&line)?;
    }
    w.flush()?;
    Ok(())
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    w.write_all(contents.as_bytes())?;
    w.flush()?;
    Ok(())
}

fn status_name(status: DataStatus) -> &'static str {
    match status {
        DataStatus::Sufficient => "ok",
        DataStatus::SingleValue => "single_value",
        DataStatus::InsufficientData => "insufficient_data",
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_report.rs"]
mod tests;
