use crate::pipeline::QcRun;
use crate::report::{QualitySummary, format_percent_2};

pub fn render_report_markdown(run: &QcRun, quality: &QualitySummary, artifacts: &[&str]) -> String {
    let mut out = String::new();

    out.push_str("# Proteomics Data Cleaning Report\n\n");

    out.push_str("## Quality Summary\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!("| Patients | {} |\n", quality.n_patients));
    out.push_str(&format!("| Timepoints | {} |\n", quality.n_timepoints));
    out.push_str(&format!("| Records | {} |\n", quality.n_records));
    out.push_str(&format!(
        "| Proteins | {} (AF: {}, Fused: {}) |\n",
        quality.n_proteins, quality.n_af_proteins, quality.n_fused_proteins
    ));
    out.push_str(&format!(
        "| Average missingness | {} |\n",
        format_percent_2(quality.avg_missing_percent)
    ));
    out.push_str(&format!(
        "| Proteins with insufficient data | {} |\n",
        quality.insufficient_data_proteins
    ));
    out.push_str(&format!(
        "| IQR outliers (total) | {} |\n",
        quality.iqr_outliers_total
    ));
    out.push_str(&format!(
        "| Z-score outliers (total) | {} |\n",
        quality.zscore_outliers_total
    ));
    out.push_str(&format!(
        "| Excluded by coverage (< {}%) | {} |\n",
        run.thresholds.min_coverage_percent, quality.excluded_by_coverage
    ));
    out.push_str(&format!(
        "| Non-numeric cells | {} |\n\n",
        quality.parse_issues
    ));

    out.push_str("## Quality Flags\n\n");
    out.push_str("| Flag | Proteins |\n|---|---|\n");
    for fc in &quality.flag_counts {
        out.push_str(&format!("| {} | {} |\n", fc.flag, fc.proteins));
    }
    out.push('\n');

    let top = run.flags.top(run.thresholds.top_n);
    out.push_str(&format!("## Top {} Problematic Proteins\n\n", top.len()));
    if top.is_empty() {
        out.push_str("No protein exceeded any quality threshold.\n\n");
    } else {
        for entry in top {
            out.push_str(&format!(
                "{}. **{}** ({} flags): {}\n",
                entry.rank,
                entry.protein,
                entry.flag_count,
                entry.descriptions.join(", ")
            ));
        }
        out.push('\n');
    }

    out.push_str("## Validation\n\n");
    out.push_str("| Check | Status | Detail |\n|---|---|---|\n");
    for c in &run.validation {
        out.push_str(&format!(
            "| {} | {} | {} |\n",
            c.check,
            c.status.as_str(),
            c.detail.replace('|', "\\|")
        ));
    }
    out.push('\n');

    out.push_str("## Output Files\n\n");
    for name in artifacts {
        out.push_str(&format!("- {}\n", name));
    }

    out
}
