use serde::Serialize;

use crate::error::Result;
use crate::input::ParseIssue;
use crate::input::merge::MergeAudit;
use crate::model::thresholds::QcThresholds;
use crate::pipeline::QcRun;
use crate::pipeline::stage2_coverage::CoverageExclusion;
use crate::pipeline::stage5_flags::ProblemEntry;
use crate::pipeline::stage6_validate::ValidationCheck;
use crate::report::QualitySummary;

#[derive(Debug, Clone, Serialize)]
pub struct ToolMeta<'a> {
    pub name: &'a str,
    pub version: &'a str,
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputMeta<'a> {
    pub path: &'a str,
    pub merge_path: Option<&'a str>,
    pub run_mode: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryJson<'a> {
    pub tool: ToolMeta<'a>,
    pub input: InputMeta<'a>,
    pub thresholds: &'a QcThresholds,
    pub quality: &'a QualitySummary,
    pub top_problems: &'a [ProblemEntry],
    pub excluded_by_coverage: &'a [CoverageExclusion],
    pub merge: Option<&'a MergeAudit>,
    pub parse_issues: &'a [ParseIssue],
    pub validation: &'a [ValidationCheck],
    pub artifacts: &'a [&'a str],
}

pub fn render_summary_json(
    run: &QcRun,
    quality: &QualitySummary,
    input: InputMeta<'_>,
    artifacts: &[&str],
) -> Result<String> {
    let doc = SummaryJson {
        tool: ToolMeta {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            parallel: cfg!(feature = "mt"),
        },
        input,
        thresholds: &run.thresholds,
        quality,
        top_problems: run.flags.top(run.thresholds.top_n),
        excluded_by_coverage: &run.coverage.excluded,
        merge: run.merge.as_ref(),
        parse_issues: &run.parse_issues,
        validation: &run.validation,
        artifacts,
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}
