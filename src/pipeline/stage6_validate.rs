use std::collections::HashSet;

use serde::Serialize;

use crate::input::ParseIssue;
use crate::model::dataset::Dataset;
use crate::model::outliers::OutlierSummary;
use crate::model::stats::{Estimate, ProteinStats};
use crate::pipeline::stage5_flags::{Stage5Output, is_ranked};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

impl CheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CheckStatus::Pass => "PASS",
            CheckStatus::Warn => "WARN",
            CheckStatus::Fail => "FAIL",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationCheck {
    pub check: &'static str,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone)]
pub struct Stage6Inputs<'a> {
    pub dataset: &'a Dataset,
    pub parse_issues: &'a [ParseIssue],
    pub stats: &'a [ProteinStats],
    pub outliers: &'a [OutlierSummary],
    pub flags: &'a Stage5Output,
}

pub fn run_stage6(inputs: &Stage6Inputs<'_>) -> Vec<ValidationCheck> {
    let checks = vec![
        check_unique_samples(inputs.dataset),
        check_stats_cover_proteins(inputs.dataset, inputs.stats),
        check_slot_accounting(inputs.stats),
        check_fraction_ranges(inputs.stats, inputs.outliers),
        check_outlier_counts(inputs.outliers),
        check_ranking(inputs.flags),
        check_parse_issues(inputs.parse_issues),
    ];
    for c in &checks {
        match c.status {
            CheckStatus::Pass => tracing::debug!(check = c.check, "validation passed"),
            CheckStatus::Warn => tracing::warn!(check = c.check, detail = %c.detail, "validation warning"),
            CheckStatus::Fail => tracing::error!(check = c.check, detail = %c.detail, "validation failed"),
        }
    }
    checks
}

fn pass(check: &'static str, detail: String) -> ValidationCheck {
    ValidationCheck {
        check,
        status: CheckStatus::Pass,
        detail,
    }
}

fn check_unique_samples(dataset: &Dataset) -> ValidationCheck {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for key in &dataset.samples {
        if !seen.insert(key) {
            duplicates.push(format!("{}@{}", key.patient_id, key.timepoint));
        }
    }
    if duplicates.is_empty() {
        pass(
            "unique_sample_keys",
            format!("{} records, all patient/timepoint keys unique", dataset.n_records()),
        )
    } else {
        ValidationCheck {
            check: "unique_sample_keys",
            status: CheckStatus::Warn,
            detail: format!(
                "{} duplicate keys: {}",
                duplicates.len(),
                preview(&duplicates)
            ),
        }
    }
}

fn check_stats_cover_proteins(dataset: &Dataset, stats: &[ProteinStats]) -> ValidationCheck {
    let aligned = stats.len() == dataset.n_proteins()
        && stats
            .iter()
            .zip(&dataset.proteins)
            .all(|(s, p)| s.protein == p.name);
    if aligned {
        pass(
            "one_statistics_record_per_protein",
            format!("{} proteins", stats.len()),
        )
    } else {
        ValidationCheck {
            check: "one_statistics_record_per_protein",
            status: CheckStatus::Fail,
            detail: format!(
                "{} statistics records for {} proteins",
                stats.len(),
                dataset.n_proteins()
            ),
        }
    }
}

fn check_slot_accounting(stats: &[ProteinStats]) -> ValidationCheck {
    let bad: Vec<String> = stats
        .iter()
        .filter(|s| s.count + s.missing != s.total_slots)
        .map(|s| s.protein.clone())
        .collect();
    if bad.is_empty() {
        pass(
            "slot_accounting",
            "count + missing = total slots for every protein".to_string(),
        )
    } else {
        ValidationCheck {
            check: "slot_accounting",
            status: CheckStatus::Fail,
            detail: preview(&bad),
        }
    }
}

fn check_fraction_ranges(stats: &[ProteinStats], outliers: &[OutlierSummary]) -> ValidationCheck {
    let in_unit = |e: Estimate| e.value().is_none_or(|v| (0.0..=1.0).contains(&v));
    let mut bad = Vec::new();
    for s in stats {
        if !(0.0..=1.0).contains(&s.missing_fraction)
            || !in_unit(s.zero_fraction)
            || !in_unit(s.negative_fraction)
        {
            bad.push(s.protein.clone());
        }
    }
    for o in outliers {
        if !in_unit(o.iqr_fraction()) || !in_unit(o.zscore.fraction) {
            bad.push(o.protein.clone());
        }
    }
    if bad.is_empty() {
        pass("fractions_in_unit_range", "all fractions within [0, 1]".to_string())
    } else {
        ValidationCheck {
            check: "fractions_in_unit_range",
            status: CheckStatus::Fail,
            detail: preview(&bad),
        }
    }
}

fn check_outlier_counts(outliers: &[OutlierSummary]) -> ValidationCheck {
    let bad: Vec<String> = outliers
        .iter()
        .filter(|o| o.iqr_count() > o.n_values || o.zscore.count > o.n_values)
        .map(|o| o.protein.clone())
        .collect();
    if bad.is_empty() {
        pass(
            "outlier_counts_bounded",
            "outlier counts never exceed value counts".to_string(),
        )
    } else {
        ValidationCheck {
            check: "outlier_counts_bounded",
            status: CheckStatus::Fail,
            detail: preview(&bad),
        }
    }
}

fn check_ranking(flags: &Stage5Output) -> ValidationCheck {
    if is_ranked(&flags.ranking) {
        pass(
            "problem_ranking_order",
            format!("{} flagged proteins ranked", flags.ranking.len()),
        )
    } else {
        ValidationCheck {
            check: "problem_ranking_order",
            status: CheckStatus::Fail,
            detail: "ranking is not ordered by flag count then name".to_string(),
        }
    }
}

fn check_parse_issues(issues: &[ParseIssue]) -> ValidationCheck {
    if issues.is_empty() {
        return pass("numeric_cells", "all non-missing cells numeric".to_string());
    }
    let shown: Vec<String> = issues
        .iter()
        .map(|i| format!("{} row {} {}='{}'", i.source, i.row, i.column, i.raw))
        .collect();
    ValidationCheck {
        check: "numeric_cells",
        status: CheckStatus::Warn,
        detail: format!(
            "{} non-numeric cells treated as missing: {}",
            issues.len(),
            preview(&shown)
        ),
    }
}

fn preview(items: &[String]) -> String {
    const MAX: usize = 5;
    let mut out = items.iter().take(MAX).cloned().collect::<Vec<_>>().join(", ");
    if items.len() > MAX {
        out.push_str(&format!(" (+{} more)", items.len() - MAX));
    }
    out
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_validate.rs"]
mod tests;
