use super::*;
use crate::model::dataset::{LabelScheme, Protein, SampleKey};
use crate::model::thresholds::QcThresholds;
use crate::pipeline::run_qc;
use crate::pipeline::stage1_load::Stage1Output;

fn key(patient: &str, timepoint: &str) -> SampleKey {
    SampleKey {
        patient_id: patient.to_string(),
        timepoint: timepoint.to_string(),
    }
}

fn dataset(samples: Vec<SampleKey>, columns: Vec<Vec<Option<f64>>>) -> Dataset {
    let proteins = (0..columns.len())
        .map(|i| Protein {
            name: format!("Prot{}", i + 1),
            scheme: LabelScheme::Af,
            source_header: format!("Prot{}", i + 1),
        })
        .collect();
    Dataset {
        samples,
        proteins,
        columns,
    }
}

fn validate(dataset: Dataset, parse_issues: Vec<ParseIssue>) -> Vec<ValidationCheck> {
    let run = run_qc(
        Stage1Output {
            dataset,
            parse_issues,
            skipped_rows: 0,
            merge: None,
        },
        &QcThresholds::default_v1(),
    );
    run.validation
}

fn status_of(checks: &[ValidationCheck], name: &str) -> CheckStatus {
    checks
        .iter()
        .find(|c| c.check == name)
        .map(|c| c.status)
        .unwrap()
}

#[test]
fn test_clean_data_passes_everything() {
    let ds = dataset(
        vec![key("P1", "T1"), key("P1", "T2"), key("P2", "T1")],
        vec![
            vec![Some(1.0), Some(2.0), Some(3.0)],
            vec![None, Some(0.0), Some(-1.0)],
            vec![None, None, None],
        ],
    );
    let checks = validate(ds, vec![]);
    assert_eq!(checks.len(), 7);
    for c in &checks {
        assert_eq!(c.status, CheckStatus::Pass, "{}: {}", c.check, c.detail);
    }
}

#[test]
fn test_duplicate_sample_keys_warn() {
    let ds = dataset(
        vec![key("P1", "T1"), key("P1", "T1"), key("P2", "T1")],
        vec![vec![Some(1.0), Some(2.0), Some(3.0)]],
    );
    let checks = validate(ds, vec![]);
    assert_eq!(status_of(&checks, "unique_sample_keys"), CheckStatus::Warn);
    let detail = &checks
        .iter()
        .find(|c| c.check == "unique_sample_keys")
        .unwrap()
        .detail;
    assert!(detail.contains("P1@T1"));
}

#[test]
fn test_parse_issues_warn() {
    let ds = dataset(vec![key("P1", "T1")], vec![vec![None]]);
    let issues = vec![ParseIssue {
        source: "fused.tsv".to_string(),
        row: 1,
        column: "Prot1".to_string(),
        raw: "n/d".to_string(),
    }];
    let checks = validate(ds, issues);
    assert_eq!(status_of(&checks, "numeric_cells"), CheckStatus::Warn);
    let detail = &checks
        .iter()
        .find(|c| c.check == "numeric_cells")
        .unwrap()
        .detail;
    assert!(detail.contains("fused.tsv row 1 Prot1='n/d'"));
    assert_eq!(
        status_of(&checks, "one_statistics_record_per_protein"),
        CheckStatus::Pass
    );
}

#[test]
fn test_misaligned_stats_fail() {
    let ds = dataset(
        vec![key("P1", "T1"), key("P2", "T1")],
        vec![vec![Some(1.0), Some(2.0)], vec![Some(3.0), Some(4.0)]],
    );
    let run = run_qc(
        Stage1Output {
            dataset: ds,
            parse_issues: vec![],
            skipped_rows: 0,
            merge: None,
        },
        &QcThresholds::default_v1(),
    );
    let truncated = &run.stats[..1];
    let checks = run_stage6(&Stage6Inputs {
        dataset: &run.dataset,
        parse_issues: &run.parse_issues,
        stats: truncated,
        outliers: &run.outliers.summaries,
        flags: &run.flags,
    });
    assert_eq!(
        status_of(&checks, "one_statistics_record_per_protein"),
        CheckStatus::Fail
    );
}

#[test]
fn test_preview_truncates() {
    let items: Vec<String> = (0..8).map(|i| format!("x{i}")).collect();
    assert_eq!(preview(&items), "x0, x1, x2, x3, x4 (+3 more)");
    assert_eq!(preview(&items[..2]), "x0, x1");
}
