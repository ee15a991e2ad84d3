use std::fmt::Write as _;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::*;
use crate::model::dataset::{LabelScheme, Protein, SampleKey};
use crate::model::flags::QualityFlag;
use crate::report::build_quality_summary;

static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn make_temp_dir() -> PathBuf {
    let mut dir = std::env::temp_dir();
    let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    dir.push(format!("kira_proteomicsqc_scenario_{}_{}", std::process::id(), id));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// 50 patients × 2 timepoints, patient-major.
fn cohort_samples() -> Vec<SampleKey> {
    let mut samples = Vec::new();
    for p in 1..=50 {
        for t in ["Baseline", "Day7"] {
            samples.push(SampleKey {
                patient_id: format!("PT{p:03}"),
                timepoint: t.to_string(),
            });
        }
    }
    samples
}

fn from_columns(named: Vec<(&str, Vec<Option<f64>>)>) -> Stage1Output {
    let (proteins, columns) = named
        .into_iter()
        .map(|(name, col)| {
            (
                Protein {
                    name: name.to_string(),
                    scheme: LabelScheme::Af,
                    source_header: name.to_string(),
                },
                col,
            )
        })
        .unzip();
    Stage1Output {
        dataset: Dataset {
            samples: cohort_samples(),
            proteins,
            columns,
        },
        parse_issues: vec![],
        skipped_rows: 0,
        merge: None,
    }
}

fn repeated(parts: &[(f64, usize)]) -> Vec<Option<f64>> {
    parts
        .iter()
        .flat_map(|&(v, n)| std::iter::repeat_n(Some(v), n))
        .collect()
}

fn d_dimer() -> Vec<Option<f64>> {
    repeated(&[(0.0, 60), (1.0, 28), (100.0, 12)])
}

fn fibrinogen() -> Vec<Option<f64>> {
    let mut col = repeated(&[(0.0, 60)]);
    col.extend((0..40).map(|i| Some(9.0 + (i % 5) as f64 * 0.5)));
    col
}

fn steady(base: f64) -> Vec<Option<f64>> {
    (0..100).map(|i| Some(base + (i % 7) as f64 * 0.1)).collect()
}

fn flags_of(run: &QcRun, name: &str) -> Vec<QualityFlag> {
    run.flags
        .flags
        .iter()
        .find(|f| f.protein == name)
        .map(|f| f.flags.clone())
        .unwrap()
}

#[test]
fn test_d_dimer_scenario() {
    let run = run_qc(
        from_columns(vec![
            ("Albumin_H1t2", steady(40.0)),
            ("D-Dimer_H4t6", d_dimer()),
            ("CRP_H2t3", steady(5.0)),
        ]),
        &QcThresholds::default_v1(),
    );
    assert_eq!(
        flags_of(&run, "D-Dimer_H4t6"),
        vec![
            QualityFlag::HighCv,
            QualityFlag::ManyZeros,
            QualityFlag::IqrOutliers
        ]
    );
    let top = run.flags.top(10);
    assert_eq!(top[0].protein, "D-Dimer_H4t6");
    assert_eq!(top[0].flag_count, 3);

    let idx = run.dataset.protein_index("D-Dimer_H4t6").unwrap();
    let stats = &run.stats[idx];
    assert!(stats.cv_percent.value().unwrap() > 100.0);
    assert_eq!(stats.zero_fraction, crate::model::stats::Estimate::Value(0.6));
    let outliers = &run.outliers.summaries[idx];
    assert_eq!(outliers.iqr_count(), 12);
    assert_eq!(outliers.zscore.count, 0);
}

#[test]
fn test_fibrinogen_scenario() {
    let run = run_qc(
        from_columns(vec![
            ("Fibrinogen_6t12", fibrinogen()),
            ("Albumin_H1t2", steady(40.0)),
        ]),
        &QcThresholds::default_v1(),
    );
    assert_eq!(flags_of(&run, "Fibrinogen_6t12"), vec![QualityFlag::ManyZeros]);
    assert!(flags_of(&run, "Albumin_H1t2").is_empty());
    assert_eq!(run.flags.ranking.len(), 1);
}

#[test]
fn test_cv_over_non_missing_flags_fibrinogen() {
    let mut t = QcThresholds::default_v1();
    t.cv_basis = crate::model::thresholds::CvBasis::NonMissing;
    let run = run_qc(from_columns(vec![("Fibrinogen_6t12", fibrinogen())]), &t);
    assert_eq!(
        flags_of(&run, "Fibrinogen_6t12"),
        vec![QualityFlag::HighCv, QualityFlag::ManyZeros]
    );
}

#[test]
fn test_zero_mean_protein_no_nan() {
    let centered: Vec<Option<f64>> = (0..100)
        .map(|i| Some(if i % 2 == 0 { -1.0 } else { 1.0 }))
        .collect();
    let constant = repeated(&[(3.0, 100)]);
    let run = run_qc(
        from_columns(vec![("Centered", centered), ("Constant", constant)]),
        &QcThresholds::default_v1(),
    );
    for s in &run.stats {
        for e in [s.mean, s.std, s.cv_percent, s.zero_fraction, s.negative_fraction] {
            assert!(!e.value().is_some_and(f64::is_nan), "{}", s.protein);
        }
    }
    let constant = &run.outliers.summaries[1];
    assert_eq!(constant.zscore.count, 0);
    // Half the values are negative.
    assert_eq!(flags_of(&run, "Centered"), vec![QualityFlag::ManyNegatives]);
}

#[test]
fn test_cohort_of_86_proteins_from_file() {
    let dir = make_temp_dir();
    let path = dir.join("cohort.csv");
    let mut text = String::from("PatientID,Timepoint");
    for p in 0..86 {
        if p < 60 {
            write!(text, ",Prot{p}_H{p}t1").unwrap();
        } else {
            write!(text, ",Prot{p}|{p}t9").unwrap();
        }
    }
    text.push('\n');
    for (row, key) in cohort_samples().iter().enumerate() {
        write!(text, "{},{}", key.patient_id, key.timepoint).unwrap();
        for p in 0..86 {
            write!(text, ",{}", 10.0 + p as f64 + (row % 7) as f64 * 0.1).unwrap();
        }
        text.push('\n');
    }
    fs::write(&path, text).unwrap();

    let loaded = stage1_load::run_stage1(&path, None).unwrap();
    let run = run_qc(loaded, &QcThresholds::default_v1());
    let q = build_quality_summary(&run);

    assert_eq!(q.n_patients, 50);
    assert_eq!(q.n_timepoints, 2);
    assert_eq!(q.n_records, 100);
    assert_eq!(q.n_proteins, 86);
    assert_eq!(q.n_af_proteins, 60);
    assert_eq!(q.n_fused_proteins, 26);
    assert_eq!(format!("{:.2}", q.avg_missing_percent), "0.00");
    assert_eq!(run.stats.len(), 86);
    assert!(run.flags.ranking.is_empty());
    assert_eq!(q.validation_failures, 0);
    assert_eq!(run.coverage.retained.len(), 86);
}

#[test]
fn test_merge_through_stage1() {
    let dir = make_temp_dir();
    let primary = dir.join("af.csv");
    let secondary = dir.join("fused.tsv");
    fs::write(&primary, "PatientID,Timepoint,CRP\nP1,T1,1\nP2,T1,NA\n").unwrap();
    fs::write(
        &secondary,
        "PatientID\tTimepoint\tCRP\tIL6|P05231\nP2\tT1\t2\t7\nP3\tT1\t3\t8\n",
    )
    .unwrap();

    let loaded = stage1_load::run_stage1(&primary, Some(&secondary)).unwrap();
    let audit = loaded.merge.clone().unwrap();
    assert_eq!(audit.added_records, 1);
    assert_eq!(audit.added_proteins, 1);

    let run = run_qc(loaded, &QcThresholds::default_v1());
    assert_eq!(run.dataset.n_records(), 3);
    assert_eq!(run.dataset.column(0), &[Some(1.0), Some(2.0), Some(3.0)]);
    assert_eq!(run.dataset.count_scheme(LabelScheme::Fused), 1);
    assert!(run.merge.is_some());
}

#[test]
fn test_rerun_yields_identical_flags() {
    let build = || {
        from_columns(vec![
            ("Fibrinogen_6t12", fibrinogen()),
            ("D-Dimer_H4t6", d_dimer()),
            ("Albumin_H1t2", steady(40.0)),
            ("Sparse", {
                let mut c = vec![None; 100];
                c[3] = Some(1.0);
                c
            }),
        ])
    };
    let t = QcThresholds::default_v1();
    let first = run_qc(build(), &t);
    let second = run_qc(build(), &t);

    let snapshot = |run: &QcRun| -> Vec<(String, Vec<QualityFlag>)> {
        run.flags
            .ranking
            .iter()
            .map(|e| (e.protein.clone(), e.flags.clone()))
            .collect()
    };
    assert_eq!(snapshot(&first), snapshot(&second));
    let names: Vec<String> = snapshot(&first).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["D-Dimer_H4t6", "Fibrinogen_6t12", "Sparse"]);
}

#[test]
fn test_picomolar_scale_protein_not_flagged() {
    let tiny: Vec<Option<f64>> = (0..100)
        .map(|i| Some(2e-13 + f64::from(i % 5) * 1e-13))
        .collect();
    let run = run_qc(
        from_columns(vec![("IL6_molar", tiny)]),
        &QcThresholds::default_v1(),
    );
    let s = &run.stats[0];
    assert_eq!(s.zero_fraction, crate::model::stats::Estimate::Value(0.0));
    assert!(s.cv_percent.value().is_some());
    assert!(run.outliers.summaries[0].zscore.skipped.is_none());
    assert!(flags_of(&run, "IL6_molar").is_empty());
}

#[test]
fn test_merge_parse_issues_keep_their_file() {
    let dir = make_temp_dir();
    let primary = dir.join("af.csv");
    let secondary = dir.join("fused.csv");
    fs::write(&primary, "PatientID,Timepoint,CRP\nP1,T1,high\n").unwrap();
    fs::write(&secondary, "PatientID,Timepoint,IL6\nP1,T1,low\n").unwrap();

    let loaded = stage1_load::run_stage1(&primary, Some(&secondary)).unwrap();
    let issues = &loaded.parse_issues;
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0].row, issues[1].row);
    assert_eq!(issues[0].source, primary.display().to_string());
    assert_eq!(issues[1].source, secondary.display().to_string());
}
