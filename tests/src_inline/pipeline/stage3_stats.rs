use super::*;
use crate::model::dataset::{LabelScheme, Protein};

fn protein(name: &str) -> Protein {
    Protein {
        name: name.to_string(),
        scheme: LabelScheme::Af,
        source_header: name.to_string(),
    }
}

fn col(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values.to_vec()
}

fn approx(e: Estimate, expected: f64) -> bool {
    e.value().is_some_and(|v| (v - expected).abs() < 1e-9)
}

#[test]
fn test_basic_statistics() {
    let c = col(&[Some(1.0), Some(2.0), None, Some(3.0), Some(4.0)]);
    let s = compute_protein_stats(&protein("A"), &c, CvBasis::NonMissing);
    assert_eq!(s.total_slots, 5);
    assert_eq!(s.count, 4);
    assert_eq!(s.missing, 1);
    assert!((s.missing_fraction - 0.2).abs() < 1e-12);
    assert!(approx(s.mean, 2.5));
    let std = (5.0f64 / 3.0).sqrt();
    assert!(approx(s.std, std));
    assert!(approx(s.cv_percent, std / 2.5 * 100.0));
    assert!(approx(s.min, 1.0));
    assert!(approx(s.max, 4.0));
    let q = s.quartiles.unwrap();
    assert_eq!(q.q1, 1.75);
    assert_eq!(q.median, 2.5);
    assert_eq!(q.q3, 3.25);
    assert_eq!(s.status, DataStatus::Sufficient);
}

#[test]
fn test_all_missing_is_insufficient_not_error() {
    let c = col(&[None, None, None]);
    let s = compute_protein_stats(&protein("Empty"), &c, CvBasis::NonZero);
    assert_eq!(s.count, 0);
    assert_eq!(s.missing, 3);
    assert_eq!(s.missing_fraction, 1.0);
    assert_eq!(s.status, DataStatus::InsufficientData);
    assert_eq!(s.mean, Estimate::Undefined(UndefinedReason::NoData));
    assert_eq!(s.std, Estimate::Undefined(UndefinedReason::NoData));
    assert_eq!(s.cv_percent, Estimate::Undefined(UndefinedReason::NoData));
    assert_eq!(s.zero_fraction, Estimate::Undefined(UndefinedReason::NoData));
    assert_eq!(s.negative_fraction, Estimate::Undefined(UndefinedReason::NoData));
    assert!(s.quartiles.is_none());
}

#[test]
fn test_single_value() {
    let c = col(&[Some(7.0), None]);
    let s = compute_protein_stats(&protein("One"), &c, CvBasis::NonMissing);
    assert_eq!(s.status, DataStatus::SingleValue);
    assert!(approx(s.mean, 7.0));
    assert_eq!(s.std, Estimate::Undefined(UndefinedReason::TooFewValues));
    assert_eq!(s.cv_percent, Estimate::Undefined(UndefinedReason::TooFewValues));
}

#[test]
fn test_zero_mean_cv_undefined() {
    let c = col(&[Some(-1.0), Some(1.0), Some(-2.0), Some(2.0)]);
    let s = compute_protein_stats(&protein("Centered"), &c, CvBasis::NonMissing);
    assert_eq!(s.cv_percent, Estimate::Undefined(UndefinedReason::ZeroMean));
    assert!(!s.cv_percent.value().is_some_and(f64::is_nan));
}

#[test]
fn test_constant_values_cv_zero() {
    let c = col(&[Some(5.0), Some(5.0), Some(5.0)]);
    let s = compute_protein_stats(&protein("Flat"), &c, CvBasis::NonMissing);
    assert!(approx(s.std, 0.0));
    assert_eq!(s.cv_percent, Estimate::Value(0.0));
}

#[test]
fn test_zero_and_negative_fractions() {
    let c = col(&[Some(0.0), Some(0.0), Some(-1.0), Some(3.0), None]);
    let s = compute_protein_stats(&protein("Z"), &c, CvBasis::NonMissing);
    assert!(approx(s.zero_fraction, 0.5));
    assert!(approx(s.negative_fraction, 0.25));
}

#[test]
fn test_cv_basis_non_zero_ignores_zeros() {
    let mut values = vec![Some(0.0); 60];
    values.extend(vec![Some(10.0); 20]);
    values.extend(vec![Some(12.0); 20]);

    let non_zero = compute_protein_stats(&protein("F"), &values, CvBasis::NonZero);
    let non_missing = compute_protein_stats(&protein("F"), &values, CvBasis::NonMissing);

    assert!(non_zero.cv_percent.value().unwrap() < 20.0);
    assert!(non_missing.cv_percent.value().unwrap() > 100.0);
    // Mean and std are always over non-missing values.
    assert_eq!(non_zero.mean, non_missing.mean);
    assert_eq!(non_zero.std, non_missing.std);
}

#[test]
fn test_all_zero_non_zero_basis() {
    let c = col(&[Some(0.0), Some(0.0)]);
    let s = compute_protein_stats(&protein("Zeros"), &c, CvBasis::NonZero);
    assert_eq!(s.cv_percent, Estimate::Undefined(UndefinedReason::NoData));
    assert!(approx(s.zero_fraction, 1.0));
}

#[test]
fn test_run_stage3_one_record_per_protein_in_order() {
    let dataset = Dataset {
        samples: vec![
            crate::model::dataset::SampleKey {
                patient_id: "P1".into(),
                timepoint: "T1".into(),
            },
            crate::model::dataset::SampleKey {
                patient_id: "P2".into(),
                timepoint: "T1".into(),
            },
        ],
        proteins: vec![protein("B"), protein("A"), protein("C")],
        columns: vec![
            vec![Some(1.0), Some(2.0)],
            vec![None, None],
            vec![Some(3.0), None],
        ],
    };
    let stats = run_stage3(&dataset, CvBasis::NonZero);
    let names: Vec<&str> = stats.iter().map(|s| s.protein.as_str()).collect();
    assert_eq!(names, vec!["B", "A", "C"]);
    for s in &stats {
        assert_eq!(s.count + s.missing, s.total_slots);
        assert!((0.0..=1.0).contains(&s.missing_fraction));
    }
}

#[test]
fn test_tiny_positive_values_are_not_zeros() {
    let c: Vec<Option<f64>> = (0..100)
        .map(|i| Some(2e-13 + f64::from(i % 5) * 1e-13))
        .collect();
    let s = compute_protein_stats(&protein("IL6_pM"), &c, CvBasis::NonZero);
    assert_eq!(s.zero_fraction, Estimate::Value(0.0));
    assert_eq!(s.negative_fraction, Estimate::Value(0.0));
    let cv = s.cv_percent.value().unwrap();
    assert!(cv > 30.0 && cv < 40.0, "cv = {cv}");
}

#[test]
fn test_constant_tiny_values_cv_zero() {
    let c = col(&[Some(3e-13), Some(3e-13), Some(3e-13)]);
    let s = compute_protein_stats(&protein("Flat"), &c, CvBasis::NonZero);
    assert_eq!(s.cv_percent, Estimate::Value(0.0));
}
