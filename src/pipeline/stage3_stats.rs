use crate::math::{max_abs, mean, negligible, quantile_linear, sample_std, sorted};
use crate::model::dataset::{Dataset, Protein};
use crate::model::stats::{DataStatus, Estimate, ProteinStats, Quartiles, UndefinedReason};
use crate::model::thresholds::CvBasis;
use crate::pipeline::map_proteins;

pub fn run_stage3(dataset: &Dataset, cv_basis: CvBasis) -> Vec<ProteinStats> {
    let stats = map_proteins(dataset.n_proteins(), |p| {
        compute_protein_stats(&dataset.proteins[p], dataset.column(p), cv_basis)
    });
    let insufficient = stats
        .iter()
        .filter(|s| s.status == DataStatus::InsufficientData)
        .count();
    tracing::info!(
        proteins = stats.len(),
        insufficient,
        cv_basis = cv_basis.as_str(),
        "protein statistics computed"
    );
    stats
}

pub fn compute_protein_stats(
    protein: &Protein,
    column: &[Option<f64>],
    cv_basis: CvBasis,
) -> ProteinStats {
    let values: Vec<f64> = column.iter().flatten().copied().collect();
    let total_slots = column.len();
    let count = values.len();
    let missing = total_slots - count;
    let missing_fraction = if total_slots == 0 {
        0.0
    } else {
        missing as f64 / total_slots as f64
    };

    let status = match count {
        0 => DataStatus::InsufficientData,
        1 => DataStatus::SingleValue,
        _ => DataStatus::Sufficient,
    };
    if status != DataStatus::Sufficient {
        tracing::debug!(protein = %protein.name, count, "protein has too few values");
    }

    let no_data = Estimate::Undefined(UndefinedReason::NoData);
    let mean_v = mean(&values);
    let std = match mean_v {
        None => no_data,
        Some(m) => sample_std(&values, m)
            .map(Estimate::Value)
            .unwrap_or(Estimate::Undefined(UndefinedReason::TooFewValues)),
    };

    let cv_percent = match cv_basis {
        CvBasis::NonMissing => coefficient_of_variation(&values),
        CvBasis::NonZero => {
            let detected: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
            coefficient_of_variation(&detected)
        }
    };

    let (zero_fraction, negative_fraction) = if count == 0 {
        (no_data, no_data)
    } else {
        let zeros = values.iter().filter(|v| **v == 0.0).count();
        let negatives = values.iter().filter(|v| **v < 0.0).count();
        (
            Estimate::Value(zeros as f64 / count as f64),
            Estimate::Value(negatives as f64 / count as f64),
        )
    };

    let ordered = sorted(&values);
    let quartiles = match (
        quantile_linear(&ordered, 0.25),
        quantile_linear(&ordered, 0.5),
        quantile_linear(&ordered, 0.75),
    ) {
        (Some(q1), Some(median), Some(q3)) => Some(Quartiles { q1, median, q3 }),
        _ => None,
    };

    ProteinStats {
        protein: protein.name.clone(),
        scheme: protein.scheme,
        total_slots,
        count,
        missing,
        missing_fraction,
        mean: mean_v.map(Estimate::Value).unwrap_or(no_data),
        std,
        cv_percent,
        zero_fraction,
        negative_fraction,
        min: ordered.first().copied().map(Estimate::Value).unwrap_or(no_data),
        max: ordered.last().copied().map(Estimate::Value).unwrap_or(no_data),
        quartiles,
        status,
    }
}

/// std / |mean| × 100 over `values`. Mean and std are compared against the
/// largest magnitude in `values` when deciding whether they are zero.
pub fn coefficient_of_variation(values: &[f64]) -> Estimate {
    let Some(m) = mean(values) else {
        return Estimate::Undefined(UndefinedReason::NoData);
    };
    let Some(s) = sample_std(values, m) else {
        return Estimate::Undefined(UndefinedReason::TooFewValues);
    };
    let scale = max_abs(values);
    if negligible(m, scale) {
        return Estimate::Undefined(UndefinedReason::ZeroMean);
    }
    if negligible(s, scale) {
        return Estimate::Value(0.0);
    }
    Estimate::Value(s / m.abs() * 100.0)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_stats.rs"]
mod tests;
