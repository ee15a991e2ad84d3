use crate::math::negligible;
use crate::model::dataset::Dataset;
use crate::model::outliers::{IqrResult, OutlierMethod, OutlierSummary, OutlierValue, ZScoreResult};
use crate::model::stats::{Estimate, ProteinStats, UndefinedReason};
use crate::pipeline::map_proteins;

#[derive(Debug, Clone)]
pub struct Stage4Inputs<'a> {
    pub dataset: &'a Dataset,
    pub stats: &'a [ProteinStats],
    pub iqr_multiplier: f64,
    pub z_threshold: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Stage4Output {
    pub summaries: Vec<OutlierSummary>,
    /// Flagged cells in protein order, then record order; IQR before Z within a cell.
    pub values: Vec<OutlierValue>,
}

pub fn run_stage4(inputs: &Stage4Inputs<'_>) -> Stage4Output {
    let per_protein = map_proteins(inputs.dataset.n_proteins(), |p| detect_protein(inputs, p));

    let mut out = Stage4Output::default();
    for (summary, values) in per_protein {
        out.summaries.push(summary);
        out.values.extend(values);
    }
    let iqr_total: usize = out.summaries.iter().map(|s| s.iqr_count()).sum();
    let z_total: usize = out.summaries.iter().map(|s| s.zscore.count).sum();
    tracing::info!(
        iqr_outliers = iqr_total,
        zscore_outliers = z_total,
        iqr_multiplier = inputs.iqr_multiplier,
        z_threshold = inputs.z_threshold,
        "outlier detection finished"
    );
    out
}

fn detect_protein(inputs: &Stage4Inputs<'_>, p: usize) -> (OutlierSummary, Vec<OutlierValue>) {
    let dataset = inputs.dataset;
    let stats = &inputs.stats[p];
    let name = &dataset.proteins[p].name;
    let column = dataset.column(p);
    let n_values = stats.count;

    let iqr_bounds = stats
        .quartiles
        .map(|q| iqr_bounds(q.q1, q.q3, inputs.iqr_multiplier));
    let scale = match (stats.min, stats.max) {
        (Estimate::Value(lo), Estimate::Value(hi)) => lo.abs().max(hi.abs()),
        _ => 0.0,
    };
    let z_params = zscore_params(stats.mean, stats.std, scale);
    if let Err(reason) = z_params {
        tracing::debug!(protein = %name, reason = reason.as_str(), "z-score detection skipped");
    }

    let mut flagged = Vec::new();
    let mut iqr_count = 0usize;
    let mut z_count = 0usize;
    for (row, cell) in column.iter().enumerate() {
        let Some(value) = *cell else {
            continue;
        };
        if let Some((lower, upper)) = iqr_bounds {
            if value < lower || value > upper {
                iqr_count += 1;
                let score = if value < lower {
                    value - lower
                } else {
                    value - upper
                };
                flagged.push(OutlierValue {
                    sample: dataset.samples[row].clone(),
                    protein: name.clone(),
                    value,
                    method: OutlierMethod::Iqr,
                    score,
                });
            }
        }
        if let Ok((mean, std)) = z_params {
            let z = (value - mean) / std;
            if z.abs() > inputs.z_threshold {
                z_count += 1;
                flagged.push(OutlierValue {
                    sample: dataset.samples[row].clone(),
                    protein: name.clone(),
                    value,
                    method: OutlierMethod::ZScore,
                    score: z,
                });
            }
        }
    }

    let iqr = iqr_bounds.map(|(lower, upper)| IqrResult {
        lower,
        upper,
        count: iqr_count,
        fraction: fraction(iqr_count, n_values),
    });
    let zscore = match z_params {
        Ok(_) => ZScoreResult {
            count: z_count,
            fraction: fraction(z_count, n_values),
            skipped: None,
        },
        Err(reason) => ZScoreResult {
            count: 0,
            fraction: if n_values == 0 {
                Estimate::Undefined(UndefinedReason::NoData)
            } else {
                Estimate::Value(0.0)
            },
            skipped: Some(reason),
        },
    };

    (
        OutlierSummary {
            protein: name.clone(),
            n_values,
            iqr,
            zscore,
        },
        flagged,
    )
}

pub fn iqr_bounds(q1: f64, q3: f64, multiplier: f64) -> (f64, f64) {
    let iqr = q3 - q1;
    (q1 - multiplier * iqr, q3 + multiplier * iqr)
}

/// Mean and std usable as a z-score denominator, or why there are none. `scale` is
/// the largest value magnitude; a std negligible next to it counts as zero.
pub fn zscore_params(
    mean: Estimate,
    std: Estimate,
    scale: f64,
) -> Result<(f64, f64), UndefinedReason> {
    let mean = match mean {
        Estimate::Value(v) => v,
        Estimate::Undefined(reason) => return Err(reason),
    };
    match std {
        Estimate::Value(s) if negligible(s, scale) => Err(UndefinedReason::ZeroVariance),
        Estimate::Value(s) => Ok((mean, s)),
        Estimate::Undefined(reason) => Err(reason),
    }
}

fn fraction(count: usize, total: usize) -> Estimate {
    if total == 0 {
        Estimate::Undefined(UndefinedReason::NoData)
    } else {
        Estimate::Value(count as f64 / total as f64)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_outliers.rs"]
mod tests;
