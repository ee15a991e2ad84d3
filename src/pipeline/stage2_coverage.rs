use serde::Serialize;

use crate::model::dataset::Dataset;

#[derive(Debug, Clone, Serialize)]
pub struct CoverageExclusion {
    pub protein: String,
    pub coverage_percent: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Stage2Output {
    /// Protein indices kept for the analysis-ready table, in dataset order.
    pub retained: Vec<usize>,
    pub excluded: Vec<CoverageExclusion>,
}

pub fn coverage_percent(column: &[Option<f64>]) -> f64 {
    if column.is_empty() {
        return 0.0;
    }
    column.iter().flatten().count() as f64 / column.len() as f64 * 100.0
}

pub fn run_stage2(dataset: &Dataset, min_coverage_percent: f64) -> Stage2Output {
    let mut out = Stage2Output::default();
    for (idx, protein) in dataset.proteins.iter().enumerate() {
        let coverage = coverage_percent(dataset.column(idx));
        if coverage < min_coverage_percent {
            out.excluded.push(CoverageExclusion {
                protein: protein.name.clone(),
                coverage_percent: coverage,
            });
        } else {
            out.retained.push(idx);
        }
    }
    tracing::info!(
        retained = out.retained.len(),
        excluded = out.excluded.len(),
        min_coverage_percent,
        "coverage filter applied"
    );
    out
}
