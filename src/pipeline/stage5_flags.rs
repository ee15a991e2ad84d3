use std::cmp::Ordering;

use serde::Serialize;

use crate::model::flags::{QualityFlag, flag_description, ordered};
use crate::model::outliers::OutlierSummary;
use crate::model::stats::ProteinStats;
use crate::model::thresholds::QcThresholds;

#[derive(Debug, Clone)]
pub struct ProteinFlags {
    pub protein: String,
    pub flags: Vec<QualityFlag>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProblemEntry {
    pub rank: usize,
    pub protein: String,
    pub flag_count: usize,
    pub flags: Vec<QualityFlag>,
    pub descriptions: Vec<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct Stage5Output {
    /// One entry per protein, dataset order.
    pub flags: Vec<ProteinFlags>,
    /// Flagged proteins only, most flags first.
    pub ranking: Vec<ProblemEntry>,
}

impl Stage5Output {
    pub fn top(&self, n: usize) -> &[ProblemEntry] {
        &self.ranking[..n.min(self.ranking.len())]
    }

    pub fn count_flag(&self, flag: QualityFlag) -> usize {
        self.flags.iter().filter(|f| f.flags.contains(&flag)).count()
    }
}

pub fn run_stage5(
    stats: &[ProteinStats],
    outliers: &[OutlierSummary],
    thresholds: &QcThresholds,
) -> Stage5Output {
    let flags: Vec<ProteinFlags> = stats
        .iter()
        .zip(outliers)
        .map(|(s, o)| ProteinFlags {
            protein: s.protein.clone(),
            flags: collect_flags(s, o, thresholds),
        })
        .collect();
    let ranking = rank_problems(&flags);
    tracing::info!(
        flagged = ranking.len(),
        proteins = flags.len(),
        "quality flags aggregated"
    );
    Stage5Output { flags, ranking }
}

pub fn collect_flags(
    stats: &ProteinStats,
    outliers: &OutlierSummary,
    thresholds: &QcThresholds,
) -> Vec<QualityFlag> {
    let mut flags = Vec::new();

    if stats.total_slots > 0 && stats.missing_fraction > thresholds.max_missing_fraction {
        flags.push(QualityFlag::HighMissingness);
    }
    if stats.cv_percent.exceeds(thresholds.max_cv_percent) {
        flags.push(QualityFlag::HighCv);
    }
    if stats.zero_fraction.exceeds(thresholds.max_zero_fraction) {
        flags.push(QualityFlag::ManyZeros);
    }
    if stats
        .negative_fraction
        .exceeds(thresholds.max_negative_fraction)
    {
        flags.push(QualityFlag::ManyNegatives);
    }
    if outliers
        .iqr_fraction()
        .exceeds(thresholds.max_iqr_outlier_fraction)
    {
        flags.push(QualityFlag::IqrOutliers);
    }
    if outliers
        .zscore
        .fraction
        .exceeds(thresholds.max_z_outlier_fraction)
    {
        flags.push(QualityFlag::ZScoreOutliers);
    }

    ordered(&flags)
}

/// Flag count descending, then protein name ascending. Unflagged proteins are left out.
pub fn rank_problems(flags: &[ProteinFlags]) -> Vec<ProblemEntry> {
    let mut flagged: Vec<&ProteinFlags> = flags.iter().filter(|f| !f.flags.is_empty()).collect();
    flagged.sort_by(|a, b| match b.flags.len().cmp(&a.flags.len()) {
        Ordering::Equal => a.protein.cmp(&b.protein),
        other => other,
    });
    flagged
        .into_iter()
        .enumerate()
        .map(|(i, f)| ProblemEntry {
            rank: i + 1,
            protein: f.protein.clone(),
            flag_count: f.flags.len(),
            flags: f.flags.clone(),
            descriptions: f.flags.iter().map(|&fl| flag_description(fl)).collect(),
        })
        .collect()
}

// Used by validation to re-check the ranking invariant.
pub fn is_ranked(entries: &[ProblemEntry]) -> bool {
    entries.windows(2).all(|w| {
        let (a, b) = (&w[0], &w[1]);
        a.flag_count > b.flag_count || (a.flag_count == b.flag_count && a.protein <= b.protein)
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_flags.rs"]
mod tests;
