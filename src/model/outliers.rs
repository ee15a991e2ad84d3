use crate::model::dataset::SampleKey;
use crate::model::stats::{Estimate, UndefinedReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutlierMethod {
    Iqr,
    ZScore,
}

impl OutlierMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            OutlierMethod::Iqr => "iqr",
            OutlierMethod::ZScore => "zscore",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IqrResult {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
    pub fraction: Estimate,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZScoreResult {
    pub count: usize,
    pub fraction: Estimate,
    /// Set when the detector short-circuited (no usable std).
    pub skipped: Option<UndefinedReason>,
}

#[derive(Debug, Clone)]
pub struct OutlierSummary {
    pub protein: String,
    pub n_values: usize,
    /// `None` when the protein has no values to bound.
    pub iqr: Option<IqrResult>,
    pub zscore: ZScoreResult,
}

impl OutlierSummary {
    pub fn iqr_fraction(&self) -> Estimate {
        self.iqr
            .map(|r| r.fraction)
            .unwrap_or(Estimate::Undefined(UndefinedReason::NoData))
    }

    pub fn iqr_count(&self) -> usize {
        self.iqr.map(|r| r.count).unwrap_or(0)
    }
}

/// One flagged cell, kept for later inspection.
#[derive(Debug, Clone)]
pub struct OutlierValue {
    pub sample: SampleKey,
    pub protein: String,
    pub value: f64,
    pub method: OutlierMethod,
    /// Distance measure: z for Z-score, signed distance past the violated bound for IQR.
    pub score: f64,
}
