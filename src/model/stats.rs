use crate::model::dataset::LabelScheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndefinedReason {
    NoData,
    TooFewValues,
    ZeroMean,
    ZeroVariance,
}

impl UndefinedReason {
    pub fn as_str(self) -> &'static str {
        match self {
            UndefinedReason::NoData => "no_data",
            UndefinedReason::TooFewValues => "too_few_values",
            UndefinedReason::ZeroMean => "zero_mean",
            UndefinedReason::ZeroVariance => "zero_variance",
        }
    }
}

/// A statistic that may be undefined for a given protein. Undefined values never
/// collapse to 0 or NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Estimate {
    Value(f64),
    Undefined(UndefinedReason),
}

impl Estimate {
    pub fn value(self) -> Option<f64> {
        match self {
            Estimate::Value(v) => Some(v),
            Estimate::Undefined(_) => None,
        }
    }

    /// True only when the value is defined and strictly above `limit`.
    pub fn exceeds(self, limit: f64) -> bool {
        self.value().is_some_and(|v| v > limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataStatus {
    Sufficient,
    SingleValue,
    InsufficientData,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quartiles {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
}

#[derive(Debug, Clone)]
pub struct ProteinStats {
    pub protein: String,
    pub scheme: LabelScheme,
    pub total_slots: usize,
    pub count: usize,
    pub missing: usize,
    pub missing_fraction: f64,
    pub mean: Estimate,
    pub std: Estimate,
    pub cv_percent: Estimate,
    pub zero_fraction: Estimate,
    pub negative_fraction: Estimate,
    pub min: Estimate,
    pub max: Estimate,
    pub quartiles: Option<Quartiles>,
    pub status: DataStatus,
}

impl ProteinStats {
    pub fn coverage_percent(&self) -> f64 {
        if self.total_slots == 0 {
            return 0.0;
        }
        self.count as f64 / self.total_slots as f64 * 100.0
    }
}
