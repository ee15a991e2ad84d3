use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CvBasis {
    /// CV over detected (non-zero) values; zero inflation is left to the zero flag.
    NonZero,
    /// CV over every non-missing value.
    NonMissing,
}

impl CvBasis {
    pub fn as_str(self) -> &'static str {
        match self {
            CvBasis::NonZero => "non-zero",
            CvBasis::NonMissing => "non-missing",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcThresholds {
    pub max_missing_fraction: f64,
    pub max_cv_percent: f64,
    pub max_zero_fraction: f64,
    pub max_negative_fraction: f64,
    pub max_iqr_outlier_fraction: f64,
    pub max_z_outlier_fraction: f64,
    pub iqr_multiplier: f64,
    pub z_threshold: f64,
    pub cv_basis: CvBasis,
    pub min_coverage_percent: f64,
    pub top_n: usize,
}

impl Default for QcThresholds {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl QcThresholds {
    pub fn default_v1() -> Self {
        Self {
            max_missing_fraction: 0.50,
            max_cv_percent: 100.0,
            max_zero_fraction: 0.50,
            max_negative_fraction: 0.05,
            max_iqr_outlier_fraction: 0.10,
            max_z_outlier_fraction: 0.10,
            iqr_multiplier: 1.5,
            z_threshold: 3.0,
            cv_basis: CvBasis::NonZero,
            min_coverage_percent: 10.0,
            top_n: 10,
        }
    }

    /// Reads a JSON profile; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let profile: QcThresholds = serde_json::from_str(&text)?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        let fractions = [
            ("max_missing_fraction", self.max_missing_fraction),
            ("max_zero_fraction", self.max_zero_fraction),
            ("max_negative_fraction", self.max_negative_fraction),
            ("max_iqr_outlier_fraction", self.max_iqr_outlier_fraction),
            ("max_z_outlier_fraction", self.max_z_outlier_fraction),
        ];
        for (name, v) in fractions {
            if !(0.0..=1.0).contains(&v) {
                return Err(QcError::InvalidParameter(format!(
                    "{name} must be within [0, 1], got {v}"
                )));
            }
        }
        let positives = [
            ("max_cv_percent", self.max_cv_percent),
            ("iqr_multiplier", self.iqr_multiplier),
            ("z_threshold", self.z_threshold),
        ];
        for (name, v) in positives {
            if !(v.is_finite() && v > 0.0) {
                return Err(QcError::InvalidParameter(format!(
                    "{name} must be a positive number, got {v}"
                )));
            }
        }
        if !(0.0..=100.0).contains(&self.min_coverage_percent) {
            return Err(QcError::InvalidParameter(format!(
                "min_coverage_percent must be within [0, 100], got {}",
                self.min_coverage_percent
            )));
        }
        Ok(())
    }
}
