pub mod dataset;
pub mod flags;
pub mod outliers;
pub mod stats;
pub mod thresholds;
