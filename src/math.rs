//! Numeric kernels shared by the statistics and outlier stages.
//!
//! Callers pass non-missing values only; empty input yields `None`.

use std::cmp::Ordering;

/// A mean or std this small relative to the data scale is treated as zero.
pub const REL_TOL: f64 = 1e-12;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Two-pass sample standard deviation (n − 1 denominator).
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Linear interpolation between order statistics; `sorted` must be ascending.
pub fn quantile_linear(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Largest magnitude in `values`; 0 for empty input.
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// True when `v` is rounding noise next to values of magnitude `scale`.
pub fn negligible(v: f64, scale: f64) -> bool {
    v.abs() <= REL_TOL * scale
}
