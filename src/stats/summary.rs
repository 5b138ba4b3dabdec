// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Summary statistics and histograms

use crate::array::NdArray;
use crate::error::{GeometryError, Result};
use serde::{Deserialize, Serialize};

fn require_values(values: &[f64], what: &str) -> Result<()> {
    if values.is_empty() {
        return Err(GeometryError::invalid_input(format!("{} of an empty sample", what)));
    }
    Ok(())
}

pub fn mean(values: &[f64]) -> Result<f64> {
    require_values(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

fn sum_squared_deviations(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    Ok(values.iter().map(|v| (v - m) * (v - m)).sum())
}

/// Population variance (divides by `n`)
pub fn variance(values: &[f64]) -> Result<f64> {
    Ok(sum_squared_deviations(values)? / values.len() as f64)
}

/// Unbiased sample variance (divides by `n - 1`); needs two values
pub fn sample_variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(GeometryError::invalid_input("sample variance needs at least two values"));
    }
    Ok(sum_squared_deviations(values)? / (values.len() - 1) as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    variance(values).map(f64::sqrt)
}

pub fn min_max(values: &[f64]) -> Result<(f64, f64)> {
    require_values(values, "range")?;
    Ok(values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v))))
}

/// Median by sorting a copy
pub fn median(values: &[f64]) -> Result<f64> {
    require_values(values, "median")?;
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    Ok(if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    })
}

/// One-pass overview of a sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub median: f64,
    pub max: f64,
}

impl Summary {
    pub fn of(values: &[f64]) -> Result<Self> {
        let (min, max) = min_max(values)?;
        Ok(Self {
            count: values.len(),
            mean: mean(values)?,
            std_dev: std_dev(values)?,
            min,
            median: median(values)?,
            max,
        })
    }

    /// Summary over every cell of a dense array
    pub fn of_array<const R: usize>(array: &NdArray<f64, R>) -> Result<Self> {
        Self::of(array.as_slice())
    }
}

/// Equal-width histogram; `edges.len() == counts.len() + 1`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
    /// Values outside the binned range
    pub outliers: usize,
}

impl Histogram {
    pub fn bin_count(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

/// Bin `values` into `bins` equal-width bins over `range` (default: the data
/// range). Bins are half-open except the last, which includes its upper edge.
pub fn histogram(values: &[f64], bins: usize, range: Option<(f64, f64)>) -> Result<Histogram> {
    if bins == 0 {
        return Err(GeometryError::invalid_input("histogram needs at least one bin"));
    }
    let (lo, hi) = match range {
        Some((lo, hi)) if lo < hi => (lo, hi),
        Some((lo, hi)) => {
            return Err(GeometryError::invalid_input(format!(
                "histogram range [{}, {}] is empty",
                lo, hi
            )))
        }
        None => {
            let (lo, hi) = min_max(values)?;
            if lo < hi {
                (lo, hi)
            } else {
                (lo - 0.5, hi + 0.5)
            }
        }
    };

    let width = (hi - lo) / bins as f64;
    let edges = (0..=bins).map(|i| lo + width * i as f64).collect();
    let mut counts = vec![0usize; bins];
    let mut outliers = 0;
    for &v in values {
        if !(lo..=hi).contains(&v) {
            outliers += 1;
            continue;
        }
        let bin = (((v - lo) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }

    Ok(Histogram {
        edges,
        counts,
        outliers,
    })
}
