// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pluggable distance metrics over `f64` slices

use crate::error::{GeometryError, Result};
use serde::{Deserialize, Serialize};

/// Symmetric, non-negative dissimilarity between equal-length vectors
pub trait Distance: Send + Sync {
    /// Callers guarantee `a.len() == b.len()`
    fn distance(&self, a: &[f64], b: &[f64]) -> f64;

    /// Length-checked variant
    fn checked_distance(&self, a: &[f64], b: &[f64]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(GeometryError::ShapeMismatch(format!(
                "vectors of length {} and {}",
                a.len(),
                b.len()
            )));
        }
        Ok(self.distance(a, b))
    }
}

/// Built-in metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Euclidean,
    SquaredEuclidean,
    Manhattan,
    Chebyshev,
    /// `1 - cos(a, b)`, in `[0, 2]`
    Cosine,
}

impl Metric {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
            Self::Cosine => "cosine",
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "euclidean" => Ok(Self::Euclidean),
            "squared_euclidean" | "sqeuclidean" => Ok(Self::SquaredEuclidean),
            "manhattan" | "cityblock" => Ok(Self::Manhattan),
            "chebyshev" => Ok(Self::Chebyshev),
            "cosine" => Ok(Self::Cosine),
            other => Err(GeometryError::invalid_input(format!("unknown metric '{}'", other))),
        }
    }
}

pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

impl Distance for Metric {
    fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Self::Euclidean => squared_euclidean(a, b).sqrt(),
            Self::SquaredEuclidean => squared_euclidean(a, b),
            Self::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
            Self::Chebyshev => a.iter().zip(b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max),
            Self::Cosine => {
                let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                let norm_b = b.iter().map(|y| y * y).sum::<f64>().sqrt();
                match (norm_a > 0.0, norm_b > 0.0) {
                    (true, true) => (1.0 - dot / (norm_a * norm_b)).clamp(0.0, 2.0),
                    (false, false) => 0.0,
                    _ => 1.0,
                }
            }
        }
    }
}
