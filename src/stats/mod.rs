// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Statistics and distance metrics

mod distance;
mod summary;

pub use distance::{Distance, Metric};
pub(crate) use distance::squared_euclidean;
pub use summary::{histogram, mean, median, min_max, sample_variance, std_dev, variance, Histogram, Summary};
