// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Unsupervised grouping of points, voxels and mesh vertices

mod cancel;
mod kmeans;
mod spectral;

pub use cancel::CancelToken;
pub use kmeans::{Init, KMeans, KMeansResult, DEFAULT_MAX_ITERATIONS, DEFAULT_TOLERANCE};
pub use spectral::{
    gaussian_affinity, knn_affinity, mesh_affinity, Affinity, SpectralClustering, SpectralResult,
    DEFAULT_EIGEN_ITERATIONS,
};
