// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spectral clustering over a weighted affinity graph
//!
//! Nodes are embedded with the eigenvectors of the `k` smallest eigenvalues of
//! the symmetric normalized Laplacian `I - D^-1/2 W D^-1/2`, rows are scaled
//! to unit length, and the embedding is clustered with K-Means.

use super::cancel::{self, CancelToken};
use super::kmeans::{point_dimension, KMeans, KMeansResult};
use crate::error::{GeometryError, Result};
use crate::math::{is_symmetric, symmetric_eigen};
use crate::mesh::Mesh;
use crate::stats::squared_euclidean;
use nalgebra::DMatrix;
use rand::Rng;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_EIGEN_ITERATIONS: usize = 1000;

/// Symmetric, non-negative pairwise weights
#[derive(Debug, Clone, PartialEq)]
pub enum Affinity {
    Dense(DMatrix<f64>),
    /// Undirected edges over nodes `0..n`; repeated pairs add up
    Graph { n: usize, edges: Vec<(usize, usize, f64)> },
}

impl Affinity {
    pub fn len(&self) -> usize {
        match self {
            Self::Dense(w) => w.nrows(),
            Self::Graph { n, .. } => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Dense(w) => {
                if w.nrows() != w.ncols() {
                    return Err(GeometryError::invalid_input(format!(
                        "affinity matrix is {}x{}",
                        w.nrows(),
                        w.ncols()
                    )));
                }
                if w.iter().any(|x| !x.is_finite() || *x < 0.0) {
                    return Err(GeometryError::invalid_input("affinity weights must be finite and non-negative"));
                }
                if !is_symmetric(w, 1e-9 * w.amax().max(1.0)) {
                    return Err(GeometryError::invalid_input("affinity matrix is not symmetric"));
                }
            }
            Self::Graph { n, edges } => {
                for &(i, j, weight) in edges {
                    if i >= *n || j >= *n {
                        return Err(GeometryError::invalid_input(format!(
                            "edge ({}, {}) outside a graph of {} nodes",
                            i, j, n
                        )));
                    }
                    if !weight.is_finite() || weight < 0.0 {
                        return Err(GeometryError::invalid_input(format!(
                            "edge ({}, {}) has weight {}",
                            i, j, weight
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Dense weight matrix; graph edges are mirrored
    pub fn to_dense(&self) -> DMatrix<f64> {
        match self {
            Self::Dense(w) => w.clone(),
            Self::Graph { n, edges } => {
                let mut w = DMatrix::zeros(*n, *n);
                for &(i, j, weight) in edges {
                    w[(i, j)] += weight;
                    if i != j {
                        w[(j, i)] += weight;
                    }
                }
                w
            }
        }
    }
}

fn check_sigma(sigma: f64) -> Result<f64> {
    if !(sigma > 0.0 && sigma.is_finite()) {
        return Err(GeometryError::invalid_input(format!("sigma must be positive, got {}", sigma)));
    }
    Ok(2.0 * sigma * sigma)
}

/// Fully connected graph with `exp(-|a - b|² / 2σ²)` weights and a zero diagonal
pub fn gaussian_affinity<P: AsRef<[f64]>>(points: &[P], sigma: f64) -> Result<Affinity> {
    point_dimension(points)?;
    let two_sigma_sq = check_sigma(sigma)?;
    let n = points.len();
    let w = DMatrix::from_fn(n, n, |i, j| {
        if i == j {
            0.0
        } else {
            (-squared_euclidean(points[i].as_ref(), points[j].as_ref()) / two_sigma_sq).exp()
        }
    });
    Ok(Affinity::Dense(w))
}

/// Sparse graph joining each point to its `k` nearest neighbours (made
/// symmetric), with Gaussian weights
pub fn knn_affinity<P: AsRef<[f64]> + Sync>(points: &[P], k: usize, sigma: f64) -> Result<Affinity> {
    point_dimension(points)?;
    let two_sigma_sq = check_sigma(sigma)?;
    let n = points.len();
    if k == 0 || k >= n {
        return Err(GeometryError::invalid_input(format!(
            "neighbour count {} must lie in 1..{}",
            k, n
        )));
    }

    let neighbours: Vec<Vec<(usize, f64)>> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut others: Vec<(usize, f64)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (j, squared_euclidean(points[i].as_ref(), points[j].as_ref())))
                .collect();
            others.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
            others.truncate(k);
            others
        })
        .collect();

    let mut edges = BTreeMap::new();
    for (i, list) in neighbours.into_iter().enumerate() {
        for (j, d2) in list {
            edges.insert((i.min(j), i.max(j)), (-d2 / two_sigma_sq).exp());
        }
    }
    Ok(Affinity::Graph {
        n,
        edges: edges.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
    })
}

/// Vertex graph of a mesh: one edge per triangle edge, Gaussian in edge length
pub fn mesh_affinity(mesh: &Mesh, sigma: f64) -> Result<Affinity> {
    let two_sigma_sq = check_sigma(sigma)?;
    if mesh.vertex_count() == 0 {
        return Err(GeometryError::invalid_input("mesh has no vertices"));
    }
    let vertices = mesh.vertices();
    let mut edges = BTreeMap::new();
    for face in mesh.faces().iter().filter(|f| !f.has_repeated_index()) {
        for [a, b] in face.edges() {
            let d2 = (vertices[a] - vertices[b]).norm_squared();
            edges.insert((a, b), (-d2 / two_sigma_sq).exp());
        }
    }
    Ok(Affinity::Graph {
        n: mesh.vertex_count(),
        edges: edges.into_iter().map(|((i, j), w)| (i, j, w)).collect(),
    })
}

/// Spectral clustering parameters; the embedded rows are grouped by the
/// wrapped [`KMeans`], which also fixes `k`
#[derive(Debug, Clone)]
pub struct SpectralClustering {
    kmeans: KMeans,
    eigen_max_iterations: usize,
    cancel: Option<CancelToken>,
}

impl SpectralClustering {
    pub fn new(k: usize) -> Self {
        Self::from_kmeans(KMeans::new(k))
    }

    pub fn from_kmeans(kmeans: KMeans) -> Self {
        Self {
            kmeans,
            eigen_max_iterations: DEFAULT_EIGEN_ITERATIONS,
            cancel: None,
        }
    }

    pub fn with_eigen_max_iterations(mut self, max_iterations: usize) -> Self {
        self.eigen_max_iterations = max_iterations;
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.kmeans = self.kmeans.with_cancel_token(token.clone());
        self.cancel = Some(token);
        self
    }

    pub fn k(&self) -> usize {
        self.kmeans.k()
    }

    pub fn fit<R: Rng + ?Sized>(&self, affinity: &Affinity, rng: &mut R) -> Result<SpectralResult> {
        affinity.validate()?;
        let n = affinity.len();
        let k = self.k();
        if k == 0 || k > n {
            return Err(GeometryError::invalid_input(format!("k = {} must lie in 1..={}", k, n)));
        }
        cancel::check(self.cancel.as_ref())?;

        let laplacian = normalized_laplacian(&affinity.to_dense());
        let eigen = symmetric_eigen(&laplacian, self.eigen_max_iterations)?;
        cancel::check(self.cancel.as_ref())?;
        debug!(
            n,
            k,
            smallest = eigen.values.first().copied().unwrap_or_default(),
            "laplacian eigen-solve finished"
        );

        let mut embedding = eigen.vectors.columns(0, k).into_owned();
        for mut row in embedding.row_iter_mut() {
            let norm = row.norm();
            if norm > 0.0 {
                row.unscale_mut(norm);
            }
        }

        let rows: Vec<Vec<f64>> = embedding
            .row_iter()
            .map(|row| row.iter().copied().collect())
            .collect();
        let kmeans = self.kmeans.fit(&rows, rng)?;

        Ok(SpectralResult {
            labels: kmeans.labels.clone(),
            eigenvalues: eigen.values[..k].to_vec(),
            embedding,
            kmeans,
        })
    }
}

/// `I - D^-1/2 W D^-1/2`; rows and columns of isolated nodes are zero
fn normalized_laplacian(w: &DMatrix<f64>) -> DMatrix<f64> {
    let n = w.nrows();
    let inv_sqrt: Vec<f64> = w
        .row_iter()
        .map(|row| {
            let degree = row.sum();
            if degree > 0.0 {
                1.0 / degree.sqrt()
            } else {
                0.0
            }
        })
        .collect();
    DMatrix::from_fn(n, n, |i, j| {
        let scaled = w[(i, j)] * inv_sqrt[i] * inv_sqrt[j];
        match (i == j, inv_sqrt[i] > 0.0) {
            (true, true) => 1.0 - scaled,
            (true, false) => 0.0,
            (false, _) => -scaled,
        }
    })
}

/// Outcome of [`SpectralClustering::fit`]
#[derive(Debug, Clone)]
pub struct SpectralResult {
    pub labels: Vec<usize>,
    /// The `k` smallest Laplacian eigenvalues, ascending
    pub eigenvalues: Vec<f64>,
    /// Row-normalized `n x k` spectral embedding
    pub embedding: DMatrix<f64>,
    /// K-Means run on the embedding rows
    pub kmeans: KMeansResult,
}
