// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Engine facade
//!
//! The boundary a presentation layer talks to: every call is synchronous and
//! either returns a value or fails with a [`GeometryError`]. Settings live in
//! the [`EngineConfig`] the engine owns.

use crate::cluster::{gaussian_affinity, knn_affinity, Affinity, CancelToken, Init};
use crate::config::EngineConfig;
use crate::descriptor::{compute_descriptor_from_grid, compute_descriptor_from_mesh, ShDescriptor};
use crate::error::{GeometryError, Result};
use crate::geometry::Affine3;
use crate::io::{self, Encoding, MeshFormat};
use crate::mesh::Mesh;
use crate::random::Mt19937;
use crate::raster::{self, RasterOptions, VoxelGrid};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// What a descriptor is computed from
#[derive(Debug, Clone, Copy)]
pub enum DescriptorSource<'a> {
    Mesh(&'a Mesh),
    Grid(&'a VoxelGrid),
}

/// What is clustered
#[derive(Debug, Clone, Copy)]
pub enum ClusterInput<'a> {
    /// Feature vectors of equal dimension
    Points(&'a [Vec<f64>]),
    /// Precomputed pairwise weights (spectral only)
    Affinity(&'a Affinity),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    KMeans,
    Spectral,
}

/// Per-call overrides of the configured clustering settings
#[derive(Debug, Clone, Default)]
pub struct ClusterParams {
    /// RNG seed; the configured seed when `None`
    pub seed: Option<u32>,
    /// Initial centroids for K-Means
    pub seeds: Option<Vec<Vec<f64>>>,
    pub cancel: Option<CancelToken>,
}

/// Labels and summary of a clustering run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterOutcome {
    pub labels: Vec<usize>,
    /// K-Means centroids in input space, or in the spectral embedding
    pub centroids: Vec<Vec<f64>>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
}

/// Shape-analysis engine
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EngineConfig {
        &mut self.config
    }

    /// Read a PLY or STL file, detected from its contents
    pub fn load_mesh(&self, path: impl AsRef<Path>) -> Result<Mesh> {
        let mesh = io::load_mesh(path.as_ref())?;
        debug!(
            path = %path.as_ref().display(),
            vertices = mesh.vertex_count(),
            faces = mesh.face_count(),
            "loaded mesh"
        );
        Ok(mesh)
    }

    pub fn save_mesh(&self, mesh: &Mesh, path: impl AsRef<Path>, format: MeshFormat, encoding: Encoding) -> Result<()> {
        io::save_mesh(mesh, path.as_ref(), format, encoding)
    }

    pub fn transform_mesh(&self, mesh: &Mesh, transform: &Affine3) -> Mesh {
        mesh.transformed(transform)
    }

    /// Rasterize with the configured options
    pub fn rasterize(&self, mesh: &Mesh) -> Result<VoxelGrid> {
        self.rasterize_with(mesh, &self.config.raster)
    }

    pub fn rasterize_with(&self, mesh: &Mesh, options: &RasterOptions) -> Result<VoxelGrid> {
        raster::rasterize(mesh, options)
    }

    /// Harmonic descriptor up to `max_degree`, or the configured degree
    pub fn compute_descriptor(&self, source: DescriptorSource<'_>, max_degree: Option<usize>) -> Result<ShDescriptor> {
        let max_degree = max_degree.unwrap_or(self.config.descriptor.max_degree);
        match source {
            DescriptorSource::Mesh(mesh) => compute_descriptor_from_mesh(mesh, max_degree),
            DescriptorSource::Grid(grid) => compute_descriptor_from_grid(grid, max_degree),
        }
    }

    /// Group `input` into `k` clusters
    pub fn cluster(
        &self,
        input: ClusterInput<'_>,
        k: usize,
        algorithm: Algorithm,
        params: &ClusterParams,
    ) -> Result<ClusterOutcome> {
        let mut rng = Mt19937::new(params.seed.unwrap_or(self.config.kmeans.seed));
        let mut kmeans = self.config.kmeans.build(k);
        if let Some(seeds) = &params.seeds {
            kmeans = kmeans.with_init(Init::Seeds(seeds.clone()));
        }
        if let Some(token) = &params.cancel {
            kmeans = kmeans.with_cancel_token(token.clone());
        }

        let result = match (algorithm, input) {
            (Algorithm::KMeans, ClusterInput::Points(points)) => kmeans.fit(points, &mut rng)?,
            (Algorithm::KMeans, ClusterInput::Affinity(_)) => {
                return Err(GeometryError::invalid_input("K-Means needs feature vectors, not an affinity"));
            }
            (Algorithm::Spectral, input) => {
                let built;
                let affinity = match input {
                    ClusterInput::Affinity(affinity) => affinity,
                    ClusterInput::Points(points) => {
                        built = self.point_affinity(points)?;
                        &built
                    }
                };
                let mut spectral = self.config.spectral.build(k, &self.config.kmeans);
                if let Some(token) = &params.cancel {
                    spectral = spectral.with_cancel_token(token.clone());
                }
                spectral.fit(affinity, &mut rng)?.kmeans
            }
        };

        Ok(ClusterOutcome {
            labels: result.labels,
            centroids: result.centroids,
            iterations: result.iterations,
            converged: result.converged,
            inertia: result.inertia,
        })
    }

    fn point_affinity(&self, points: &[Vec<f64>]) -> Result<Affinity> {
        let spectral = &self.config.spectral;
        match spectral.neighbours {
            0 => gaussian_affinity(points, spectral.sigma),
            k => knn_affinity(points, k, spectral.sigma),
        }
    }
}
