// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Functions sampled on a spherical grid, and radial extent extraction

use super::SphericalSampling;
use crate::error::{GeometryError, Result};
use crate::geometry::Bvh;
use crate::mesh::Mesh;
use crate::raster::VoxelGrid;
use nalgebra::{Point3, Vector3};
use rayon::prelude::*;

/// Values of a function at every sample of a [`SphericalSampling`], ring-major
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalSignal {
    sampling: SphericalSampling,
    values: Vec<f64>,
}

impl SphericalSignal {
    pub fn from_values(sampling: SphericalSampling, values: Vec<f64>) -> Result<Self> {
        if values.len() != sampling.len() {
            return Err(GeometryError::ShapeMismatch(format!(
                "{} values for {} samples",
                values.len(),
                sampling.len()
            )));
        }
        Ok(Self { sampling, values })
    }

    /// Sample `f` at every direction
    pub fn from_fn(sampling: SphericalSampling, f: impl Fn(&Vector3<f64>) -> f64 + Sync) -> Self {
        let values = sampling.directions().par_iter().map(&f).collect();
        Self { sampling, values }
    }

    pub fn sampling(&self) -> &SphericalSampling {
        &self.sampling
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Value at latitude ring `ring`, longitude column `column`
    pub fn value(&self, ring: usize, column: usize) -> Result<f64> {
        let (n_theta, n_phi) = (self.sampling.n_theta(), self.sampling.n_phi());
        if ring >= n_theta || column >= n_phi {
            return Err(GeometryError::OutOfRange(format!(
                "sample ({}, {}) on a {}x{} sampling",
                ring, column, n_theta, n_phi
            )));
        }
        Ok(self.values[ring * n_phi + column])
    }

    /// Values of one latitude ring
    pub fn ring(&self, ring: usize) -> Result<&[f64]> {
        let n_phi = self.sampling.n_phi();
        self.values.chunks(n_phi).nth(ring).ok_or_else(|| {
            GeometryError::OutOfRange(format!("ring {} of {}", ring, self.sampling.n_theta()))
        })
    }
}

/// Distance from the area-weighted surface centroid to the outermost surface
/// point along each sample direction. Directions that miss the surface read 0.
pub fn radial_signal_from_mesh(mesh: &Mesh, sampling: &SphericalSampling) -> Result<SphericalSignal> {
    let center = mesh
        .surface_centroid()
        .filter(|_| !mesh.is_empty())
        .ok_or_else(|| GeometryError::InvalidGeometry("cannot sample a mesh without faces".into()))?;
    let bvh = Bvh::build(mesh.triangle_geometries().collect());

    let directions = sampling.directions();
    let values: Vec<f64> = directions
        .par_iter()
        .map(|direction| {
            bvh.farthest_hit(&center, direction)
                .map(|(_, hit)| hit.t)
                .unwrap_or(0.0)
        })
        .collect();

    let misses = values.iter().filter(|&&v| v == 0.0).count();
    if misses > 0 {
        tracing::warn!(misses, samples = values.len(), "rays missed the surface");
    }
    tracing::debug!(samples = values.len(), "sampled radial signal from mesh");
    SphericalSignal::from_values(sampling.clone(), values)
}

/// Distance from the occupied-cell centroid to the last occupied cell met
/// when marching outward along each direction
pub fn radial_signal_from_grid(grid: &VoxelGrid, sampling: &SphericalSampling) -> Result<SphericalSignal> {
    let center = grid
        .occupied_centroid()
        .ok_or_else(|| GeometryError::InvalidGeometry("cannot sample a grid without occupied cells".into()))?;
    let mapping = grid.mapping();
    let step = 0.5 * mapping.cell_size().min();
    let reach = mapping.bounds().size().norm();
    let steps = (reach / step).ceil() as usize + 1;

    let march = |direction: &Vector3<f64>| -> f64 {
        let mut last = 0.0;
        for i in 0..=steps {
            let t = i as f64 * step;
            let p: Point3<f64> = center + direction * t;
            match mapping.world_to_cell(&p) {
                Some(cell) if grid.is_occupied(cell) => last = t,
                Some(_) => {}
                None if t > 0.0 => break,
                None => {}
            }
        }
        last
    };

    let values = sampling.directions().par_iter().map(march).collect();
    tracing::debug!(step, "sampled radial signal from grid");
    SphericalSignal::from_values(sampling.clone(), values)
}
