// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rasterization of triangle meshes into voxel grids
//!
//! Two fill rules are available. [`FillRule::Solid`] (the default) marks cells
//! whose centre lies inside a closed surface using parity along +z.
//! [`FillRule::Surface`] counts, per cell, the triangles meeting the cell,
//! where cells are half-open so that a face lying exactly on a shared cell
//! boundary belongs to the upper cell only. Work is split across disjoint
//! cell ranges with rayon.

mod grid;
mod solid;
mod surface;

pub use grid::{GridMapping, VoxelGrid};

use crate::error::Result;
use crate::mesh::Mesh;
use serde::{Deserialize, Serialize};

/// How occupied cells are determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    /// Cells touched by the surface, with per-cell triangle counts
    Surface,
    /// Cells whose centre is enclosed by the surface
    #[default]
    Solid,
}

/// How the grid is fitted to the mesh bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fit {
    /// Cubic cells; the longest axis gets `resolution` cells
    #[default]
    Uniform,
    /// `resolution` cells on every axis, stretched per axis
    Extent,
}

/// Rasterization parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterOptions {
    pub resolution: usize,
    pub fit: Fit,
    pub fill: FillRule,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            resolution: 32,
            fit: Fit::default(),
            fill: FillRule::default(),
        }
    }
}

impl RasterOptions {
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    pub fn with_fill(mut self, fill: FillRule) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_fit(mut self, fit: Fit) -> Self {
        self.fit = fit;
        self
    }
}

/// Convert a mesh into a voxel grid fitted to its bounding box.
///
/// A mesh without faces yields an empty grid. Fails with `InvalidInput` for a
/// zero resolution and `InvalidGeometry` when the bounds are flat on any axis.
pub fn rasterize(mesh: &Mesh, options: &RasterOptions) -> Result<VoxelGrid> {
    if mesh.is_empty() {
        tracing::debug!("rasterizing mesh without faces");
        return Ok(VoxelGrid::empty());
    }

    let mapping = GridMapping::fit_bounds(&mesh.bounding_box(), options.resolution, options.fit)?;
    let mut grid = VoxelGrid::new(mapping);
    match options.fill {
        FillRule::Surface => surface::fill(mesh, &mut grid),
        FillRule::Solid => solid::fill(mesh, &mut grid),
    }

    tracing::debug!(
        dims = ?grid.dims(),
        fill = ?options.fill,
        occupied = grid.occupied_count(),
        "rasterized mesh"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;
    use crate::mesh::shapes;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_unit_cube_solid_is_exact() {
        let grid = rasterize(&shapes::unit_cube(), &RasterOptions::default().with_resolution(10)).unwrap();
        assert_eq!(grid.dims(), [10, 10, 10]);
        assert_eq!(grid.occupied_count(), 1000);
        assert!((grid.occupied_volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_mesh_gives_empty_grid() {
        let grid = rasterize(&Mesh::new(), &RasterOptions::default()).unwrap();
        assert!(grid.is_empty());
        assert_eq!(grid.dims(), [0, 0, 0]);
    }

    #[test]
    fn test_flat_mesh_is_invalid() {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
        mesh.add_triangle([a, b, c]).unwrap();
        assert!(matches!(
            rasterize(&mesh, &RasterOptions::default()),
            Err(GeometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_surface_shell_of_cube() {
        let options = RasterOptions::default()
            .with_resolution(4)
            .with_fill(FillRule::Surface);
        let grid = rasterize(&shapes::unit_cube(), &options).unwrap();

        // every boundary cell of a 4^3 grid is touched, interior cells are not
        assert_eq!(grid.occupied_count(), 4 * 4 * 4 - 2 * 2 * 2);
        assert!(!grid.is_occupied([1, 1, 1]));
        assert!(grid.is_occupied([0, 0, 0]));
        assert!(grid.is_occupied([3, 3, 3]));
    }

    #[test]
    fn test_extent_fit_stretches_cells() {
        let mesh = shapes::cuboid(Vector3::new(4.0, 2.0, 1.0), false);
        let options = RasterOptions::default().with_resolution(8).with_fit(Fit::Extent);
        let grid = rasterize(&mesh, &options).unwrap();
        assert_eq!(grid.dims(), [8, 8, 8]);
        assert_eq!(grid.occupied_count(), 512);
        assert!((grid.occupied_volume() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_sphere_volume_estimate() {
        let mesh = shapes::uv_sphere(1.0, 48);
        let grid = rasterize(&mesh, &RasterOptions::default().with_resolution(40)).unwrap();
        let exact = 4.0 / 3.0 * std::f64::consts::PI;
        assert!((grid.occupied_volume() - exact).abs() / exact < 0.05);
    }
}
