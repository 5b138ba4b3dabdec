// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Regular voxel grids and their world mapping

use super::Fit;
use crate::array::{Array2, Array3};
use crate::error::{GeometryError, Result};
use crate::geometry::{Affine3, BoundingBox};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Placement of a regular grid in world space.
///
/// Cell `[i, j, k]` covers `origin + cell_size ⊙ [i, i+1) × [j, j+1) × [k, k+1)`;
/// the last cell along each axis also owns the grid's upper boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridMapping {
    origin: Point3<f64>,
    cell_size: Vector3<f64>,
    dims: [usize; 3],
}

impl GridMapping {
    pub fn new(origin: Point3<f64>, cell_size: Vector3<f64>, dims: [usize; 3]) -> Result<Self> {
        if cell_size.iter().any(|&s| !(s > 0.0) || !s.is_finite()) {
            return Err(GeometryError::InvalidGeometry(format!(
                "cell size must be positive, got {:?}",
                cell_size.as_slice()
            )));
        }
        Ok(Self {
            origin,
            cell_size,
            dims,
        })
    }

    /// Zero-sized grid at the origin
    pub fn empty() -> Self {
        Self {
            origin: Point3::origin(),
            cell_size: Vector3::repeat(1.0),
            dims: [0; 3],
        }
    }

    /// Fit a grid around `bounds`
    pub fn fit_bounds(bounds: &BoundingBox, resolution: usize, fit: Fit) -> Result<Self> {
        if resolution == 0 {
            return Err(GeometryError::invalid_input("raster resolution must be at least 1"));
        }
        let extent = bounds.size();
        if bounds.is_empty() || extent.iter().any(|&e| !(e > 0.0)) {
            return Err(GeometryError::InvalidGeometry(format!(
                "bounding box extent {:?} is not positive on every axis",
                extent.as_slice()
            )));
        }

        let (cell_size, dims) = match fit {
            Fit::Uniform => {
                let cell = bounds.max_extent() / resolution as f64;
                let dims = [0, 1, 2].map(|axis| {
                    // absorb rounding so an exact multiple does not gain a cell
                    ((extent[axis] / cell - 1e-9).ceil() as usize).clamp(1, resolution)
                });
                (Vector3::repeat(cell), dims)
            }
            Fit::Extent => (extent / resolution as f64, [resolution; 3]),
        };
        Self::new(bounds.min, cell_size, dims)
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }

    pub fn cell_size(&self) -> Vector3<f64> {
        self.cell_size
    }

    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    pub fn cell_count(&self) -> usize {
        self.dims.iter().product()
    }

    pub fn cell_volume(&self) -> f64 {
        self.cell_size.product()
    }

    /// World-space box covered by the whole grid
    pub fn bounds(&self) -> BoundingBox {
        let size = Vector3::new(
            self.dims[0] as f64 * self.cell_size.x,
            self.dims[1] as f64 * self.cell_size.y,
            self.dims[2] as f64 * self.cell_size.z,
        );
        BoundingBox::new(self.origin, self.origin + size)
    }

    /// Lower corner of a cell (also valid one past the last cell)
    pub fn cell_min(&self, index: [usize; 3]) -> Point3<f64> {
        Point3::new(
            self.origin.x + index[0] as f64 * self.cell_size.x,
            self.origin.y + index[1] as f64 * self.cell_size.y,
            self.origin.z + index[2] as f64 * self.cell_size.z,
        )
    }

    pub fn cell_bounds(&self, index: [usize; 3]) -> BoundingBox {
        BoundingBox::new(self.cell_min(index), self.cell_min(index.map(|i| i + 1)))
    }

    pub fn cell_center(&self, index: [usize; 3]) -> Point3<f64> {
        Point3::new(
            self.origin.x + (index[0] as f64 + 0.5) * self.cell_size.x,
            self.origin.y + (index[1] as f64 + 0.5) * self.cell_size.y,
            self.origin.z + (index[2] as f64 + 0.5) * self.cell_size.z,
        )
    }

    /// Cell containing `point`, or `None` outside the grid
    pub fn world_to_cell(&self, point: &Point3<f64>) -> Option<[usize; 3]> {
        let mut index = [0usize; 3];
        for axis in 0..3 {
            if self.dims[axis] == 0 {
                return None;
            }
            let g = (point[axis] - self.origin[axis]) / self.cell_size[axis];
            if !(g >= 0.0) || g > self.dims[axis] as f64 {
                return None;
            }
            index[axis] = (g.floor() as usize).min(self.dims[axis] - 1);
        }
        Some(index)
    }

    /// Affine map from continuous grid coordinates to world space
    pub fn to_world(&self) -> Affine3 {
        Affine3::from_parts(nalgebra::Matrix3::from_diagonal(&self.cell_size), self.origin.coords)
    }

    /// Affine map from world space to continuous grid coordinates
    pub fn to_grid(&self) -> Affine3 {
        let inverse = self.cell_size.map(|s| 1.0 / s);
        Affine3::from_parts(
            nalgebra::Matrix3::from_diagonal(&inverse),
            -self.origin.coords.component_mul(&inverse),
        )
    }
}

/// Per-cell counts over a [`GridMapping`]
///
/// Surface fill stores the number of triangles touching a cell, solid fill
/// stores 1 for filled cells. A cell is occupied when its count is non-zero.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelGrid {
    mapping: GridMapping,
    cells: Array3<u32>,
}

impl VoxelGrid {
    /// All-empty grid over `mapping`
    pub fn new(mapping: GridMapping) -> Self {
        Self {
            cells: Array3::zeros(mapping.dims()),
            mapping,
        }
    }

    pub fn empty() -> Self {
        Self::new(GridMapping::empty())
    }

    pub fn from_parts(mapping: GridMapping, cells: Array3<u32>) -> Result<Self> {
        if cells.shape() != mapping.dims() {
            return Err(GeometryError::ShapeMismatch(format!(
                "cells {:?} vs mapping {:?}",
                cells.shape(),
                mapping.dims()
            )));
        }
        Ok(Self { mapping, cells })
    }

    pub fn mapping(&self) -> &GridMapping {
        &self.mapping
    }

    pub fn dims(&self) -> [usize; 3] {
        self.mapping.dims()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &Array3<u32> {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut Array3<u32> {
        &mut self.cells
    }

    pub fn count(&self, index: [usize; 3]) -> Result<u32> {
        self.cells.at(index).copied()
    }

    pub fn is_occupied(&self, index: [usize; 3]) -> bool {
        self.cells.get(index).is_some_and(|&c| c > 0)
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c > 0).count()
    }

    pub fn cell_volume(&self) -> f64 {
        self.mapping.cell_volume()
    }

    /// Occupied cells times cell volume
    pub fn occupied_volume(&self) -> f64 {
        self.occupied_count() as f64 * self.cell_volume()
    }

    pub fn occupied_cells(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, count)| **count > 0)
            .map(|(index, _)| index)
    }

    /// World-space centres of occupied cells, in row-major order
    pub fn occupied_points(&self) -> Vec<Point3<f64>> {
        self.occupied_cells()
            .map(|index| self.mapping.cell_center(index))
            .collect()
    }

    /// Mean of occupied cell centres
    pub fn occupied_centroid(&self) -> Option<Point3<f64>> {
        let mut sum = Vector3::zeros();
        let mut n = 0usize;
        for index in self.occupied_cells() {
            sum += self.mapping.cell_center(index).coords;
            n += 1;
        }
        (n > 0).then(|| Point3::from(sum / n as f64))
    }

    /// 2D raster at `index` along `axis`
    pub fn slice(&self, axis: usize, index: usize) -> Result<Array2<u32>> {
        self.cells.slice_axis(axis, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> GridMapping {
        GridMapping::new(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.5, 1.0, 2.0), [4, 3, 2]).unwrap()
    }

    #[test]
    fn test_world_to_cell_half_open() {
        let m = mapping();
        assert_eq!(m.world_to_cell(&Point3::new(1.0, 2.0, 3.0)), Some([0, 0, 0]));
        // shared boundary belongs to the upper cell
        assert_eq!(m.world_to_cell(&Point3::new(1.5, 2.0, 3.0)), Some([1, 0, 0]));
        // grid max belongs to the last cell
        assert_eq!(m.world_to_cell(&Point3::new(3.0, 5.0, 7.0)), Some([3, 2, 1]));
        assert_eq!(m.world_to_cell(&Point3::new(0.9, 2.0, 3.0)), None);
    }

    #[test]
    fn test_affine_maps_agree() {
        let m = mapping();
        let center = m.cell_center([2, 1, 1]);
        let grid = m.to_grid().apply_point(&center);
        assert!((grid - Point3::new(2.5, 1.5, 1.5)).norm() < 1e-12);
        let back = m.to_world().apply_point(&grid);
        assert!((back - center).norm() < 1e-12);
    }

    #[test]
    fn test_fit_uniform() {
        let bounds = BoundingBox::new(Point3::origin(), Point3::new(4.0, 2.0, 1.0));
        let m = GridMapping::fit_bounds(&bounds, 8, Fit::Uniform).unwrap();
        assert_eq!(m.dims(), [8, 4, 2]);
        assert_eq!(m.cell_size(), Vector3::repeat(0.5));

        let m = GridMapping::fit_bounds(&bounds, 8, Fit::Extent).unwrap();
        assert_eq!(m.dims(), [8, 8, 8]);
        assert_eq!(m.cell_size(), Vector3::new(0.5, 0.25, 0.125));
    }

    #[test]
    fn test_fit_rejects_flat_bounds() {
        let flat = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0));
        assert!(matches!(
            GridMapping::fit_bounds(&flat, 8, Fit::Uniform),
            Err(GeometryError::InvalidGeometry(_))
        ));
        let cube = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(matches!(
            GridMapping::fit_bounds(&cube, 0, Fit::Uniform),
            Err(GeometryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_occupancy_queries() {
        let mut grid = VoxelGrid::new(mapping());
        grid.cells_mut().set([1, 2, 0], 3).unwrap();
        grid.cells_mut().set([3, 0, 1], 1).unwrap();

        assert_eq!(grid.occupied_count(), 2);
        assert!((grid.occupied_volume() - 2.0).abs() < 1e-12);
        assert!(grid.is_occupied([1, 2, 0]));
        assert!(!grid.is_occupied([9, 9, 9]));
        assert_eq!(grid.occupied_points()[0], grid.mapping().cell_center([1, 2, 0]));
        assert_eq!(grid.slice(2, 1).unwrap().as_slice().iter().sum::<u32>(), 1);
    }
}
