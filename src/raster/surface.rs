// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Surface voxelization: count the triangles touching each cell

use super::VoxelGrid;
use crate::geometry::BoundingBox;
use crate::mesh::Mesh;
use nalgebra::Point3;
use rayon::prelude::*;

/// Sutherland-Hodgman pass keeping the side `coord <= bound` (or `>=`)
fn clip(polygon: &[Point3<f64>], axis: usize, bound: f64, keep_below: bool) -> Vec<Point3<f64>> {
    let inside = |p: &Point3<f64>| if keep_below { p[axis] <= bound } else { p[axis] >= bound };
    let crossing = |p: &Point3<f64>, q: &Point3<f64>| {
        let t = (bound - p[axis]) / (q[axis] - p[axis]);
        let mut r = p + (q - p) * t;
        r[axis] = bound;
        r
    };

    let n = polygon.len();
    let mut out = Vec::with_capacity(n + 2);
    for i in 0..n {
        let current = &polygon[i];
        let previous = &polygon[(i + n - 1) % n];
        match (inside(previous), inside(current)) {
            (true, true) => out.push(*current),
            (false, true) => {
                out.push(crossing(previous, current));
                out.push(*current);
            }
            (true, false) => out.push(crossing(previous, current)),
            (false, false) => {}
        }
    }
    out
}

/// Whether the triangle meets the half-open cell `[lo, hi)`.
///
/// `closed_upper[axis]` marks the last cell on an axis, which also owns the
/// grid's upper boundary.
pub(super) fn touches_cell(
    corners: &[Point3<f64>; 3],
    cell: &BoundingBox,
    closed_upper: [bool; 3],
) -> bool {
    let mut polygon = corners.to_vec();
    for axis in 0..3 {
        polygon = clip(&polygon, axis, cell.min[axis], false);
        if polygon.is_empty() {
            return false;
        }
        polygon = clip(&polygon, axis, cell.max[axis], true);
        if polygon.is_empty() {
            return false;
        }
    }

    // A convex piece lying wholly in one upper face only touches the neighbour
    !(0..3).any(|axis| !closed_upper[axis] && polygon.iter().all(|p| p[axis] == cell.max[axis]))
}

/// Candidate cell range `[first, last]` along an axis for a coordinate interval
fn cell_range(min: f64, max: f64, origin: f64, size: f64, n: usize) -> (usize, usize) {
    let last_cell = (n - 1) as f64;
    let first = ((min - origin) / size).floor() - 1.0;
    let last = ((max - origin) / size).floor() + 1.0;
    (first.clamp(0.0, last_cell) as usize, last.clamp(0.0, last_cell) as usize)
}

pub(super) fn fill(mesh: &Mesh, grid: &mut VoxelGrid) {
    let mapping = *grid.mapping();
    let [nx, ny, nz] = mapping.dims();
    if nx * ny * nz == 0 {
        return;
    }
    let origin = mapping.origin();
    let size = mapping.cell_size();

    let triangles: Vec<([Point3<f64>; 3], BoundingBox)> = mesh
        .triangle_geometries()
        .map(|t| (t.vertices(), t.bounding_box()))
        .collect();

    grid.cells_mut()
        .as_mut_slice()
        .par_chunks_mut(ny * nz)
        .enumerate()
        .for_each(|(ix, slab)| {
            let x_lo = origin.x + ix as f64 * size.x;
            let x_hi = x_lo + size.x;
            for (corners, bbox) in &triangles {
                if bbox.max.x < x_lo || bbox.min.x > x_hi {
                    continue;
                }
                let (y0, y1) = cell_range(bbox.min.y, bbox.max.y, origin.y, size.y, ny);
                let (z0, z1) = cell_range(bbox.min.z, bbox.max.z, origin.z, size.z, nz);
                for iy in y0..=y1 {
                    for iz in z0..=z1 {
                        let index = [ix, iy, iz];
                        let closed_upper = [ix + 1 == nx, iy + 1 == ny, iz + 1 == nz];
                        if touches_cell(corners, &mapping.cell_bounds(index), closed_upper) {
                            slab[iy * nz + iz] += 1;
                        }
                    }
                }
            }
        });
}
