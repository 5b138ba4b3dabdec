// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Solid voxelization by parity along +z
//!
//! Every (x, y) column is probed through its cell centres. A projected
//! triangle claims a column centre lying on its boundary only through a top
//! or left edge, so a centre on an edge shared by two triangles of the same
//! surface layer is counted once. Crossing depths are sorted and paired;
//! centres with `z_in <= z < z_out` are filled.

use super::VoxelGrid;
use crate::mesh::Mesh;
use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;

/// Triangle projected onto the xy plane, wound counter-clockwise
#[derive(Debug, Clone, Copy)]
struct Projected {
    corners: [Point2<f64>; 3],
    anchor: Point3<f64>,
    normal: Vector3<f64>,
}

impl Projected {
    fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.z.abs() <= 1e-12 * normal.norm() || normal.z == 0.0 {
            return None;
        }
        let flat = |p: Point3<f64>| Point2::new(p.x, p.y);
        let corners = if normal.z > 0.0 {
            [flat(a), flat(b), flat(c)]
        } else {
            [flat(a), flat(c), flat(b)]
        };
        Some(Self {
            corners,
            anchor: a,
            normal,
        })
    }

    fn x_range(&self) -> (f64, f64) {
        let xs = self.corners.map(|p| p.x);
        (xs[0].min(xs[1]).min(xs[2]), xs[0].max(xs[1]).max(xs[2]))
    }

    fn is_top_left(a: &Point2<f64>, b: &Point2<f64>) -> bool {
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        dy < 0.0 || (dy == 0.0 && dx < 0.0)
    }

    fn covers(&self, p: &Point2<f64>) -> bool {
        (0..3).all(|i| {
            let a = &self.corners[i];
            let b = &self.corners[(i + 1) % 3];
            let edge = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
            edge > 0.0 || (edge == 0.0 && Self::is_top_left(a, b))
        })
    }

    /// Height of the supporting plane above `p`
    fn depth_at(&self, p: &Point2<f64>) -> f64 {
        let n = &self.normal;
        self.anchor.z - (n.x * (p.x - self.anchor.x) + n.y * (p.y - self.anchor.y)) / n.z
    }
}

pub(super) fn fill(mesh: &Mesh, grid: &mut VoxelGrid) {
    let mapping = *grid.mapping();
    let [nx, ny, nz] = mapping.dims();
    if nx * ny * nz == 0 {
        return;
    }
    let origin = mapping.origin();
    let size = mapping.cell_size();

    // Bucket projected triangles by the column rows (x index) they may cover
    let mut rows: Vec<Vec<Projected>> = vec![Vec::new(); nx];
    let mut skipped = 0usize;
    for triangle in mesh.triangle_geometries() {
        let Some(projected) = Projected::new(triangle.a, triangle.b, triangle.c) else {
            skipped += 1;
            continue;
        };
        let (x_min, x_max) = projected.x_range();
        let first = ((x_min - origin.x) / size.x - 0.5).ceil().max(0.0) as usize;
        let last = ((x_max - origin.x) / size.x - 0.5).floor();
        if last < 0.0 {
            continue;
        }
        for row in rows.iter_mut().take((last as usize + 1).min(nx)).skip(first) {
            row.push(projected);
        }
    }
    tracing::trace!(skipped, "triangles with no xy footprint");

    grid.cells_mut()
        .as_mut_slice()
        .par_chunks_mut(nz)
        .enumerate()
        .for_each(|(column, cells)| {
            let (ix, iy) = (column / ny, column % ny);
            let probe = Point2::new(
                origin.x + (ix as f64 + 0.5) * size.x,
                origin.y + (iy as f64 + 0.5) * size.y,
            );

            let mut depths: Vec<f64> = rows[ix]
                .iter()
                .filter(|t| t.covers(&probe))
                .map(|t| t.depth_at(&probe))
                .collect();
            depths.sort_by(|a, b| a.total_cmp(b));

            // an unpaired final crossing is dropped by chunks_exact
            for pair in depths.chunks_exact(2) {
                let (z_in, z_out) = (pair[0], pair[1]);
                let start = ((z_in - origin.z) / size.z - 0.5).ceil().max(0.0) as usize;
                for (iz, cell) in cells.iter_mut().enumerate().skip(start) {
                    let z = origin.z + (iz as f64 + 0.5) * size.z;
                    if z >= z_out {
                        break;
                    }
                    if z >= z_in {
                        *cell = 1;
                    }
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_left_shares_edge_once() {
        // two triangles splitting the unit square along its diagonal
        let lower = Projected::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        )
        .unwrap();
        let upper = Projected::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();

        for probe in [Point2::new(0.25, 0.25), Point2::new(0.5, 0.5), Point2::new(0.75, 0.75)] {
            assert_eq!(lower.covers(&probe) as u8 + upper.covers(&probe) as u8, 1);
        }
    }

    #[test]
    fn test_vertical_triangle_is_skipped() {
        assert!(Projected::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_depth_on_slanted_plane() {
        let t = Projected::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        )
        .unwrap();
        assert!((t.depth_at(&Point2::new(0.5, 0.25)) - 0.5).abs() < 1e-12);
    }
}
