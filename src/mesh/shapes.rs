// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Closed, consistently oriented mesh generators
//!
//! Every generator shares vertices between adjacent faces, so the results are
//! watertight and every face winds counter-clockwise seen from outside.

use super::{Face, Mesh};
use nalgebra::{Point3, Vector3};
use std::f64::consts::PI;

const DEFAULT_SEGMENTS: usize = 32;

/// Axis-aligned box with 8 vertices and 12 faces.
///
/// With `center` the box is centred on the origin, otherwise its minimum
/// corner sits at the origin.
pub fn cuboid(size: Vector3<f64>, center: bool) -> Mesh {
    let min = if center { -size / 2.0 } else { Vector3::zeros() };
    let max = min + size;

    let vertices = vec![
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ];

    let faces = [
        // z+
        [4, 5, 6],
        [4, 6, 7],
        // z-
        [1, 0, 3],
        [1, 3, 2],
        // x+
        [5, 1, 2],
        [5, 2, 6],
        // x-
        [0, 4, 7],
        [0, 7, 3],
        // y+
        [7, 6, 2],
        [7, 2, 3],
        // y-
        [0, 1, 5],
        [0, 5, 4],
    ]
    .into_iter()
    .map(Face::new)
    .collect();

    Mesh::from_raw(vertices, faces)
}

/// Unit cube `[0, 1]^3`
pub fn unit_cube() -> Mesh {
    cuboid(Vector3::new(1.0, 1.0, 1.0), false)
}

/// Ellipsoid centred on the origin with semi-axes `radii`, poles on the z axis.
///
/// `stacks` counts latitude bands (at least 2) and `slices` longitude
/// segments (at least 3); zero selects the default resolution.
pub fn ellipsoid(radii: Vector3<f64>, stacks: usize, slices: usize) -> Mesh {
    let stacks = if stacks == 0 { DEFAULT_SEGMENTS / 2 } else { stacks.max(2) };
    let slices = if slices == 0 { DEFAULT_SEGMENTS } else { slices.max(3) };

    let mut vertices = Vec::with_capacity(2 + (stacks - 1) * slices);
    vertices.push(Point3::new(0.0, 0.0, radii.z));
    for i in 1..stacks {
        let phi = PI * i as f64 / stacks as f64;
        for j in 0..slices {
            let theta = 2.0 * PI * j as f64 / slices as f64;
            vertices.push(Point3::new(
                radii.x * phi.sin() * theta.cos(),
                radii.y * phi.sin() * theta.sin(),
                radii.z * phi.cos(),
            ));
        }
    }
    let south = vertices.len();
    vertices.push(Point3::new(0.0, 0.0, -radii.z));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + j % slices;
    let mut faces = Vec::with_capacity(2 * slices * (stacks - 1));

    for j in 0..slices {
        faces.push(Face::new([0, ring(1, j), ring(1, j + 1)]));
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            let a = ring(i, j);
            let b = ring(i, j + 1);
            let c = ring(i + 1, j);
            let d = ring(i + 1, j + 1);
            faces.push(Face::new([a, c, d]));
            faces.push(Face::new([a, d, b]));
        }
    }
    for j in 0..slices {
        faces.push(Face::new([ring(stacks - 1, j), south, ring(stacks - 1, j + 1)]));
    }

    Mesh::from_raw(vertices, faces)
}

/// Sphere of `radius` with `segments` longitude slices and half as many stacks
pub fn uv_sphere(radius: f64, segments: usize) -> Mesh {
    let segments = if segments == 0 { DEFAULT_SEGMENTS } else { segments };
    ellipsoid(Vector3::repeat(radius), (segments / 2).max(2), segments)
}

/// Capped cylinder along +z from `z = 0` to `z = height`
pub fn cylinder(height: f64, radius: f64, segments: usize) -> Mesh {
    cone(height, radius, radius, segments)
}

/// Capped frustum along +z with bottom radius `r1` and top radius `r2`
pub fn cone(height: f64, r1: f64, r2: f64, segments: usize) -> Mesh {
    let segments = if segments == 0 { DEFAULT_SEGMENTS } else { segments.max(3) };

    let mut vertices = Vec::with_capacity(2 + 2 * segments);
    vertices.push(Point3::new(0.0, 0.0, 0.0));
    vertices.push(Point3::new(0.0, 0.0, height));
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        vertices.push(Point3::new(r1 * cos, r1 * sin, 0.0));
        vertices.push(Point3::new(r2 * cos, r2 * sin, height));
    }

    let bottom = |i: usize| 2 + 2 * (i % segments);
    let top = |i: usize| 3 + 2 * (i % segments);
    let mut faces = Vec::with_capacity(4 * segments);
    for i in 0..segments {
        faces.push(Face::new([0, bottom(i + 1), bottom(i)]));
        faces.push(Face::new([1, top(i), top(i + 1)]));
        faces.push(Face::new([bottom(i), bottom(i + 1), top(i)]));
        faces.push(Face::new([top(i), bottom(i + 1), top(i + 1)]));
    }

    Mesh::from_raw(vertices, faces)
}
