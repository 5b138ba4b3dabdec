// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry analytics and statistics

use super::{validate, Mesh};
use serde::{Deserialize, Serialize};

/// Geometry statistics and analytics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Enclosed volume (absolute value of the signed volume)
    pub volume: f64,
    /// Signed volume; negative for inward-facing winding
    pub signed_volume: f64,
    /// Total surface area in square units
    pub surface_area: f64,
    /// Bounding box [min_x, min_y, min_z, max_x, max_y, max_z]
    pub bbox: [f64; 6],
    /// Mean vertex position [x, y, z]
    pub centroid: [f64; 3],
    /// Area-weighted surface centroid [x, y, z]
    pub surface_centroid: [f64; 3],
    /// Number of vertices
    pub vertex_count: usize,
    /// Number of triangles
    pub triangle_count: usize,
    /// Every edge shared by exactly two triangles
    pub is_watertight: bool,
}

impl GeometryStats {
    /// Create empty stats
    pub fn empty() -> Self {
        Self {
            volume: 0.0,
            signed_volume: 0.0,
            surface_area: 0.0,
            bbox: [0.0; 6],
            centroid: [0.0; 3],
            surface_centroid: [0.0; 3],
            vertex_count: 0,
            triangle_count: 0,
            is_watertight: false,
        }
    }

    /// Extent along each axis
    pub fn size(&self) -> [f64; 3] {
        [
            self.bbox[3] - self.bbox[0],
            self.bbox[4] - self.bbox[1],
            self.bbox[5] - self.bbox[2],
        ]
    }
}

/// Analyze mesh geometry and compute statistics
pub fn analyze(mesh: &Mesh) -> GeometryStats {
    if mesh.vertex_count() == 0 || mesh.face_count() == 0 {
        return GeometryStats::empty();
    }

    let bbox = mesh.bounding_box();
    let signed_volume = signed_volume(mesh);
    let centroid = mesh.vertex_centroid().unwrap_or_else(|| bbox.center());
    let surface_centroid = mesh.surface_centroid().unwrap_or(centroid);

    GeometryStats {
        volume: signed_volume.abs(),
        signed_volume,
        surface_area: surface_area(mesh),
        bbox: [bbox.min.x, bbox.min.y, bbox.min.z, bbox.max.x, bbox.max.y, bbox.max.z],
        centroid: centroid.coords.into(),
        surface_centroid: surface_centroid.coords.into(),
        vertex_count: mesh.vertex_count(),
        triangle_count: mesh.face_count(),
        is_watertight: validate(mesh).is_watertight,
    }
}

/// Sum of signed tetrahedron volumes against the origin
pub fn signed_volume(mesh: &Mesh) -> f64 {
    mesh.triangle_geometries()
        .map(|t| t.a.coords.dot(&t.b.coords.cross(&t.c.coords)) / 6.0)
        .sum()
}

/// Calculate total surface area
pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangle_geometries().map(|t| t.area()).sum()
}
