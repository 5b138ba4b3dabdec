// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Topology and degeneracy checks
//!
//! Detection only: nothing here mutates the mesh.

use super::Mesh;
use crate::math::constants::DEGENERATE_AREA;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Findings of [`validate`]; edges are `[low, high]` vertex index pairs, sorted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshReport {
    /// Faces whose area is below `DEGENERATE_AREA`
    pub degenerate_faces: Vec<usize>,
    /// Faces referencing the same vertex more than once
    pub repeated_index_faces: Vec<usize>,
    /// Edges shared by more than two faces
    pub non_manifold_edges: Vec<[usize; 2]>,
    /// Edges used by exactly one face
    pub boundary_edges: Vec<[usize; 2]>,
    /// Every edge is shared by exactly two faces
    pub is_watertight: bool,
}

impl MeshReport {
    /// No degenerate faces and no non-manifold edges
    pub fn is_clean(&self) -> bool {
        self.degenerate_faces.is_empty()
            && self.repeated_index_faces.is_empty()
            && self.non_manifold_edges.is_empty()
    }
}

/// Count edge usage across all faces
pub fn edge_usage(mesh: &Mesh) -> AHashMap<[usize; 2], usize> {
    let mut edge_count: AHashMap<[usize; 2], usize> = AHashMap::with_capacity(mesh.face_count() * 2);
    for face in mesh.faces() {
        if face.has_repeated_index() {
            continue;
        }
        for edge in face.edges() {
            *edge_count.entry(edge).or_insert(0) += 1;
        }
    }
    edge_count
}

/// Inspect a mesh for degenerate faces and non-manifold or open edges
pub fn validate(mesh: &Mesh) -> MeshReport {
    let mut report = MeshReport::default();

    for (face_idx, (face, triangle)) in mesh.faces().iter().zip(mesh.triangle_geometries()).enumerate() {
        if face.has_repeated_index() {
            report.repeated_index_faces.push(face_idx);
        }
        if triangle.is_degenerate(DEGENERATE_AREA) {
            report.degenerate_faces.push(face_idx);
        }
    }

    for (edge, count) in edge_usage(mesh) {
        match count {
            1 => report.boundary_edges.push(edge),
            2 => {}
            _ => report.non_manifold_edges.push(edge),
        }
    }
    report.boundary_edges.sort_unstable();
    report.non_manifold_edges.sort_unstable();

    report.is_watertight = !mesh.is_empty()
        && report.boundary_edges.is_empty()
        && report.non_manifold_edges.is_empty()
        && report.repeated_index_faces.is_empty();

    if !report.is_clean() {
        tracing::debug!(
            degenerate = report.degenerate_faces.len(),
            repeated = report.repeated_index_faces.len(),
            non_manifold = report.non_manifold_edges.len(),
            "mesh validation found defects"
        );
    }

    report
}
