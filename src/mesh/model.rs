// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities

use crate::error::{GeometryError, Result};
use crate::geometry::{Affine3, BoundingBox, Triangle};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangular face defined by three vertex indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Face {
    pub indices: [usize; 3],
}

impl Face {
    pub fn new(indices: [usize; 3]) -> Self {
        Self { indices }
    }

    /// True when two or more corners reference the same vertex
    pub fn has_repeated_index(&self) -> bool {
        let [a, b, c] = self.indices;
        a == b || b == c || a == c
    }

    /// The three undirected edges, each as `[low, high]`
    pub fn edges(&self) -> [[usize; 2]; 3] {
        let [a, b, c] = self.indices;
        [[a, b], [b, c], [c, a]].map(|[p, q]| if p < q { [p, q] } else { [q, p] })
    }
}

/// Triangular mesh
///
/// Fields are private so that face indices always stay within the vertex
/// range and optional per-vertex normals always match the vertex count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
    normals: Option<Vec<Vector3<f64>>>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
        }
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            normals: None,
        }
    }

    /// Build from raw parts, checking every face index
    pub fn from_parts(vertices: Vec<Point3<f64>>, faces: Vec<Face>) -> Result<Self> {
        let mesh = Self {
            vertices,
            faces,
            normals: None,
        };
        for (face_idx, face) in mesh.faces.iter().enumerate() {
            mesh.check_face(face_idx, face)?;
        }
        Ok(mesh)
    }

    /// Generators that build indices by construction skip the check
    pub(crate) fn from_raw(vertices: Vec<Point3<f64>>, faces: Vec<Face>) -> Self {
        debug_assert!(faces
            .iter()
            .all(|f| f.indices.iter().all(|&i| i < vertices.len())));
        Self {
            vertices,
            faces,
            normals: None,
        }
    }

    fn check_face(&self, face_idx: usize, face: &Face) -> Result<()> {
        if let Some(&bad) = face.indices.iter().find(|&&i| i >= self.vertices.len()) {
            return Err(GeometryError::OutOfRange(format!(
                "face {} references vertex {} of {}",
                face_idx,
                bad,
                self.vertices.len()
            )));
        }
        Ok(())
    }

    /// Attach per-vertex normals; the count must match the vertex count
    pub fn with_normals(mut self, normals: Vec<Vector3<f64>>) -> Result<Self> {
        self.set_normals(Some(normals))?;
        Ok(self)
    }

    pub fn set_normals(&mut self, normals: Option<Vec<Vector3<f64>>>) -> Result<()> {
        if let Some(ref n) = normals {
            if n.len() != self.vertices.len() {
                return Err(GeometryError::ShapeMismatch(format!(
                    "{} normals for {} vertices",
                    n.len(),
                    self.vertices.len()
                )));
            }
        }
        self.normals = normals;
        Ok(())
    }

    /// Add a vertex and return its index.
    ///
    /// When the mesh carries normals, a zero normal is appended to keep the
    /// attribute in lockstep; call [`Mesh::recompute_normals`] afterwards.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> usize {
        let index = self.vertices.len();
        self.vertices.push(position);
        if let Some(ref mut normals) = self.normals {
            normals.push(Vector3::zeros());
        }
        index
    }

    /// Add a triangle face, returning its index
    pub fn add_triangle(&mut self, indices: [usize; 3]) -> Result<usize> {
        let face = Face::new(indices);
        self.check_face(self.faces.len(), &face)?;
        self.faces.push(face);
        Ok(self.faces.len() - 1)
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn normals(&self) -> Option<&[Vector3<f64>]> {
        self.normals.as_deref()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get face count
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Corner positions of a face
    pub fn triangle_points(&self, face_idx: usize) -> Result<[Point3<f64>; 3]> {
        let face = self.faces.get(face_idx).ok_or_else(|| {
            GeometryError::OutOfRange(format!("face {} of {}", face_idx, self.faces.len()))
        })?;
        Ok(face.indices.map(|i| self.vertices[i]))
    }

    /// Geometric triangle for every face, in face order
    pub fn triangle_geometries(&self) -> impl Iterator<Item = Triangle<3>> + '_ {
        self.faces.iter().map(|face| {
            let [a, b, c] = face.indices.map(|i| self.vertices[i]);
            Triangle::new(a, b, c)
        })
    }

    /// Transform all vertices (and normals) in place
    pub fn transform(&mut self, transform: &Affine3) {
        for vertex in &mut self.vertices {
            *vertex = transform.apply_point(vertex);
        }
        if let Some(ref mut normals) = self.normals {
            // Normals use the inverse transpose; fall back to the linear part
            // when the map is singular
            let normal_matrix = transform
                .linear
                .try_inverse()
                .map(|m| m.transpose())
                .unwrap_or(transform.linear);
            for normal in normals.iter_mut() {
                let mapped = normal_matrix * *normal;
                *normal = mapped.try_normalize(f64::EPSILON).unwrap_or(mapped);
            }
        }
    }

    /// Transformed copy, leaving `self` untouched
    pub fn transformed(&self, transform: &Affine3) -> Mesh {
        let mut mesh = self.clone();
        mesh.transform(transform);
        mesh
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// Mean of vertex positions
    pub fn vertex_centroid(&self) -> Option<Point3<f64>> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum = self
            .vertices
            .iter()
            .fold(Vector3::zeros(), |acc, v| acc + v.coords);
        Some(Point3::from(sum / self.vertices.len() as f64))
    }

    /// Area-weighted centroid of the surface; independent of tessellation density
    pub fn surface_centroid(&self) -> Option<Point3<f64>> {
        let mut weighted = Vector3::zeros();
        let mut total_area = 0.0;
        for triangle in self.triangle_geometries() {
            let area = triangle.area();
            weighted += triangle.centroid().coords * area;
            total_area += area;
        }
        if total_area <= 0.0 {
            return self.vertex_centroid();
        }
        Some(Point3::from(weighted / total_area))
    }

    /// Merge with another mesh (simple concatenation without CSG)
    ///
    /// Normals survive only when both meshes carry them.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len();
        self.normals = match (self.normals.take(), other.normals.as_ref()) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend_from_slice(theirs);
                Some(mine)
            }
            _ => None,
        };
        self.vertices.extend_from_slice(&other.vertices);
        self.faces.extend(
            other
                .faces
                .iter()
                .map(|face| Face::new(face.indices.map(|i| i + offset))),
        );
    }

    /// Weld vertices that are within epsilon distance of each other
    /// This removes duplicate vertices and updates face indices
    /// Returns the number of vertices removed
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        if self.vertices.is_empty() || epsilon <= 0.0 {
            return 0;
        }

        let original_count = self.vertices.len();
        let cell_of = |p: &Point3<f64>| -> [i64; 3] {
            [
                (p.x / epsilon).floor() as i64,
                (p.y / epsilon).floor() as i64,
                (p.z / epsilon).floor() as i64,
            ]
        };

        // Grid of already kept vertices, keyed by epsilon-sized cell
        let mut grid: AHashMap<[i64; 3], Vec<usize>> = AHashMap::new();
        let mut new_vertices: Vec<Point3<f64>> = Vec::new();
        let mut new_normals: Vec<Vector3<f64>> = Vec::new();
        let mut remap: Vec<usize> = vec![0; original_count];

        for (i, position) in self.vertices.iter().enumerate() {
            let [cx, cy, cz] = cell_of(position);
            let mut found = None;
            'search: for dx in -1..=1 {
                for dy in -1..=1 {
                    for dz in -1..=1 {
                        if let Some(candidates) = grid.get(&[cx + dx, cy + dy, cz + dz]) {
                            if let Some(&j) = candidates
                                .iter()
                                .find(|&&j| (new_vertices[j] - position).norm() < epsilon)
                            {
                                found = Some(j);
                                break 'search;
                            }
                        }
                    }
                }
            }

            remap[i] = match found {
                Some(j) => j,
                None => {
                    let j = new_vertices.len();
                    new_vertices.push(*position);
                    if let Some(ref normals) = self.normals {
                        new_normals.push(normals[i]);
                    }
                    grid.entry([cx, cy, cz]).or_default().push(j);
                    j
                }
            };
        }

        for face in &mut self.faces {
            face.indices = face.indices.map(|i| remap[i]);
        }
        self.vertices = new_vertices;
        if self.normals.is_some() {
            self.normals = Some(new_normals);
        }

        original_count - self.vertices.len()
    }

    /// Remove orphaned vertices (vertices not referenced by any face)
    /// Returns the number of vertices removed
    pub fn remove_orphaned_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for face in &self.faces {
            for &idx in &face.indices {
                used[idx] = true;
            }
        }

        // Build remapping: old_index -> new_index
        let mut remap = vec![0; self.vertices.len()];
        let mut kept = 0;
        for (old_idx, &is_used) in used.iter().enumerate() {
            if is_used {
                remap[old_idx] = kept;
                kept += 1;
            }
        }

        let removed = self.vertices.len() - kept;
        if removed == 0 {
            return 0;
        }

        let mut flags = used.iter();
        self.vertices.retain(|_| *flags.next().unwrap_or(&false));
        if let Some(ref mut normals) = self.normals {
            let mut flags = used.iter();
            normals.retain(|_| *flags.next().unwrap_or(&false));
        }
        for face in &mut self.faces {
            face.indices = face.indices.map(|i| remap[i]);
        }
        removed
    }

    /// Recompute vertex normals from face geometry
    /// Face normals are accumulated area-weighted at shared vertices
    pub fn recompute_normals(&mut self) {
        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for face in &self.faces {
            let [v0, v1, v2] = face.indices.map(|i| self.vertices[i]);
            // Cross product length is twice the area, so this is area-weighted
            let face_normal = (v1 - v0).cross(&(v2 - v0));
            for &idx in &face.indices {
                normal_sums[idx] += face_normal;
            }
        }

        let normals = normal_sums
            .into_iter()
            .map(|sum| sum.try_normalize(1e-20).unwrap_or_else(|| Vector3::new(0.0, 0.0, 1.0)))
            .collect();
        self.normals = Some(normals);
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
