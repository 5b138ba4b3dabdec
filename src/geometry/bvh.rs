// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Bounding Volume Hierarchy (BVH) for spatial acceleration
//! Used to accelerate ray casting and box queries against triangle sets

use super::{BoundingBox, Intersection, RayHit, Triangle};
use nalgebra::{Point3, Vector3};

/// BVH node
#[derive(Debug, Clone)]
pub struct BvhNode {
    /// Bounding box of this node
    pub bbox: BoundingBox,
    /// Left child (None for leaf)
    pub left: Option<Box<BvhNode>>,
    /// Right child (None for leaf)
    pub right: Option<Box<BvhNode>>,
    /// Triangle indices (only for leaf nodes)
    pub triangle_indices: Vec<usize>,
}

impl BvhNode {
    /// Create a leaf node
    fn leaf(bbox: BoundingBox, triangle_indices: Vec<usize>) -> Self {
        Self {
            bbox,
            left: None,
            right: None,
            triangle_indices,
        }
    }

    /// Create an internal node
    fn internal(bbox: BoundingBox, left: Box<BvhNode>, right: Box<BvhNode>) -> Self {
        Self {
            bbox,
            left: Some(left),
            right: Some(right),
            triangle_indices: Vec::new(),
        }
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// Bounding Volume Hierarchy over a triangle set
#[derive(Debug, Clone)]
pub struct Bvh {
    root: BvhNode,
    triangles: Vec<Triangle<3>>,
}

impl Bvh {
    /// Build BVH from triangles; leaf indices refer to positions in `triangles`
    pub fn build(triangles: Vec<Triangle<3>>) -> Self {
        if triangles.is_empty() {
            return Self {
                root: BvhNode::leaf(BoundingBox::empty(), Vec::new()),
                triangles,
            };
        }

        let items: Vec<(usize, BoundingBox)> = triangles
            .iter()
            .enumerate()
            .map(|(idx, tri)| (idx, tri.bounding_box()))
            .collect();
        let root = Self::build_recursive(items, 0);
        Self { root, triangles }
    }

    /// Recursively build BVH node
    fn build_recursive(mut items: Vec<(usize, BoundingBox)>, depth: usize) -> BvhNode {
        const MAX_DEPTH: usize = 32;
        const MIN_TRIANGLES: usize = 4;

        let bbox = items
            .iter()
            .fold(BoundingBox::empty(), |acc, (_, b)| acc.union(b));

        // Base case: create leaf if few triangles or max depth reached
        if items.len() <= MIN_TRIANGLES || depth >= MAX_DEPTH {
            let indices = items.iter().map(|(idx, _)| *idx).collect();
            return BvhNode::leaf(bbox, indices);
        }

        // Sort triangles along the longest axis and split at the median
        let axis = bbox.longest_axis();
        items.sort_by(|(_, a), (_, b)| a.center()[axis].total_cmp(&b.center()[axis]));

        let right_items = items.split_off(items.len() / 2);
        let left = Box::new(Self::build_recursive(items, depth + 1));
        let right = Box::new(Self::build_recursive(right_items, depth + 1));

        BvhNode::internal(bbox, left, right)
    }

    pub fn triangles(&self) -> &[Triangle<3>] {
        &self.triangles
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.root.bbox
    }

    /// Query triangles whose boxes intersect the given bounding box
    pub fn query_triangles(&self, bbox: &BoundingBox) -> Vec<usize> {
        let mut result = Vec::new();
        Self::query_recursive(&self.root, bbox, &mut result);
        result
    }

    fn query_recursive(node: &BvhNode, bbox: &BoundingBox, result: &mut Vec<usize>) {
        if node.bbox.is_empty() || !node.bbox.intersects(bbox) {
            return;
        }
        if node.is_leaf() {
            result.extend_from_slice(&node.triangle_indices);
            return;
        }
        if let Some(ref left) = node.left {
            Self::query_recursive(left, bbox, result);
        }
        if let Some(ref right) = node.right {
            Self::query_recursive(right, bbox, result);
        }
    }

    /// All proper hits of the ray `origin + t * direction` (t >= 0), unordered.
    /// Triangles the ray merely grazes in-plane are skipped.
    pub fn cast_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Vec<(usize, RayHit)> {
        let mut hits = Vec::new();
        self.cast_recursive(&self.root, origin, direction, &mut hits);
        hits
    }

    fn cast_recursive(
        &self,
        node: &BvhNode,
        origin: &Point3<f64>,
        direction: &Vector3<f64>,
        hits: &mut Vec<(usize, RayHit)>,
    ) {
        if node.bbox.is_empty() || node.bbox.ray_interval(origin, direction).is_none() {
            return;
        }
        if node.is_leaf() {
            for &idx in &node.triangle_indices {
                if let Intersection::At(hit) = self.triangles[idx].intersect_ray(origin, direction) {
                    hits.push((idx, hit));
                }
            }
            return;
        }
        if let Some(ref left) = node.left {
            self.cast_recursive(left, origin, direction, hits);
        }
        if let Some(ref right) = node.right {
            self.cast_recursive(right, origin, direction, hits);
        }
    }

    /// Closest hit along the ray
    pub fn nearest_hit(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<(usize, RayHit)> {
        self.cast_ray(origin, direction)
            .into_iter()
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))
    }

    /// Farthest hit along the ray (outer surface seen from inside)
    pub fn farthest_hit(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Option<(usize, RayHit)> {
        self.cast_ray(origin, direction)
            .into_iter()
            .max_by(|a, b| a.1.t.total_cmp(&b.1.t))
    }

    /// Get root node (for testing)
    #[cfg(test)]
    pub fn root(&self) -> &BvhNode {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;

    fn cube_bvh() -> Bvh {
        let mesh = shapes::cuboid(Vector3::new(10.0, 10.0, 10.0), false);
        Bvh::build(mesh.triangle_geometries().collect())
    }

    #[test]
    fn test_bvh_build() {
        let bvh = cube_bvh();
        assert!(!bvh.root().is_leaf());
        assert_eq!(bvh.triangles().len(), 12);
    }

    #[test]
    fn test_bvh_query() {
        let bvh = cube_bvh();
        let all = bvh.query_triangles(&bvh.bounding_box());
        assert_eq!(all.len(), 12);

        let corner = BoundingBox::new(Point3::new(-1.0, -1.0, -1.0), Point3::new(-0.5, -0.5, -0.5));
        assert!(bvh.query_triangles(&corner).is_empty());
    }

    #[test]
    fn test_ray_from_center_hits_each_side_once_outward() {
        let bvh = cube_bvh();
        let center = Point3::new(5.0, 5.0, 5.0);
        let direction = Vector3::new(1.0, 0.3, 0.1);
        let (_, hit) = bvh.farthest_hit(&center, &direction).unwrap();
        let exit = center + direction * hit.t;
        assert!((exit.x - 10.0).abs() < 1e-9);

        let (_, nearest) = bvh.nearest_hit(&center, &direction).unwrap();
        assert!((nearest.t - hit.t).abs() < 1e-9);
    }
}
