// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - dimension-generic primitives, transforms and spatial indexing

mod bbox;
mod bvh;
mod primitives;
mod transform;

pub use bbox::{Aabb, BoundingBox, Rect};
pub use bvh::{Bvh, BvhNode};
pub use primitives::{Hit, Hyperplane, Intersection, Line, Plane, RayHit, Segment, Triangle};
pub use transform::{Affine2, Affine3, AffineTransform};

use nalgebra::{Point, SVector};

/// Fixed-size vector of dimension `D`
pub type VecN<const D: usize> = SVector<f64, D>;
/// Fixed-size point of dimension `D`
pub type PointN<const D: usize> = Point<f64, D>;

pub type Vector2D = VecN<2>;
pub type Vector3D = VecN<3>;
pub type Point2D = PointN<2>;
pub type Point3D = PointN<3>;
