// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Axis-aligned bounding boxes in any dimension

use super::{PointN, VecN};

/// Axis-aligned box `[min, max]` in `D` dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const D: usize> {
    pub min: PointN<D>,
    pub max: PointN<D>,
}

/// 2D axis-aligned rectangle
pub type Rect = Aabb<2>;
/// 3D axis-aligned bounding box
pub type BoundingBox = Aabb<3>;

impl<const D: usize> Aabb<D> {
    pub fn new(min: PointN<D>, max: PointN<D>) -> Self {
        Self { min, max }
    }

    /// Inverted box that any point expands
    pub fn empty() -> Self {
        Self {
            min: PointN::from(VecN::repeat(f64::INFINITY)),
            max: PointN::from(VecN::repeat(f64::NEG_INFINITY)),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a PointN<D>>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_to_include(point);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        (0..D).any(|axis| self.min[axis] > self.max[axis])
    }

    pub fn expand_to_include(&mut self, point: &PointN<D>) {
        for axis in 0..D {
            self.min[axis] = self.min[axis].min(point[axis]);
            self.max[axis] = self.max[axis].max(point[axis]);
        }
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut merged = *self;
        merged.expand_to_include(&other.min);
        merged.expand_to_include(&other.max);
        merged
    }

    pub fn center(&self) -> PointN<D> {
        PointN::from((self.min.coords + self.max.coords) * 0.5)
    }

    pub fn size(&self) -> VecN<D> {
        self.max - self.min
    }

    /// Product of extents (area in 2D, volume in 3D)
    pub fn volume(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.size().iter().product()
    }

    pub fn max_extent(&self) -> f64 {
        self.size().max()
    }

    /// Axis with the largest extent
    pub fn longest_axis(&self) -> usize {
        self.size().imax()
    }

    /// Inclusive containment test
    pub fn contains(&self, point: &PointN<D>) -> bool {
        (0..D).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Inclusive overlap test
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|axis| self.min[axis] <= other.max[axis] && self.max[axis] >= other.min[axis])
    }

    /// Parameter interval `[t_near, t_far]` where the ray `origin + t * direction`
    /// is inside the box, clipped to `t >= 0`
    pub fn ray_interval(&self, origin: &PointN<D>, direction: &VecN<D>) -> Option<(f64, f64)> {
        let mut t_near = 0.0_f64;
        let mut t_far = f64::INFINITY;
        for axis in 0..D {
            if direction[axis] == 0.0 {
                if origin[axis] < self.min[axis] || origin[axis] > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction[axis];
            let mut t0 = (self.min[axis] - origin[axis]) * inv;
            let mut t1 = (self.max[axis] - origin[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_near = t_near.max(t0);
            t_far = t_far.min(t1);
            if t_near > t_far {
                return None;
            }
        }
        Some((t_near, t_far))
    }

    /// Check if two bounding boxes are approximately equal within tolerance
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        (0..D).all(|axis| {
            (self.min[axis] - other.min[axis]).abs() < tolerance
                && (self.max[axis] - other.max[axis]).abs() < tolerance
        })
    }
}
