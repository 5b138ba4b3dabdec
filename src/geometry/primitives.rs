// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Lines, segments, hyperplanes and triangles, generic over dimension
//!
//! Intersection queries return [`Intersection`], which separates "the objects
//! do not meet" from "the objects meet everywhere" (parallel and coincident,
//! or coplanar).

use super::{Aabb, PointN, VecN};
use crate::error::{GeometryError, Result};
use crate::math::constants::GEOMETRY_EPSILON;
use nalgebra::{Point3, Vector3};

/// Outcome of an intersection query
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection<T> {
    /// The objects do not meet
    Disjoint,
    /// The objects meet in exactly this
    At(T),
    /// The objects meet everywhere along a shared subspace
    Coincident,
}

impl<T> Intersection<T> {
    pub fn is_disjoint(&self) -> bool {
        matches!(self, Self::Disjoint)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::At(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Intersection<U> {
        match self {
            Self::Disjoint => Intersection::Disjoint,
            Self::At(value) => Intersection::At(f(value)),
            Self::Coincident => Intersection::Coincident,
        }
    }
}

/// Point where a parametric line meets something, with its line parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<const D: usize> {
    pub t: f64,
    pub point: PointN<D>,
}

/// Infinite line `origin + t * direction` with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line<const D: usize> {
    pub origin: PointN<D>,
    pub direction: VecN<D>,
}

impl<const D: usize> Line<D> {
    pub fn new(origin: PointN<D>, direction: VecN<D>) -> Result<Self> {
        let length = direction.norm();
        if length < GEOMETRY_EPSILON {
            return Err(GeometryError::InvalidGeometry("line direction has zero length".into()));
        }
        Ok(Self {
            origin,
            direction: direction / length,
        })
    }

    /// Line through two distinct points
    pub fn through(a: &PointN<D>, b: &PointN<D>) -> Result<Self> {
        Self::new(*a, b - a)
    }

    pub fn point_at(&self, t: f64) -> PointN<D> {
        self.origin + self.direction * t
    }

    /// Parameter of the orthogonal projection of `point` onto the line
    pub fn project_parameter(&self, point: &PointN<D>) -> f64 {
        (point - self.origin).dot(&self.direction)
    }

    pub fn distance_to_point(&self, point: &PointN<D>) -> f64 {
        (point - self.point_at(self.project_parameter(point))).norm()
    }

    /// Intersect two lines: a single point, `Coincident` for the same line, or
    /// `Disjoint` for distinct parallel or skew lines
    pub fn intersect_line(&self, other: &Line<D>) -> Intersection<PointN<D>> {
        let b = self.direction.dot(&other.direction);
        let denom = 1.0 - b * b;
        let w = self.origin - other.origin;

        if denom < GEOMETRY_EPSILON {
            return if other.distance_to_point(&self.origin) < GEOMETRY_EPSILON {
                Intersection::Coincident
            } else {
                Intersection::Disjoint
            };
        }

        let d = self.direction.dot(&w);
        let e = other.direction.dot(&w);
        let t = (b * e - d) / denom;
        let s = (e - b * d) / denom;
        let p = self.point_at(t);
        let q = other.point_at(s);

        if (p - q).norm() < GEOMETRY_EPSILON {
            Intersection::At(PointN::from((p.coords + q.coords) * 0.5))
        } else {
            Intersection::Disjoint
        }
    }
}

/// Finite segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment<const D: usize> {
    pub start: PointN<D>,
    pub end: PointN<D>,
}

impl<const D: usize> Segment<D> {
    pub fn new(start: PointN<D>, end: PointN<D>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    pub fn point_at(&self, t: f64) -> PointN<D> {
        self.start + (self.end - self.start) * t
    }

    pub fn midpoint(&self) -> PointN<D> {
        self.point_at(0.5)
    }
}

/// Hyperplane `normal · x = offset` with a unit normal
///
/// A line in 2D, a plane in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperplane<const D: usize> {
    pub normal: VecN<D>,
    pub offset: f64,
}

/// 3D plane
pub type Plane = Hyperplane<3>;

impl<const D: usize> Hyperplane<D> {
    pub fn new(normal: VecN<D>, offset: f64) -> Result<Self> {
        let length = normal.norm();
        if length < GEOMETRY_EPSILON {
            return Err(GeometryError::InvalidGeometry("plane normal has zero length".into()));
        }
        Ok(Self {
            normal: normal / length,
            offset: offset / length,
        })
    }

    pub fn from_point_normal(point: &PointN<D>, normal: VecN<D>) -> Result<Self> {
        let unit = Self::new(normal, 0.0)?.normal;
        Ok(Self {
            normal: unit,
            offset: unit.dot(&point.coords),
        })
    }

    /// Positive on the side the normal points to
    pub fn signed_distance(&self, point: &PointN<D>) -> f64 {
        self.normal.dot(&point.coords) - self.offset
    }

    pub fn project(&self, point: &PointN<D>) -> PointN<D> {
        point - self.normal * self.signed_distance(point)
    }

    pub fn intersect_line(&self, line: &Line<D>) -> Intersection<Hit<D>> {
        let denom = self.normal.dot(&line.direction);
        let distance = self.signed_distance(&line.origin);
        if denom.abs() < GEOMETRY_EPSILON {
            return if distance.abs() < GEOMETRY_EPSILON {
                Intersection::Coincident
            } else {
                Intersection::Disjoint
            };
        }
        let t = -distance / denom;
        Intersection::At(Hit {
            t,
            point: line.point_at(t),
        })
    }

    /// Segment crossing; `t` is the fraction along the segment in `[0, 1]`
    pub fn intersect_segment(&self, segment: &Segment<D>) -> Intersection<Hit<D>> {
        let d0 = self.signed_distance(&segment.start);
        let d1 = self.signed_distance(&segment.end);
        if d0.abs() < GEOMETRY_EPSILON && d1.abs() < GEOMETRY_EPSILON {
            return Intersection::Coincident;
        }
        if (d0 > GEOMETRY_EPSILON && d1 > GEOMETRY_EPSILON)
            || (d0 < -GEOMETRY_EPSILON && d1 < -GEOMETRY_EPSILON)
        {
            return Intersection::Disjoint;
        }
        let t = if (d0 - d1).abs() < f64::EPSILON {
            0.0
        } else {
            (d0 / (d0 - d1)).clamp(0.0, 1.0)
        };
        Intersection::At(Hit {
            t,
            point: segment.point_at(t),
        })
    }
}

impl Plane {
    /// Plane through three non-collinear points, normal by the right-hand rule
    pub fn from_points(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> Result<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < GEOMETRY_EPSILON {
            return Err(GeometryError::InvalidGeometry("plane points are collinear".into()));
        }
        Self::from_point_normal(a, normal)
    }
}

/// Ray hit on a triangle with barycentric weights of vertices `b` and `c`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// Triangle in `D` dimensions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle<const D: usize> {
    pub a: PointN<D>,
    pub b: PointN<D>,
    pub c: PointN<D>,
}

impl<const D: usize> Triangle<D> {
    pub fn new(a: PointN<D>, b: PointN<D>, c: PointN<D>) -> Self {
        Self { a, b, c }
    }

    pub fn vertices(&self) -> [PointN<D>; 3] {
        [self.a, self.b, self.c]
    }

    /// Area from the Gram determinant of the edge vectors
    pub fn area(&self) -> f64 {
        let u = self.b - self.a;
        let v = self.c - self.a;
        let gram = u.norm_squared() * v.norm_squared() - u.dot(&v).powi(2);
        0.5 * gram.max(0.0).sqrt()
    }

    pub fn is_degenerate(&self, area_tolerance: f64) -> bool {
        self.area() < area_tolerance
    }

    pub fn centroid(&self) -> PointN<D> {
        PointN::from((self.a.coords + self.b.coords + self.c.coords) / 3.0)
    }

    pub fn bounding_box(&self) -> Aabb<D> {
        Aabb::from_points(&[self.a, self.b, self.c])
    }

    /// Barycentric weights of the projection of `point` onto the triangle's
    /// affine hull; `None` for a degenerate triangle
    pub fn barycentric(&self, point: &PointN<D>) -> Option<[f64; 3]> {
        let v0 = self.b - self.a;
        let v1 = self.c - self.a;
        let v2 = point - self.a;
        let d00 = v0.dot(&v0);
        let d01 = v0.dot(&v1);
        let d11 = v1.dot(&v1);
        let d20 = v2.dot(&v0);
        let d21 = v2.dot(&v1);
        let denom = d00 * d11 - d01 * d01;
        if denom.abs() < GEOMETRY_EPSILON * GEOMETRY_EPSILON {
            return None;
        }
        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Some([1.0 - v - w, v, w])
    }

    /// Closest point on the triangle (Voronoi-region walk)
    pub fn closest_point(&self, point: &PointN<D>) -> PointN<D> {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        let ap = point - self.a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return self.a;
        }

        let bp = point - self.b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return self.b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return self.a + ab * (d1 / (d1 - d3));
        }

        let cp = point - self.c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return self.c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return self.a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return self.b + (self.c - self.b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        self.a + ab * v + ac * w
    }
}

impl Triangle<3> {
    /// Unnormalized normal (length is twice the area)
    pub fn scaled_normal(&self) -> Vector3<f64> {
        (self.b - self.a).cross(&(self.c - self.a))
    }

    pub fn normal(&self) -> Option<Vector3<f64>> {
        self.scaled_normal().try_normalize(GEOMETRY_EPSILON)
    }

    pub fn plane(&self) -> Result<Plane> {
        Plane::from_points(&self.a, &self.b, &self.c)
    }

    /// Ray/triangle test (Möller-Trumbore) for rays `origin + t * direction`, `t >= 0`
    ///
    /// A ray lying in the triangle's plane reports `Coincident` when it touches
    /// the triangle and `Disjoint` otherwise.
    pub fn intersect_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Intersection<RayHit> {
        let edge1 = self.b - self.a;
        let edge2 = self.c - self.a;
        let p = direction.cross(&edge2);
        let det = edge1.dot(&p);

        if det.abs() < GEOMETRY_EPSILON * direction.norm() * edge1.norm().max(edge2.norm()) {
            return self.coplanar_ray(origin, direction);
        }

        let inv_det = 1.0 / det;
        let s = origin - self.a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return Intersection::Disjoint;
        }
        let q = s.cross(&edge1);
        let v = direction.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return Intersection::Disjoint;
        }
        let t = edge2.dot(&q) * inv_det;
        if t < 0.0 {
            return Intersection::Disjoint;
        }
        Intersection::At(RayHit { t, u, v })
    }

    fn coplanar_ray(&self, origin: &Point3<f64>, direction: &Vector3<f64>) -> Intersection<RayHit> {
        let Some(normal) = self.normal() else {
            return Intersection::Disjoint;
        };
        if normal.dot(&(origin - self.a)).abs() > GEOMETRY_EPSILON {
            return Intersection::Disjoint;
        }
        // Origin inside, or the ray crosses one of the edges
        if let Some([wa, wb, wc]) = self.barycentric(origin) {
            if wa >= 0.0 && wb >= 0.0 && wc >= 0.0 {
                return Intersection::Coincident;
            }
        }
        let touches_edge = [(self.a, self.b), (self.b, self.c), (self.c, self.a)]
            .iter()
            .any(|(p, q)| {
                let edge = q - p;
                let cross = direction.cross(&edge);
                let denom = cross.norm_squared();
                if denom < GEOMETRY_EPSILON {
                    return false;
                }
                let w = p - origin;
                let t = w.cross(&edge).dot(&cross) / denom;
                let s = w.cross(direction).dot(&cross) / denom;
                t >= 0.0 && (0.0..=1.0).contains(&s)
            });
        if touches_edge {
            Intersection::Coincident
        } else {
            Intersection::Disjoint
        }
    }

    /// Cross the triangle with a plane.
    ///
    /// `At(segment)` is a zero-length segment when only a vertex touches;
    /// `Coincident` when the triangle lies in the plane.
    pub fn intersect_plane(&self, plane: &Plane) -> Intersection<Segment<3>> {
        let vertices = self.vertices();
        let distances = vertices.map(|v| plane.signed_distance(&v));
        let on_plane = |d: f64| d.abs() < GEOMETRY_EPSILON;

        if distances.iter().all(|&d| on_plane(d)) {
            return Intersection::Coincident;
        }
        if distances.iter().all(|&d| d > GEOMETRY_EPSILON)
            || distances.iter().all(|&d| d < -GEOMETRY_EPSILON)
        {
            return Intersection::Disjoint;
        }

        let mut points: Vec<Point3<f64>> = Vec::with_capacity(3);
        for i in 0..3 {
            let j = (i + 1) % 3;
            let (di, dj) = (distances[i], distances[j]);
            if on_plane(di) {
                points.push(vertices[i]);
            } else if !on_plane(dj) && (di > 0.0) != (dj > 0.0) {
                let t = di / (di - dj);
                points.push(vertices[i] + (vertices[j] - vertices[i]) * t);
            }
        }
        points.dedup_by(|p, q| (*p - *q).norm() < GEOMETRY_EPSILON);
        if points.len() > 2 && (points[0] - points[points.len() - 1]).norm() < GEOMETRY_EPSILON {
            points.pop();
        }

        match points.as_slice() {
            [] => Intersection::Disjoint,
            [p] => Intersection::At(Segment::new(*p, *p)),
            [p, q, ..] => Intersection::At(Segment::new(*p, *q)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point2, Vector2};

    #[test]
    fn test_line_plane_cases() {
        let plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), 1.0).unwrap();

        let crossing = Line::new(Point3::origin(), Vector3::new(0.0, 0.0, 2.0)).unwrap();
        let hit = *plane.intersect_line(&crossing).value().unwrap();
        assert!((hit.t - 1.0).abs() < 1e-12);
        assert!((hit.point.z - 1.0).abs() < 1e-12);

        let parallel = Line::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        assert_eq!(plane.intersect_line(&parallel), Intersection::Disjoint);

        let inside = Line::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(1.0, 1.0, 0.0)).unwrap();
        assert_eq!(plane.intersect_line(&inside), Intersection::Coincident);
    }

    #[test]
    fn test_line_line_2d() {
        let a = Line::new(Point2::new(0.0, 0.0), Vector2::new(1.0, 1.0)).unwrap();
        let b = Line::new(Point2::new(0.0, 2.0), Vector2::new(1.0, -1.0)).unwrap();
        let p = *a.intersect_line(&b).value().unwrap();
        assert!((p - Point2::new(1.0, 1.0)).norm() < 1e-12);

        let shifted = Line::new(Point2::new(0.0, 1.0), Vector2::new(2.0, 2.0)).unwrap();
        assert!(a.intersect_line(&shifted).is_disjoint());

        let same = Line::new(Point2::new(3.0, 3.0), Vector2::new(-1.0, -1.0)).unwrap();
        assert_eq!(a.intersect_line(&same), Intersection::Coincident);
    }

    #[test]
    fn test_skew_lines_disjoint() {
        let a = Line::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let b = Line::new(Point3::new(0.0, 0.0, 1.0), Vector3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(a.intersect_line(&b).is_disjoint());
    }

    #[test]
    fn test_zero_direction_rejected() {
        assert!(matches!(
            Line::new(Point3::origin(), Vector3::zeros()),
            Err(GeometryError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_triangle_area_any_dimension() {
        let flat = Triangle::new(
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        );
        assert!((flat.area() - 2.0).abs() < 1e-12);

        let spatial = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        assert!((spatial.area() - 0.5).abs() < 1e-12);
        assert!(spatial.normal().unwrap().z > 0.99);
    }

    #[test]
    fn test_closest_point() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let p = tri.closest_point(&Point3::new(0.25, 0.25, 3.0));
        assert!((p - Point3::new(0.25, 0.25, 0.0)).norm() < 1e-12);
        let corner = tri.closest_point(&Point3::new(-1.0, -1.0, 0.0));
        assert_eq!(corner, tri.a);
    }

    #[test]
    fn test_ray_triangle() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        );
        let hit = tri.intersect_ray(&Point3::new(0.2, 0.2, 0.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!((hit.value().unwrap().t - 1.0).abs() < 1e-12);

        let miss = tri.intersect_ray(&Point3::new(2.0, 2.0, 0.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!(miss.is_disjoint());

        let behind = tri.intersect_ray(&Point3::new(0.2, 0.2, 2.0), &Vector3::new(0.0, 0.0, 1.0));
        assert!(behind.is_disjoint());

        let in_plane = tri.intersect_ray(&Point3::new(-1.0, 0.2, 1.0), &Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(in_plane, Intersection::Coincident);

        let in_plane_miss =
            tri.intersect_ray(&Point3::new(-1.0, 5.0, 1.0), &Vector3::new(1.0, 0.0, 0.0));
        assert!(in_plane_miss.is_disjoint());
    }

    #[test]
    fn test_triangle_plane() {
        let tri = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        );
        let plane = Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.5).unwrap();
        let segment = *tri.intersect_plane(&plane).value().unwrap();
        assert!((segment.length() - (0.5_f64 * 0.5 * 2.0).sqrt()).abs() < 1e-12);

        let far = Plane::new(Vector3::new(0.0, 0.0, 1.0), 3.0).unwrap();
        assert!(tri.intersect_plane(&far).is_disjoint());

        let flat = Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        );
        let ground = Plane::new(Vector3::new(0.0, 0.0, 1.0), 0.0).unwrap();
        assert_eq!(flat.intersect_plane(&ground), Intersection::Coincident);
    }
}
