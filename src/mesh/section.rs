// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Planar cross sections

use super::Mesh;
use crate::geometry::{Intersection, Plane, Segment};
use crate::math::constants::GEOMETRY_EPSILON;
use nalgebra::Point3;

/// Polyline assembled from section segments
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub points: Vec<Point3<f64>>,
    /// The last point connects back to the first
    pub closed: bool,
}

impl Contour {
    pub fn length(&self) -> f64 {
        let open: f64 = self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(first), Some(last)) => open + (first - last).norm(),
            _ => open,
        }
    }
}

impl Mesh {
    /// Segments where the plane cuts the surface.
    ///
    /// Faces lying in the plane and single-vertex touches contribute nothing.
    pub fn cross_section(&self, plane: &Plane) -> Vec<Segment<3>> {
        self.triangle_geometries()
            .filter_map(|triangle| match triangle.intersect_plane(plane) {
                Intersection::At(segment) if segment.length() > GEOMETRY_EPSILON => Some(segment),
                _ => None,
            })
            .collect()
    }

    /// Cross section chained into contours
    pub fn section_contours(&self, plane: &Plane) -> Vec<Contour> {
        chain_segments(&self.cross_section(plane), GEOMETRY_EPSILON * 1e3)
    }
}

/// Join segments sharing endpoints (within `tolerance`) into polylines
pub fn chain_segments(segments: &[Segment<3>], tolerance: f64) -> Vec<Contour> {
    let close = |p: &Point3<f64>, q: &Point3<f64>| (p - q).norm() <= tolerance;
    let mut used = vec![false; segments.len()];
    let mut contours = Vec::new();

    // Finds an unused segment touching `point`, returning its far endpoint
    let take_next = |used: &mut Vec<bool>, point: &Point3<f64>| -> Option<Point3<f64>> {
        for (idx, segment) in segments.iter().enumerate() {
            if used[idx] {
                continue;
            }
            if close(&segment.start, point) {
                used[idx] = true;
                return Some(segment.end);
            }
            if close(&segment.end, point) {
                used[idx] = true;
                return Some(segment.start);
            }
        }
        None
    };

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }
        used[start_idx] = true;
        let mut points = vec![segments[start_idx].start, segments[start_idx].end];

        while let Some(next) = take_next(&mut used, &points[points.len() - 1]) {
            points.push(next);
        }
        let closed = points.len() > 3 && close(&points[0], &points[points.len() - 1]);
        if closed {
            points.pop();
        } else {
            let mut head = Vec::new();
            while let Some(prev) = take_next(&mut used, head.last().unwrap_or(&points[0])) {
                head.push(prev);
            }
            head.reverse();
            head.extend(points);
            points = head;
        }

        contours.push(Contour { points, closed });
    }

    contours
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;
    use nalgebra::Vector3;

    #[test]
    fn test_cube_section_is_square() {
        let mesh = shapes::unit_cube();
        let plane = Plane::from_point_normal(&Point3::new(0.0, 0.0, 0.5), Vector3::z()).unwrap();

        let segments = mesh.cross_section(&plane);
        let perimeter: f64 = segments.iter().map(|s| s.length()).sum();
        assert!((perimeter - 4.0).abs() < 1e-9);

        let contours = mesh.section_contours(&plane);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert!((contours[0].length() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_plane_missing_mesh() {
        let mesh = shapes::unit_cube();
        let plane = Plane::from_point_normal(&Point3::new(0.0, 0.0, 5.0), Vector3::z()).unwrap();
        assert!(mesh.cross_section(&plane).is_empty());
        assert!(mesh.section_contours(&plane).is_empty());
    }

    #[test]
    fn test_open_chain() {
        let segments = vec![
            Segment::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)),
            Segment::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)),
        ];
        let contours = chain_segments(&segments, 1e-9);
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].closed);
        assert_eq!(contours[0].points.len(), 3);
        assert_eq!(contours[0].points[0], Point3::new(0.0, 0.0, 0.0));
    }
}
