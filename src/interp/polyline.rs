// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Arc-length parameterized curves through 3D points

use super::CubicSpline;
use crate::error::{GeometryError, Result};
use crate::math::constants::GEOMETRY_EPSILON;
use crate::mesh::Contour;
use nalgebra::Point3;

/// Drops consecutive repeats and returns the points with their cumulative
/// chord lengths
fn chord_parameters(points: &[Point3<f64>]) -> (Vec<Point3<f64>>, Vec<f64>) {
    let mut kept: Vec<Point3<f64>> = Vec::with_capacity(points.len());
    let mut params = Vec::with_capacity(points.len());
    for p in points {
        match kept.last() {
            None => params.push(0.0),
            Some(last) => {
                let step = (p - last).norm();
                if step <= GEOMETRY_EPSILON {
                    continue;
                }
                params.push(params[params.len() - 1] + step);
            }
        }
        kept.push(*p);
    }
    (kept, params)
}

/// Natural cubic spline per coordinate over cumulative chord length
#[derive(Debug, Clone)]
pub struct ParametricSpline {
    axes: [CubicSpline; 3],
    length: f64,
}

impl ParametricSpline {
    /// Needs at least two distinct points; consecutive duplicates are ignored
    pub fn new(points: &[Point3<f64>]) -> Result<Self> {
        let (points, params) = chord_parameters(points);
        if points.len() < 2 {
            return Err(GeometryError::invalid_input("a curve needs at least two distinct points"));
        }
        let axis = |i: usize| CubicSpline::new(params.clone(), points.iter().map(|p| p[i]).collect());
        Ok(Self {
            axes: [axis(0)?, axis(1)?, axis(2)?],
            length: params[params.len() - 1],
        })
    }

    /// Chord length of the control polygon
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Point at chord parameter `t`, clamped to `[0, length]`
    pub fn point_at(&self, t: f64) -> Point3<f64> {
        let t = t.clamp(0.0, self.length);
        Point3::new(
            self.axes[0].evaluate(t).value(),
            self.axes[1].evaluate(t).value(),
            self.axes[2].evaluate(t).value(),
        )
    }

    /// `count` points evenly spaced in the parameter, both ends included
    pub fn sample(&self, count: usize) -> Result<Vec<Point3<f64>>> {
        if count < 2 {
            return Err(GeometryError::invalid_input("sampling needs at least two points"));
        }
        let step = self.length / (count - 1) as f64;
        Ok((0..count).map(|i| self.point_at(step * i as f64)).collect())
    }
}

/// `count` points evenly spaced by arc length along the straight segments
/// of `points`, both ends included
pub fn resample_polyline(points: &[Point3<f64>], count: usize) -> Result<Vec<Point3<f64>>> {
    if count < 2 {
        return Err(GeometryError::invalid_input("resampling needs at least two points"));
    }
    let (points, params) = chord_parameters(points);
    if points.len() < 2 {
        return Err(GeometryError::invalid_input("a polyline needs at least two distinct points"));
    }

    let total = params[params.len() - 1];
    let step = total / (count - 1) as f64;
    let mut segment = 0;
    let mut resampled = Vec::with_capacity(count);
    for i in 0..count {
        let target = if i == count - 1 { total } else { step * i as f64 };
        while segment + 2 < params.len() && params[segment + 1] < target {
            segment += 1;
        }
        let span = params[segment + 1] - params[segment];
        let local = ((target - params[segment]) / span).clamp(0.0, 1.0);
        resampled.push(points[segment] + (points[segment + 1] - points[segment]) * local);
    }
    Ok(resampled)
}

/// Contour with `count` evenly spaced points; closed contours stay closed
/// and do not repeat their first point
pub fn resample_contour(contour: &Contour, count: usize) -> Result<Contour> {
    if !contour.closed {
        return Ok(Contour {
            points: resample_polyline(&contour.points, count)?,
            closed: false,
        });
    }
    let mut ring = contour.points.clone();
    if let Some(first) = contour.points.first() {
        ring.push(*first);
    }
    let mut points = resample_polyline(&ring, count + 1)?;
    points.pop();
    Ok(Contour { points, closed: true })
}
