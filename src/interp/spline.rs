// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Natural cubic splines

use crate::error::{GeometryError, Result};

/// Value of a spline, tagged with whether `x` lay inside the knot range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SplineValue {
    Interpolated(f64),
    /// Outside `[x0, xn]`, continued with the boundary polynomial
    Extrapolated(f64),
}

impl SplineValue {
    pub fn value(self) -> f64 {
        match self {
            Self::Interpolated(v) | Self::Extrapolated(v) => v,
        }
    }

    pub fn is_extrapolated(self) -> bool {
        matches!(self, Self::Extrapolated(_))
    }
}

/// Piecewise cubic through `(x_i, y_i)` with continuous first and second
/// derivatives and zero curvature at both ends
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    /// Second derivative at each knot
    y2s: Vec<f64>,
}

impl CubicSpline {
    /// Fails with `InvalidInput` on mismatched lengths, fewer than two knots,
    /// non-finite values or `xs` that are not strictly increasing
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(GeometryError::invalid_input(format!(
                "{} knots but {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(GeometryError::invalid_input("a spline needs at least two knots"));
        }
        if xs.iter().chain(&ys).any(|v| !v.is_finite()) {
            return Err(GeometryError::invalid_input("spline knots must be finite"));
        }
        if let Some(i) = (1..xs.len()).find(|&i| xs[i] <= xs[i - 1]) {
            return Err(GeometryError::invalid_input(format!(
                "knots must be strictly increasing (x[{}] = {} after {})",
                i,
                xs[i],
                xs[i - 1]
            )));
        }

        let n = xs.len();
        let mut y2s = vec![0.0; n];
        let mut u = vec![0.0; n - 1];

        // tridiagonal forward sweep
        for i in 1..n - 1 {
            let sig = (xs[i] - xs[i - 1]) / (xs[i + 1] - xs[i - 1]);
            let p = sig * y2s[i - 1] + 2.0;
            y2s[i] = (sig - 1.0) / p;
            let slope_change = (ys[i + 1] - ys[i]) / (xs[i + 1] - xs[i]) - (ys[i] - ys[i - 1]) / (xs[i] - xs[i - 1]);
            u[i] = (6.0 * slope_change / (xs[i + 1] - xs[i - 1]) - sig * u[i - 1]) / p;
        }
        for k in (0..n - 2).rev() {
            y2s[k + 1] = y2s[k + 1] * y2s[k + 2] + u[k + 1];
        }

        Ok(Self { xs, ys, y2s })
    }

    pub fn knots(&self) -> &[f64] {
        &self.xs
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Knot interval `[lo, lo + 1]` used for `x`
    fn interval(&self, x: f64) -> usize {
        let upper = self.xs.partition_point(|&k| k <= x);
        upper.clamp(1, self.xs.len() - 1) - 1
    }

    fn weights(&self, x: f64) -> (usize, f64, f64, f64) {
        let lo = self.interval(x);
        let h = self.xs[lo + 1] - self.xs[lo];
        let a = (self.xs[lo + 1] - x) / h;
        let b = (x - self.xs[lo]) / h;
        (lo, h, a, b)
    }

    pub fn evaluate(&self, x: f64) -> SplineValue {
        let (lo, h, a, b) = self.weights(x);
        let hi = lo + 1;
        let value = a * self.ys[lo]
            + b * self.ys[hi]
            + ((a * a * a - a) * self.y2s[lo] + (b * b * b - b) * self.y2s[hi]) * h * h / 6.0;

        let (x0, xn) = self.domain();
        if (x0..=xn).contains(&x) {
            SplineValue::Interpolated(value)
        } else {
            SplineValue::Extrapolated(value)
        }
    }

    /// Value inside the knot range; `OutOfRange` outside it
    pub fn interpolate(&self, x: f64) -> Result<f64> {
        match self.evaluate(x) {
            SplineValue::Interpolated(v) => Ok(v),
            SplineValue::Extrapolated(_) => {
                let (x0, xn) = self.domain();
                Err(GeometryError::OutOfRange(format!("x = {} outside [{}, {}]", x, x0, xn)))
            }
        }
    }

    /// First derivative at `x`
    pub fn derivative(&self, x: f64) -> f64 {
        let (lo, h, a, b) = self.weights(x);
        let hi = lo + 1;
        (self.ys[hi] - self.ys[lo]) / h - (3.0 * a * a - 1.0) / 6.0 * h * self.y2s[lo]
            + (3.0 * b * b - 1.0) / 6.0 * h * self.y2s[hi]
    }

    /// `count` evenly spaced `(x, y)` pairs spanning the knot range
    pub fn sample(&self, count: usize) -> Result<Vec<(f64, f64)>> {
        if count < 2 {
            return Err(GeometryError::invalid_input("sampling needs at least two points"));
        }
        let (x0, xn) = self.domain();
        let step = (xn - x0) / (count - 1) as f64;
        Ok((0..count)
            .map(|i| {
                let x = if i == count - 1 { xn } else { x0 + step * i as f64 };
                (x, self.evaluate(x).value())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spline_passes_through_knots() {
        let xs = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let ys = vec![2.0, 3.0, 5.0, 4.0, 1.0];
        let spline = CubicSpline::new(xs.clone(), ys.clone()).unwrap();
        for (x, y) in xs.iter().zip(&ys) {
            assert_relative_eq!(spline.interpolate(*x).unwrap(), *y, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_linear_data_stays_linear() {
        let spline = CubicSpline::new(vec![0.0, 1.0, 3.0], vec![1.0, 3.0, 7.0]).unwrap();
        assert_relative_eq!(spline.interpolate(2.0).unwrap(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(spline.derivative(0.5), 2.0, epsilon = 1e-12);
        let extrapolated = spline.evaluate(4.0);
        assert!(extrapolated.is_extrapolated());
        assert_relative_eq!(extrapolated.value(), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_out_of_range_interpolation() {
        let spline = CubicSpline::new(vec![0.0, 1.0], vec![0.0, 1.0]).unwrap();
        assert!(matches!(spline.interpolate(1.5), Err(GeometryError::OutOfRange(_))));
        assert!(matches!(spline.interpolate(-0.1), Err(GeometryError::OutOfRange(_))));
    }

    #[test]
    fn test_invalid_knots() {
        assert!(CubicSpline::new(vec![0.0, 1.0], vec![0.0]).is_err());
        assert!(CubicSpline::new(vec![0.0], vec![0.0]).is_err());
        assert!(CubicSpline::new(vec![0.0, 1.0, 1.0], vec![0.0, 1.0, 2.0]).is_err());
        assert!(CubicSpline::new(vec![0.0, f64::NAN], vec![0.0, 1.0]).is_err());
    }

    #[test]
    fn test_sample_spans_domain() {
        let spline = CubicSpline::new(vec![0.0, 2.0, 4.0], vec![0.0, 4.0, 0.0]).unwrap();
        let samples = spline.sample(5).unwrap();
        assert_eq!(samples.len(), 5);
        assert_eq!(samples[0].0, 0.0);
        assert_eq!(samples[4].0, 4.0);
        assert_relative_eq!(samples[2].1, 4.0, epsilon = 1e-12);
        assert!(spline.sample(1).is_err());
    }
}
