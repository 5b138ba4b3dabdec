// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spline interpolation and curve resampling

mod polyline;
mod spline;

pub use polyline::{resample_contour, resample_polyline, ParametricSpline};
pub use spline::{CubicSpline, SplineValue};
