// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities - constants, special functions and linear algebra

pub mod constants;
pub mod linalg;
pub mod special;

pub use linalg::{determinant, invert, is_symmetric, solve, symmetric_eigen, SymmetricEigenpairs};
pub use special::{gauss_legendre, legendre_p, NormalizedLegendre};

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}
