// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Numeric tolerances and constants shared across the engine

/// 4π, the solid angle of the unit sphere
pub const FOUR_PI: f64 = 4.0 * std::f64::consts::PI;

/// Distance below which two geometric quantities are treated as equal
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// |det| below which a linear map is reported as singular
pub const SINGULAR_TOLERANCE: f64 = 1e-12;

/// Triangle area below which a face counts as degenerate
pub const DEGENERATE_AREA: f64 = 1e-12;

/// Highest spherical-harmonic degree accepted by the descriptor
pub const MAX_SH_DEGREE: usize = 64;

/// Newton iteration budget for Gauss-Legendre node refinement
pub const GAUSS_LEGENDRE_MAX_ITERATIONS: usize = 100;
