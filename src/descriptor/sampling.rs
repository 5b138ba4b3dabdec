// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Quadrature grids on the unit sphere

use crate::error::{GeometryError, Result};
use crate::math::gauss_legendre;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Gauss-Legendre rings in `cos θ` times uniform longitudes.
///
/// Integrates band-limited functions of degree `L` exactly when
/// `n_theta > L` and `n_phi > 2L`.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalSampling {
    n_theta: usize,
    n_phi: usize,
    cos_theta: Vec<f64>,
    ring_weights: Vec<f64>,
}

impl SphericalSampling {
    pub fn new(n_theta: usize, n_phi: usize) -> Result<Self> {
        if n_theta == 0 || n_phi == 0 {
            return Err(GeometryError::invalid_input(format!(
                "sampling needs at least one ring and one longitude, got {}x{}",
                n_theta, n_phi
            )));
        }
        let (cos_theta, ring_weights) = gauss_legendre(n_theta)?;
        Ok(Self {
            n_theta,
            n_phi,
            cos_theta,
            ring_weights,
        })
    }

    /// `2(L+1)` rings by `4(L+1)` longitudes
    pub fn for_degree(max_degree: usize) -> Result<Self> {
        Self::new(2 * (max_degree + 1), 4 * (max_degree + 1))
    }

    pub fn n_theta(&self) -> usize {
        self.n_theta
    }

    pub fn n_phi(&self) -> usize {
        self.n_phi
    }

    pub fn len(&self) -> usize {
        self.n_theta * self.n_phi
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Highest degree this grid integrates exactly
    pub fn max_exact_degree(&self) -> usize {
        (self.n_theta - 1).min((self.n_phi - 1) / 2)
    }

    pub fn cos_theta(&self, ring: usize) -> f64 {
        self.cos_theta[ring]
    }

    pub fn theta(&self, ring: usize) -> f64 {
        self.cos_theta[ring].clamp(-1.0, 1.0).acos()
    }

    pub fn phi(&self, column: usize) -> f64 {
        2.0 * PI * column as f64 / self.n_phi as f64
    }

    /// Quadrature weight of one sample on `ring` (sums to 4π over the grid)
    pub fn weight(&self, ring: usize) -> f64 {
        self.ring_weights[ring] * 2.0 * PI / self.n_phi as f64
    }

    /// Unit direction of sample `(ring, column)`
    pub fn direction(&self, ring: usize, column: usize) -> Vector3<f64> {
        let cos_t = self.cos_theta[ring];
        let sin_t = (1.0 - cos_t * cos_t).max(0.0).sqrt();
        let (sin_p, cos_p) = self.phi(column).sin_cos();
        Vector3::new(sin_t * cos_p, sin_t * sin_p, cos_t)
    }

    /// All directions, ring-major
    pub fn directions(&self) -> Vec<Vector3<f64>> {
        (0..self.n_theta)
            .flat_map(|ring| (0..self.n_phi).map(move |column| (ring, column)))
            .map(|(ring, column)| self.direction(ring, column))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::FOUR_PI;

    #[test]
    fn test_weights_cover_sphere() {
        let sampling = SphericalSampling::for_degree(6).unwrap();
        let total: f64 = (0..sampling.n_theta())
            .map(|ring| sampling.weight(ring) * sampling.n_phi() as f64)
            .sum();
        assert!((total - FOUR_PI).abs() < 1e-12);
        assert!(sampling.max_exact_degree() >= 6);
    }

    #[test]
    fn test_directions_are_unit() {
        let sampling = SphericalSampling::new(5, 7).unwrap();
        let directions = sampling.directions();
        assert_eq!(directions.len(), 35);
        assert!(directions.iter().all(|d| (d.norm() - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_rejects_empty_grid() {
        assert!(SphericalSampling::new(0, 4).is_err());
    }
}
