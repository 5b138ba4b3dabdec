// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Real spherical-harmonic projection and per-degree energies
//!
//! Basis (orthonormal over the sphere, no Condon-Shortley phase):
//! `Y_l0 = P̄_l0(cos θ)`, `Y_lm = √2 P̄_lm(cos θ) cos(mφ)` and
//! `Y_l,-m = √2 P̄_lm(cos θ) sin(mφ)` for `m > 0`.

use super::{SphericalSignal, MAX_DEGREE};
use crate::error::{GeometryError, Result};
use crate::math::NormalizedLegendre;
use crate::stats::{Distance, Metric};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::f64::consts::SQRT_2;

fn check_degree(max_degree: usize) -> Result<()> {
    if max_degree > MAX_DEGREE {
        return Err(GeometryError::invalid_input(format!(
            "max degree {} exceeds {}",
            max_degree, MAX_DEGREE
        )));
    }
    Ok(())
}

/// Position of `(l, m)` in the coefficient vector
fn coefficient_index(l: usize, m: isize) -> usize {
    ((l * l + l) as isize + m) as usize
}

/// Project a sampled signal onto real harmonics up to degree `max_degree`.
///
/// The coefficients depend on the orientation of the shape; use
/// [`ShDescriptor::energies`] for a rotation-invariant signature. Results are
/// exact for band-limited signals when the sampling resolves the degree.
pub fn project(signal: &SphericalSignal, max_degree: usize) -> Result<ShDescriptor> {
    check_degree(max_degree)?;
    let sampling = signal.sampling();
    if max_degree > sampling.max_exact_degree() {
        tracing::warn!(
            max_degree,
            exact = sampling.max_exact_degree(),
            "sampling under-resolves the requested degree"
        );
    }

    let n_phi = sampling.n_phi();
    // cos(mφ_j), sin(mφ_j) are shared by every ring
    let trig: Vec<Vec<(f64, f64)>> = (0..=max_degree)
        .map(|m| {
            (0..n_phi)
                .map(|j| {
                    let (s, c) = (m as f64 * sampling.phi(j)).sin_cos();
                    (c, s)
                })
                .collect()
        })
        .collect();

    let len = (max_degree + 1) * (max_degree + 1);
    let partials: Vec<Vec<f64>> = signal
        .values()
        .par_chunks(n_phi)
        .enumerate()
        .map(|(ring, values)| {
            let mut partial = vec![0.0; len];
            let weight = sampling.weight(ring);
            let legendre = NormalizedLegendre::compute(max_degree, sampling.cos_theta(ring));

            for (m, row) in trig.iter().enumerate() {
                let (cos_sum, sin_sum) = values
                    .iter()
                    .zip(row)
                    .fold((0.0, 0.0), |(cs, ss), (f, (c, s))| (cs + f * c, ss + f * s));

                for l in m..=max_degree {
                    let p = weight * legendre.get(l, m);
                    if m == 0 {
                        partial[coefficient_index(l, 0)] += p * cos_sum;
                    } else {
                        let mi = m as isize;
                        partial[coefficient_index(l, mi)] += SQRT_2 * p * cos_sum;
                        partial[coefficient_index(l, -mi)] += SQRT_2 * p * sin_sum;
                    }
                }
            }
            partial
        })
        .collect();

    // rings are accumulated in order so the sum does not depend on scheduling
    let mut coefficients = vec![0.0; len];
    for partial in &partials {
        coefficients.iter_mut().zip(partial).for_each(|(a, p)| *a += p);
    }

    tracing::debug!(max_degree, rings = sampling.n_theta(), "projected spherical signal");
    Ok(ShDescriptor {
        max_degree,
        coefficients,
    })
}

/// Real spherical-harmonic coefficients, `2l + 1` per degree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShDescriptor {
    max_degree: usize,
    coefficients: Vec<f64>,
}

impl ShDescriptor {
    pub fn from_coefficients(max_degree: usize, coefficients: Vec<f64>) -> Result<Self> {
        check_degree(max_degree)?;
        let expected = (max_degree + 1) * (max_degree + 1);
        if coefficients.len() != expected {
            return Err(GeometryError::ShapeMismatch(format!(
                "degree {} needs {} coefficients, got {}",
                max_degree,
                expected,
                coefficients.len()
            )));
        }
        Ok(Self {
            max_degree,
            coefficients,
        })
    }

    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Flat coefficients, `(l, m)` at `l*l + l + m`
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn coefficient(&self, l: usize, m: isize) -> Result<f64> {
        if l > self.max_degree || m.unsigned_abs() > l {
            return Err(GeometryError::OutOfRange(format!(
                "(l={}, m={}) outside degree {}",
                l, m, self.max_degree
            )));
        }
        Ok(self.coefficients[coefficient_index(l, m)])
    }

    /// Coefficients of one degree, `m = -l..=l`
    pub fn degree(&self, l: usize) -> &[f64] {
        &self.coefficients[l * l..(l + 1) * (l + 1)]
    }

    /// Reconstruct the band-limited signal at polar angle `theta`, azimuth `phi`
    pub fn evaluate(&self, theta: f64, phi: f64) -> f64 {
        let legendre = NormalizedLegendre::compute(self.max_degree, theta.cos());
        let mut value = 0.0;
        for l in 0..=self.max_degree {
            value += self.coefficients[coefficient_index(l, 0)] * legendre.get(l, 0);
            for m in 1..=l {
                let (s, c) = (m as f64 * phi).sin_cos();
                let mi = m as isize;
                value += SQRT_2
                    * legendre.get(l, m)
                    * (self.coefficients[coefficient_index(l, mi)] * c
                        + self.coefficients[coefficient_index(l, -mi)] * s);
            }
        }
        value
    }

    /// Per-degree energy `Σ_m c_lm²`, unchanged by rotations of the signal
    pub fn energies(&self) -> EnergyDescriptor {
        let energies = (0..=self.max_degree)
            .map(|l| self.degree(l).iter().map(|c| c * c).sum())
            .collect();
        EnergyDescriptor { energies }
    }
}

/// Rotation-invariant signature: one energy per degree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyDescriptor {
    energies: Vec<f64>,
}

impl EnergyDescriptor {
    pub fn new(energies: Vec<f64>) -> Self {
        Self { energies }
    }

    pub fn max_degree(&self) -> usize {
        self.energies.len().saturating_sub(1)
    }

    pub fn energies(&self) -> &[f64] {
        &self.energies
    }

    pub fn total(&self) -> f64 {
        self.energies.iter().sum()
    }

    /// Scaled to unit total energy; a zero descriptor is returned unchanged
    pub fn normalized(&self) -> Self {
        let total = self.total();
        if total <= 0.0 {
            return self.clone();
        }
        Self {
            energies: self.energies.iter().map(|e| e / total).collect(),
        }
    }

    pub fn distance(&self, other: &Self, metric: Metric) -> Result<f64> {
        metric.checked_distance(&self.energies, &other.energies)
    }
}

impl AsRef<[f64]> for EnergyDescriptor {
    fn as_ref(&self) -> &[f64] {
        &self.energies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::SphericalSampling;
    use crate::math::constants::FOUR_PI;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Vector3};

    fn sampled(max_degree: usize, f: impl Fn(&Vector3<f64>) -> f64 + Sync) -> SphericalSignal {
        SphericalSignal::from_fn(SphericalSampling::for_degree(max_degree).unwrap(), f)
    }

    #[test]
    fn test_constant_signal() {
        let sh = project(&sampled(4, |_| 1.0), 4).unwrap();
        assert_relative_eq!(sh.coefficient(0, 0).unwrap(), FOUR_PI.sqrt(), epsilon = 1e-12);
        for (i, c) in sh.coefficients().iter().enumerate().skip(1) {
            assert!(c.abs() < 1e-12, "coefficient {} = {}", i, c);
        }
    }

    #[test]
    fn test_linear_signals_hit_degree_one() {
        let expected = (FOUR_PI / 3.0).sqrt();
        let z = project(&sampled(3, |d| d.z), 3).unwrap();
        assert_relative_eq!(z.coefficient(1, 0).unwrap(), expected, epsilon = 1e-12);
        let x = project(&sampled(3, |d| d.x), 3).unwrap();
        assert_relative_eq!(x.coefficient(1, 1).unwrap(), expected, epsilon = 1e-12);
        let y = project(&sampled(3, |d| d.y), 3).unwrap();
        assert_relative_eq!(y.coefficient(1, -1).unwrap(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_energies_rotation_invariant() {
        let f = |d: &Vector3<f64>| 1.0 + 0.3 * d.x * d.y + 0.5 * d.z * d.z - 0.2 * d.x.powi(3);
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), 0.7)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), 1.9);
        let inverse = rotation.inverse();

        let a = project(&sampled(6, f), 6).unwrap().energies();
        let b = project(&sampled(6, |d| f(&(inverse * d))), 6).unwrap().energies();
        for (ea, eb) in a.energies().iter().zip(b.energies()) {
            assert_relative_eq!(*ea, *eb, epsilon = 1e-10);
        }
        assert!(a.distance(&b, Metric::Euclidean).unwrap() < 1e-9);
    }

    #[test]
    fn test_evaluate_reconstructs_band_limited_signal() {
        let f = |d: &Vector3<f64>| 2.0 + d.x - 0.5 * d.y * d.z;
        let sh = project(&sampled(3, f), 3).unwrap();
        let (theta, phi) = (0.9_f64, 2.3_f64);
        let d = Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
        assert_relative_eq!(sh.evaluate(theta, phi), f(&d), epsilon = 1e-10);
    }

    #[test]
    fn test_degree_limits() {
        let signal = sampled(1, |_| 1.0);
        assert!(matches!(project(&signal, MAX_DEGREE + 1), Err(GeometryError::InvalidInput(_))));
        let sh = project(&signal, 1).unwrap();
        assert!(sh.coefficient(2, 0).is_err());
        assert!(sh.coefficient(1, -2).is_err());
        assert_eq!(sh.degree(1).len(), 3);
    }

    #[test]
    fn test_normalized_and_distance() {
        let a = EnergyDescriptor::new(vec![2.0, 2.0]);
        let b = EnergyDescriptor::new(vec![4.0, 4.0]);
        assert_eq!(a.normalized(), b.normalized());
        assert_relative_eq!(a.normalized().total(), 1.0);
        let c = EnergyDescriptor::new(vec![1.0]);
        assert!(matches!(a.distance(&c, Metric::Euclidean), Err(GeometryError::ShapeMismatch(_))));
    }
}
