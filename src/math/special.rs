// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Special functions: Legendre polynomials, quadrature nodes and the
//! normalized associated Legendre recurrence used by spherical harmonics

use super::constants::{FOUR_PI, GAUSS_LEGENDRE_MAX_ITERATIONS};
use crate::error::{GeometryError, Result};
use std::f64::consts::PI;

/// Legendre polynomial P_n(x) via Bonnet's recurrence
pub fn legendre_p(n: usize, x: f64) -> f64 {
    let mut p0 = 1.0;
    if n == 0 {
        return p0;
    }
    let mut p1 = x;
    for k in 1..n {
        let k = k as f64;
        let p2 = ((2.0 * k + 1.0) * x * p1 - k * p0) / (k + 1.0);
        p0 = p1;
        p1 = p2;
    }
    p1
}

/// Gauss-Legendre nodes and weights on [-1, 1], nodes ascending
///
/// Exact for polynomials up to degree `2n - 1`.
pub fn gauss_legendre(n: usize) -> Result<(Vec<f64>, Vec<f64>)> {
    if n == 0 {
        return Err(GeometryError::invalid_input("Gauss-Legendre needs at least one node"));
    }
    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];
    let nf = n as f64;

    for i in 0..(n + 1) / 2 {
        // Initial guess close to the i-th root (counted from x = 1)
        let mut z = (PI * (i as f64 + 0.75) / (nf + 0.5)).cos();
        let mut derivative = 0.0;
        let mut converged = false;

        for _ in 0..GAUSS_LEGENDRE_MAX_ITERATIONS {
            let mut p1 = 1.0;
            let mut p2 = 0.0;
            for j in 0..n {
                let p3 = p2;
                p2 = p1;
                let jf = j as f64;
                p1 = ((2.0 * jf + 1.0) * z * p2 - jf * p3) / (jf + 1.0);
            }
            derivative = nf * (z * p1 - p2) / (z * z - 1.0);
            let previous = z;
            z = previous - p1 / derivative;
            if (z - previous).abs() < 1e-15 {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(GeometryError::NumericalFailure(format!(
                "Gauss-Legendre root {} of {} did not converge",
                i, n
            )));
        }

        let weight = 2.0 / ((1.0 - z * z) * derivative * derivative);
        nodes[i] = -z;
        nodes[n - 1 - i] = z;
        weights[i] = weight;
        weights[n - 1 - i] = weight;
    }

    Ok((nodes, weights))
}

/// Orthonormal associated Legendre values P̄_l^m(x), `0 <= m <= l <= l_max`
///
/// Normalized so that `2π ∫ P̄_l^m(x)² dx = 1` over [-1, 1]; the Condon-Shortley
/// phase is omitted. Values come from the sectoral seed
/// `P̄_m^m = sqrt((2m+1)/(2m)) · sqrt(1-x²) · P̄_{m-1}^{m-1}` and the three-term
/// recurrence `P̄_l^m = a_lm (x P̄_{l-1}^m - P̄_{l-2}^m / a_{l-1,m})` with
/// `a_lm = sqrt((4l²-1)/(l²-m²))`, which stays stable at high degree.
#[derive(Debug, Clone)]
pub struct NormalizedLegendre {
    l_max: usize,
    values: Vec<f64>,
}

impl NormalizedLegendre {
    fn index(l: usize, m: usize) -> usize {
        l * (l + 1) / 2 + m
    }

    fn recurrence_coefficient(l: usize, m: usize) -> f64 {
        let (l, m) = (l as f64, m as f64);
        ((4.0 * l * l - 1.0) / (l * l - m * m)).sqrt()
    }

    pub fn compute(l_max: usize, x: f64) -> Self {
        let mut values = vec![0.0; Self::index(l_max, l_max) + 1];
        let sin_theta = (1.0 - x * x).max(0.0).sqrt();
        let mut sectoral = (1.0 / FOUR_PI).sqrt();

        for m in 0..=l_max {
            if m > 0 {
                let mf = m as f64;
                sectoral *= sin_theta * ((2.0 * mf + 1.0) / (2.0 * mf)).sqrt();
            }
            values[Self::index(m, m)] = sectoral;
            if m == l_max {
                break;
            }

            let mut before = sectoral;
            let mut last = x * (2.0 * m as f64 + 3.0).sqrt() * sectoral;
            values[Self::index(m + 1, m)] = last;

            for l in m + 2..=l_max {
                let a = Self::recurrence_coefficient(l, m);
                let a_prev = Self::recurrence_coefficient(l - 1, m);
                let next = a * (x * last - before / a_prev);
                values[Self::index(l, m)] = next;
                before = last;
                last = next;
            }
        }

        Self { l_max, values }
    }

    pub fn l_max(&self) -> usize {
        self.l_max
    }

    /// P̄_l^m; `m` must not exceed `l`
    pub fn get(&self, l: usize, m: usize) -> f64 {
        debug_assert!(m <= l && l <= self.l_max);
        self.values[Self::index(l, m)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legendre_p_known_values() {
        assert_eq!(legendre_p(0, 0.3), 1.0);
        assert_eq!(legendre_p(1, 0.3), 0.3);
        let x: f64 = 0.3;
        assert!((legendre_p(2, x) - 0.5 * (3.0 * x * x - 1.0)).abs() < 1e-14);
        assert!((legendre_p(3, x) - 0.5 * (5.0 * x.powi(3) - 3.0 * x)).abs() < 1e-14);
    }

    #[test]
    fn test_gauss_legendre_integrates_polynomials() {
        let (nodes, weights) = gauss_legendre(5).unwrap();
        assert!((weights.iter().sum::<f64>() - 2.0).abs() < 1e-13);
        // ∫ x^8 dx over [-1, 1] = 2/9, exact for 5 nodes
        let integral: f64 = nodes.iter().zip(&weights).map(|(x, w)| w * x.powi(8)).sum();
        assert!((integral - 2.0 / 9.0).abs() < 1e-13);
        assert!(nodes.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_normalized_legendre_matches_closed_form() {
        let x = 0.4_f64;
        let table = NormalizedLegendre::compute(3, x);
        let expected_20 = (5.0 / FOUR_PI).sqrt() * 0.5 * (3.0 * x * x - 1.0);
        assert!((table.get(2, 0) - expected_20).abs() < 1e-13);

        let expected_11 = (3.0 / (2.0 * FOUR_PI)).sqrt() * (1.0 - x * x).sqrt();
        assert!((table.get(1, 1) - expected_11).abs() < 1e-13);
    }

    #[test]
    fn test_normalized_legendre_orthonormal_at_high_degree() {
        let l_max = 40;
        let (nodes, weights) = gauss_legendre(l_max + 1).unwrap();
        let tables: Vec<_> = nodes
            .iter()
            .map(|&x| NormalizedLegendre::compute(l_max, x))
            .collect();

        for &(l, m) in &[(0, 0), (10, 3), (25, 25), (40, 0), (40, 17)] {
            let integral: f64 = tables
                .iter()
                .zip(&weights)
                .map(|(t, w)| w * t.get(l, m).powi(2))
                .sum();
            assert!(
                (2.0 * PI * integral - 1.0).abs() < 1e-10,
                "degree {} order {} norm {}",
                l,
                m,
                2.0 * PI * integral
            );
        }
    }
}
