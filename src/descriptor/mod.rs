// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rotation-invariant shape descriptors from spherical harmonics
//!
//! A shape is reduced to a radial function on the unit sphere (distance from
//! its centre to the outer surface per direction), projected onto real
//! spherical harmonics, and summarised by per-degree energies.

mod harmonics;
mod sampling;
mod signal;

pub use harmonics::{project, EnergyDescriptor, ShDescriptor};
pub use sampling::SphericalSampling;
pub use signal::{radial_signal_from_grid, radial_signal_from_mesh, SphericalSignal};

use crate::error::{GeometryError, Result};
use crate::mesh::Mesh;
use crate::raster::VoxelGrid;

/// Highest accepted harmonic degree
pub const MAX_DEGREE: usize = crate::math::constants::MAX_SH_DEGREE;

fn sampling_for(max_degree: usize) -> Result<SphericalSampling> {
    if max_degree > MAX_DEGREE {
        return Err(GeometryError::invalid_input(format!(
            "max degree {} exceeds {}",
            max_degree, MAX_DEGREE
        )));
    }
    SphericalSampling::for_degree(max_degree)
}

/// Descriptor of a mesh's radial extent, sampled by ray casting
pub fn compute_descriptor_from_mesh(mesh: &Mesh, max_degree: usize) -> Result<ShDescriptor> {
    let sampling = sampling_for(max_degree)?;
    let signal = radial_signal_from_mesh(mesh, &sampling)?;
    project(&signal, max_degree)
}

/// Descriptor of a voxel grid's radial extent, sampled by marching cells
pub fn compute_descriptor_from_grid(grid: &VoxelGrid, max_degree: usize) -> Result<ShDescriptor> {
    let sampling = sampling_for(max_degree)?;
    let signal = radial_signal_from_grid(grid, &sampling)?;
    project(&signal, max_degree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Affine3;
    use crate::mesh::shapes;
    use nalgebra::Vector3;

    #[test]
    fn test_sphere_energy_concentrated_in_degree_zero() {
        let sh = compute_descriptor_from_mesh(&shapes::uv_sphere(1.0, 48), 4).unwrap();
        let energies = sh.energies().normalized();
        assert!(energies.energies()[0] > 0.999);
    }

    #[test]
    fn test_ellipsoid_rotation_invariance() {
        let ellipsoid = shapes::ellipsoid(Vector3::new(2.0, 1.0, 1.0), 32, 64);
        let quarter_turn = Affine3::rotation(&Vector3::z(), std::f64::consts::FRAC_PI_2).unwrap();
        let rotated = ellipsoid.transformed(&quarter_turn);

        let a = compute_descriptor_from_mesh(&ellipsoid, 6).unwrap().energies();
        let b = compute_descriptor_from_mesh(&rotated, 6).unwrap().energies();
        for l in [0, 2, 4] {
            let (ea, eb) = (a.energies()[l], b.energies()[l]);
            assert!((ea - eb).abs() <= 0.02 * ea.max(eb), "degree {}: {} vs {}", l, ea, eb);
        }
    }

    #[test]
    fn test_degree_above_limit_rejected() {
        let mesh = shapes::unit_cube();
        assert!(matches!(
            compute_descriptor_from_mesh(&mesh, MAX_DEGREE + 1),
            Err(GeometryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(matches!(
            compute_descriptor_from_mesh(&Mesh::new(), 2),
            Err(GeometryError::InvalidGeometry(_))
        ));
    }
}
