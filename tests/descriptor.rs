// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Spherical-harmonic descriptors of generated shapes

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use shapekit::descriptor::{project, SphericalSampling, SphericalSignal};
use shapekit::geometry::Affine3;
use shapekit::mesh::shapes;
use shapekit::stats::Metric;
use shapekit::{DescriptorSource, Engine, GeometryError, Mesh};
use std::f64::consts::FRAC_PI_2;

#[test]
fn test_energy_scales_with_radius_squared() -> Result<()> {
    let engine = Engine::default();
    let small = engine.compute_descriptor(DescriptorSource::Mesh(&shapes::uv_sphere(1.0, 32)), Some(4))?;
    let large = engine.compute_descriptor(DescriptorSource::Mesh(&shapes::uv_sphere(2.0, 32)), Some(4))?;

    assert_relative_eq!(large.energies().total(), 4.0 * small.energies().total(), max_relative = 1e-6);
    // normalised signatures ignore scale
    let distance = small
        .energies()
        .normalized()
        .distance(&large.energies().normalized(), Metric::Euclidean)?;
    assert!(distance < 1e-9);
    Ok(())
}

#[test]
fn test_descriptor_tells_shapes_apart() -> Result<()> {
    let engine = Engine::default();
    let describe = |mesh: &Mesh| -> Result<_> {
        Ok(engine
            .compute_descriptor(DescriptorSource::Mesh(mesh), Some(6))?
            .energies()
            .normalized())
    };

    let sphere = describe(&shapes::uv_sphere(1.0, 48))?;
    let cube = describe(&shapes::cuboid(Vector3::new(1.6, 1.6, 1.6), true))?;
    let rod = describe(&shapes::ellipsoid(Vector3::new(0.4, 0.4, 2.0), 24, 48))?;

    let sphere_to_cube = sphere.distance(&cube, Metric::Euclidean)?;
    let sphere_to_rod = sphere.distance(&rod, Metric::Euclidean)?;
    assert!(sphere_to_cube < sphere_to_rod, "{} vs {}", sphere_to_cube, sphere_to_rod);
    Ok(())
}

#[test]
fn test_rotated_cube_keeps_signature() -> Result<()> {
    let engine = Engine::default();
    let cube = shapes::cuboid(Vector3::new(2.0, 2.0, 2.0), true);
    // a quarter turn about z maps the sample grid onto itself
    let turned = engine.transform_mesh(&cube, &Affine3::rotation(&Vector3::z(), FRAC_PI_2)?);

    let a = engine.compute_descriptor(DescriptorSource::Mesh(&cube), Some(4))?.energies();
    let b = engine.compute_descriptor(DescriptorSource::Mesh(&turned), Some(4))?.energies();
    for (x, y) in a.energies().iter().zip(b.energies()) {
        assert_relative_eq!(x, y, epsilon = 1e-6 * a.total());
    }
    Ok(())
}

#[test]
fn test_grid_source_matches_mesh_roughly() -> Result<()> {
    let engine = Engine::default();
    let cube = shapes::cuboid(Vector3::new(2.0, 2.0, 2.0), true);
    let grid = engine.rasterize(&cube)?;

    let from_mesh = engine.compute_descriptor(DescriptorSource::Mesh(&cube), Some(2))?.energies();
    let from_grid = engine.compute_descriptor(DescriptorSource::Grid(&grid), Some(2))?.energies();
    let (a, b) = (from_mesh.energies()[0], from_grid.energies()[0]);
    assert!((a - b).abs() < 0.1 * a, "{} vs {}", a, b);
    Ok(())
}

#[test]
fn test_reconstruct_band_limited_signal() -> Result<()> {
    let sampling = SphericalSampling::for_degree(3)?;
    let signal = SphericalSignal::from_fn(sampling, |d| 1.0 + 0.5 * d.z + 0.25 * d.x * d.y);
    let descriptor = project(&signal, 3)?;

    let (theta, phi) = (0.7_f64, 2.1_f64);
    let d = Vector3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos());
    assert_relative_eq!(descriptor.evaluate(theta, phi), 1.0 + 0.5 * d.z + 0.25 * d.x * d.y, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_degree_out_of_range() {
    let engine = Engine::default();
    let result = engine.compute_descriptor(DescriptorSource::Mesh(&shapes::unit_cube()), Some(1000));
    assert!(matches!(result, Err(GeometryError::InvalidInput(_))));
}
