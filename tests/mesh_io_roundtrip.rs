// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Round-trip tests across PLY and STL in both encodings

use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use shapekit::mesh::{analyze, shapes};
use shapekit::{load_mesh, save_mesh, Encoding, GeometryError, MeshFormat};
use tempfile::TempDir;

#[test]
fn test_every_format_preserves_geometry() -> Result<()> {
    let dir = TempDir::new()?;
    let original = shapes::cuboid(Vector3::new(10.0, 4.0, 2.0), true);
    let expected = analyze(&original);

    for (format, encoding, name) in [
        (MeshFormat::Ply, Encoding::Ascii, "text.ply"),
        (MeshFormat::Ply, Encoding::Binary, "binary.ply"),
        (MeshFormat::Stl, Encoding::Ascii, "text.stl"),
        (MeshFormat::Stl, Encoding::Binary, "binary.stl"),
    ] {
        let path = dir.path().join(name);
        save_mesh(&original, &path, format, encoding)?;
        let loaded = load_mesh(&path)?;

        assert_eq!(loaded.face_count(), 12, "{}", name);
        // STL readers weld shared corners back to 8 vertices
        assert_eq!(loaded.vertex_count(), 8, "{}", name);

        let stats = analyze(&loaded);
        assert_relative_eq!(stats.volume, expected.volume, epsilon = 1e-4);
        assert_relative_eq!(stats.surface_area, expected.surface_area, epsilon = 1e-4);
        assert!(stats.is_watertight, "{}", name);
    }
    Ok(())
}

#[test]
fn test_format_is_sniffed_not_guessed() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("actually_ply.stl");
    save_mesh(&shapes::unit_cube(), &path, MeshFormat::Ply, Encoding::Binary)?;

    let loaded = load_mesh(&path)?;
    assert_eq!(loaded.face_count(), 12);
    Ok(())
}

#[test]
fn test_garbage_is_malformed() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("noise.ply");
    std::fs::write(&path, b"definitely not a mesh")?;

    assert!(matches!(load_mesh(&path), Err(GeometryError::MalformedFile(_))));
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let result = load_mesh("/nonexistent/shapekit/mesh.stl");
    assert!(matches!(result, Err(GeometryError::Io(_))));
}

#[test]
fn test_sphere_survives_binary_stl() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("sphere.stl");
    let sphere = shapes::uv_sphere(2.0, 24);
    save_mesh(&sphere, &path, MeshFormat::Stl, Encoding::Binary)?;

    let loaded = load_mesh(&path)?;
    assert_eq!(loaded.face_count(), sphere.face_count());
    // binary STL stores f32 coordinates
    assert_relative_eq!(analyze(&loaded).volume, analyze(&sphere).volume, max_relative = 1e-5);
    Ok(())
}
