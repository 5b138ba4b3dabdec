// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! shapekit
//!
//! Computational geometry and shape analysis: triangle meshes and their PLY/STL
//! codecs, voxelization, rotation-invariant spherical-harmonic descriptors, and
//! K-Means / spectral clustering of vertices, voxels or whole shapes.

pub mod array;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod interp;
pub mod io;
pub mod math;
pub mod mesh;
pub mod random;
pub mod raster;
pub mod stats;

pub use config::EngineConfig;
pub use engine::{Algorithm, ClusterInput, ClusterOutcome, ClusterParams, DescriptorSource, Engine};
pub use error::{GeometryError, Result};
pub use io::{load_mesh, save_mesh, Encoding, MeshFormat};
pub use mesh::Mesh;
pub use raster::{rasterize, RasterOptions, VoxelGrid};
