// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - PLY and STL codecs feeding the mesh model
//!
//! Formats are sniffed from content, never from the file extension.

mod ply;
mod stl;

pub use ply::{read_ply, write_ply};
pub use stl::{is_ascii_stl, is_binary_stl, read_stl, write_stl};

use crate::error::{GeometryError, Result};
use crate::mesh::Mesh;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Supported mesh container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    Ply,
    Stl,
}

/// Text or binary payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    Ascii,
    #[default]
    Binary,
}

impl MeshFormat {
    /// Guess a format from a file extension, for choosing an output format
    pub fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_ascii_lowercase().as_str() {
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }
}

/// Identify the format of a byte stream from its leading bytes
pub fn sniff_format(bytes: &[u8]) -> Result<MeshFormat> {
    if bytes.starts_with(b"ply") {
        Ok(MeshFormat::Ply)
    } else if is_binary_stl(bytes) || is_ascii_stl(bytes) {
        Ok(MeshFormat::Stl)
    } else {
        Err(GeometryError::malformed("unrecognised mesh format"))
    }
}

/// Decode a mesh from bytes of either format
pub fn read_mesh(bytes: &[u8]) -> Result<Mesh> {
    match sniff_format(bytes)? {
        MeshFormat::Ply => read_ply(bytes),
        MeshFormat::Stl => read_stl(bytes),
    }
}

/// Load a mesh file, sniffing PLY vs STL by content
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "loading mesh");
    read_mesh(&bytes)
}

/// Write a mesh file in the requested format and encoding
pub fn save_mesh(mesh: &Mesh, path: impl AsRef<Path>, format: MeshFormat, encoding: Encoding) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    match format {
        MeshFormat::Ply => write_ply(mesh, &mut writer, encoding)?,
        MeshFormat::Stl => write_stl(mesh, &mut writer, encoding)?,
    }
    tracing::debug!(
        path = %path.display(),
        ?format,
        ?encoding,
        faces = mesh.face_count(),
        "saved mesh"
    );
    Ok(())
}
