// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! STL reader and writer
//!
//! STL stores unindexed triangles. Readers weld bit-identical positions in
//! first-use order, so indices survive a write/read cycle whenever the mesh's
//! vertices are already in first-use order.

use super::Encoding;
use crate::error::{GeometryError, Result};
use crate::mesh::{Face, Mesh};
use ahash::AHashMap;
use nalgebra::{Point3, Vector3};
use std::io::Write;

const HEADER_LEN: usize = 80;
const RECORD_LEN: usize = 50;

/// Binary when the length matches the declared triangle count exactly
pub fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < HEADER_LEN + 4 {
        return false;
    }
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as u64;
    bytes.len() as u64 == (HEADER_LEN + 4) as u64 + RECORD_LEN as u64 * count
}

/// Text starting with `solid`
pub fn is_ascii_stl(bytes: &[u8]) -> bool {
    let start = bytes.iter().position(|b| !b.is_ascii_whitespace()).unwrap_or(bytes.len());
    bytes[start..].starts_with(b"solid")
}

/// Decode an STL byte stream, sniffing the encoding from content
pub fn read_stl(bytes: &[u8]) -> Result<Mesh> {
    if is_binary_stl(bytes) {
        read_binary(bytes)
    } else if is_ascii_stl(bytes) {
        read_ascii(bytes)
    } else {
        Err(GeometryError::malformed(
            "neither a binary STL of consistent length nor ASCII STL",
        ))
    }
}

/// Welds corners into shared vertices keyed by exact bit pattern
#[derive(Default)]
struct Welder {
    lookup: AHashMap<[u64; 3], usize>,
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
}

impl Welder {
    fn index_of(&mut self, p: Point3<f64>) -> usize {
        // +0.0 folds negative zero onto positive zero
        let key = [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];
        let next = self.vertices.len();
        let index = *self.lookup.entry(key).or_insert(next);
        if index == next {
            self.vertices.push(p);
        }
        index
    }

    fn push_triangle(&mut self, corners: [Point3<f64>; 3]) {
        let indices = corners.map(|p| self.index_of(p));
        self.faces.push(Face::new(indices));
    }

    fn finish(self) -> Mesh {
        Mesh::from_raw(self.vertices, self.faces)
    }
}

fn read_binary(bytes: &[u8]) -> Result<Mesh> {
    let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as usize;
    let body = &bytes[HEADER_LEN + 4..];
    if body.len() != count * RECORD_LEN {
        return Err(GeometryError::malformed(format!(
            "binary STL declares {} triangles but holds {} bytes",
            count,
            body.len()
        )));
    }

    let read_f32 = |chunk: &[u8], offset: usize| -> f64 {
        f32::from_le_bytes([chunk[offset], chunk[offset + 1], chunk[offset + 2], chunk[offset + 3]]) as f64
    };

    let mut welder = Welder::default();
    for record in body.chunks_exact(RECORD_LEN) {
        // bytes 0..12 hold the stored normal, which is recomputed on demand
        let corner = |k: usize| {
            let base = 12 + 12 * k;
            Point3::new(read_f32(record, base), read_f32(record, base + 4), read_f32(record, base + 8))
        };
        welder.push_triangle([corner(0), corner(1), corner(2)]);
    }

    let mesh = welder.finish();
    tracing::debug!(triangles = count, vertices = mesh.vertex_count(), "parsed binary STL");
    Ok(mesh)
}

type Tokens<'a> = std::str::SplitAsciiWhitespace<'a>;

fn expect(tokens: &mut Tokens<'_>, word: &str) -> Result<()> {
    match tokens.next() {
        Some(t) if t == word => Ok(()),
        Some(t) => Err(GeometryError::malformed(format!("expected '{}', found '{}'", word, t))),
        None => Err(GeometryError::malformed(format!("expected '{}', found end of file", word))),
    }
}

fn number(tokens: &mut Tokens<'_>) -> Result<f64> {
    let token = tokens
        .next()
        .ok_or_else(|| GeometryError::malformed("unexpected end of ASCII STL"))?;
    token
        .parse()
        .map_err(|_| GeometryError::malformed(format!("bad STL number '{}'", token)))
}

fn read_ascii(bytes: &[u8]) -> Result<Mesh> {
    let text = std::str::from_utf8(bytes).map_err(|_| GeometryError::malformed("ASCII STL is not text"))?;
    let text = text.trim_start();
    // The solid name runs to the end of the first line
    let body = text.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    let mut tokens = body.split_ascii_whitespace();

    let mut welder = Welder::default();
    loop {
        match tokens.next() {
            Some("facet") => {}
            Some("endsolid") => break,
            Some(t) => return Err(GeometryError::malformed(format!("expected 'facet', found '{}'", t))),
            None => return Err(GeometryError::malformed("ASCII STL lacks 'endsolid'")),
        }
        expect(&mut tokens, "normal")?;
        for _ in 0..3 {
            number(&mut tokens)?;
        }
        expect(&mut tokens, "outer")?;
        expect(&mut tokens, "loop")?;
        let mut corners = [Point3::origin(); 3];
        for corner in &mut corners {
            expect(&mut tokens, "vertex")?;
            *corner = Point3::new(number(&mut tokens)?, number(&mut tokens)?, number(&mut tokens)?);
        }
        expect(&mut tokens, "endloop")?;
        expect(&mut tokens, "endfacet")?;
        welder.push_triangle(corners);
    }

    let mesh = welder.finish();
    tracing::debug!(
        triangles = mesh.face_count(),
        vertices = mesh.vertex_count(),
        "parsed ASCII STL"
    );
    Ok(mesh)
}

fn facet_normal(corners: &[Point3<f64>; 3]) -> Vector3<f64> {
    (corners[1] - corners[0])
        .cross(&(corners[2] - corners[0]))
        .try_normalize(f64::MIN_POSITIVE)
        .unwrap_or_else(Vector3::zeros)
}

/// Encode a mesh as STL
pub fn write_stl<W: Write>(mesh: &Mesh, writer: &mut W, encoding: Encoding) -> Result<()> {
    match encoding {
        Encoding::Binary => write_binary(mesh, writer),
        Encoding::Ascii => write_ascii(mesh, writer),
    }
}

fn write_binary<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    use stl_io::{Normal, Triangle as StlTriangle, Vertex as StlVertex};

    let to_f32 = |v: &Vector3<f64>| [v.x as f32, v.y as f32, v.z as f32];
    let triangles: Vec<StlTriangle> = mesh
        .faces()
        .iter()
        .map(|face| {
            let corners = face.indices.map(|i| mesh.vertices()[i]);
            StlTriangle {
                normal: Normal::new(to_f32(&facet_normal(&corners))),
                vertices: corners.map(|p| StlVertex::new(to_f32(&p.coords))),
            }
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())?;
    Ok(())
}

fn write_ascii<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    writeln!(writer, "solid shapekit")?;

    for face in mesh.faces() {
        let corners = face.indices.map(|i| mesh.vertices()[i]);
        let normal = facet_normal(&corners);
        writeln!(writer, "  facet normal {} {} {}", normal.x, normal.y, normal.z)?;
        writeln!(writer, "    outer loop")?;
        for p in &corners {
            writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }

    writeln!(writer, "endsolid shapekit")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;

    fn encode(mesh: &Mesh, encoding: Encoding) -> Vec<u8> {
        let mut bytes = Vec::new();
        write_stl(mesh, &mut bytes, encoding).unwrap();
        bytes
    }

    #[test]
    fn test_binary_layout() {
        let bytes = encode(&shapes::unit_cube(), Encoding::Binary);
        assert_eq!(bytes.len(), 84 + 50 * 12);
        assert!(is_binary_stl(&bytes));
    }

    #[test]
    fn test_reads_weld_shared_corners() {
        for encoding in [Encoding::Ascii, Encoding::Binary] {
            let mesh = read_stl(&encode(&shapes::unit_cube(), encoding)).unwrap();
            assert_eq!(mesh.vertex_count(), 8);
            assert_eq!(mesh.face_count(), 12);
            // first-use order: the first face is always [0, 1, 2]
            assert_eq!(mesh.faces()[0].indices, [0, 1, 2]);
        }
    }

    #[test]
    fn test_first_use_order_round_trips_exactly() {
        for encoding in [Encoding::Ascii, Encoding::Binary] {
            let once = read_stl(&encode(&shapes::uv_sphere(2.0, 10), encoding)).unwrap();
            let twice = read_stl(&encode(&once, encoding)).unwrap();
            assert_eq!(twice.faces(), once.faces());
            assert_eq!(twice.vertices(), once.vertices());
        }
    }

    #[test]
    fn test_binary_count_mismatch() {
        let mut bytes = encode(&shapes::unit_cube(), Encoding::Binary);
        bytes[80] = 13;
        assert!(matches!(read_stl(&bytes), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_ascii_truncated() {
        let bytes = encode(&shapes::unit_cube(), Encoding::Ascii);
        let text = String::from_utf8(bytes).unwrap();
        let cut = &text[..text.len() / 2];
        assert!(matches!(read_stl(cut.as_bytes()), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_not_stl() {
        assert!(matches!(read_stl(b"hello world"), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_solid_named_with_spaces() {
        let text = "solid my part v2\nfacet normal 0 0 1\nouter loop\nvertex 0 0 0\nvertex 1 0 0\nvertex 0 1 0\nendloop\nendfacet\nendsolid my part v2\n";
        let mesh = read_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }
}
