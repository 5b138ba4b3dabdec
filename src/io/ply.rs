// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! PLY reader and writer
//!
//! Reads ASCII and binary (little or big endian) files with any scalar
//! property types. Only `vertex` (`x y z`, optional `nx ny nz`) and `face`
//! (`vertex_indices` / `vertex_index` list) carry meaning; every other
//! element and property is parsed and skipped. Polygons are fan-triangulated.

use super::Encoding;
use crate::error::{GeometryError, Result};
use crate::mesh::{Face, Mesh};
use nalgebra::{Point3, Vector3};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlyFormat {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ScalarType {
    fn parse(name: &str) -> Result<Self> {
        Ok(match name {
            "char" | "int8" => Self::I8,
            "uchar" | "uint8" => Self::U8,
            "short" | "int16" => Self::I16,
            "ushort" | "uint16" => Self::U16,
            "int" | "int32" => Self::I32,
            "uint" | "uint32" => Self::U32,
            "float" | "float32" => Self::F32,
            "double" | "float64" => Self::F64,
            other => return Err(GeometryError::malformed(format!("unknown PLY type '{}'", other))),
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum PropertyKind {
    Scalar(ScalarType),
    List { count: ScalarType, item: ScalarType },
}

#[derive(Debug, Clone)]
struct Property {
    name: String,
    kind: PropertyKind,
}

#[derive(Debug, Clone)]
struct Element {
    name: String,
    count: usize,
    properties: Vec<Property>,
}

impl Element {
    fn position(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name == name)
    }
}

#[derive(Debug)]
struct Header {
    format: PlyFormat,
    elements: Vec<Element>,
    body_offset: usize,
}

fn parse_header(bytes: &[u8]) -> Result<Header> {
    const END: &[u8] = b"end_header";
    let end = bytes
        .windows(END.len())
        .position(|w| w == END)
        .ok_or_else(|| GeometryError::malformed("PLY header has no end_header"))?;
    let mut body_offset = end + END.len();
    if bytes.get(body_offset) == Some(&b'\r') {
        body_offset += 1;
    }
    if bytes.get(body_offset) == Some(&b'\n') {
        body_offset += 1;
    }

    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| GeometryError::malformed("PLY header is not text"))?;
    let mut lines = text.lines().map(str::trim);
    if lines.next() != Some("ply") {
        return Err(GeometryError::malformed("missing 'ply' magic"));
    }

    let mut format = None;
    let mut elements: Vec<Element> = Vec::new();
    for line in lines {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["comment", ..] | ["obj_info", ..] => {}
            ["format", kind, _version] => {
                format = Some(match *kind {
                    "ascii" => PlyFormat::Ascii,
                    "binary_little_endian" => PlyFormat::BinaryLittleEndian,
                    "binary_big_endian" => PlyFormat::BinaryBigEndian,
                    other => {
                        return Err(GeometryError::malformed(format!("unknown PLY format '{}'", other)))
                    }
                });
            }
            ["element", name, count] => {
                let count = count
                    .parse()
                    .map_err(|_| GeometryError::malformed(format!("bad element count '{}'", count)))?;
                elements.push(Element {
                    name: name.to_string(),
                    count,
                    properties: Vec::new(),
                });
            }
            ["property", "list", count, item, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| GeometryError::malformed("property before any element"))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind: PropertyKind::List {
                        count: ScalarType::parse(count)?,
                        item: ScalarType::parse(item)?,
                    },
                });
            }
            ["property", ty, name] => {
                let element = elements
                    .last_mut()
                    .ok_or_else(|| GeometryError::malformed("property before any element"))?;
                element.properties.push(Property {
                    name: name.to_string(),
                    kind: PropertyKind::Scalar(ScalarType::parse(ty)?),
                });
            }
            _ => return Err(GeometryError::malformed(format!("unrecognised header line '{}'", line))),
        }
    }

    // a property-less element reads nothing from the body
    if let Some(empty) = elements.iter().find(|e| e.properties.is_empty() && e.count > 0) {
        return Err(GeometryError::malformed(format!(
            "element '{}' declares {} records but no properties",
            empty.name, empty.count
        )));
    }

    Ok(Header {
        format: format.ok_or_else(|| GeometryError::malformed("PLY header has no format line"))?,
        elements,
        body_offset,
    })
}

/// Pull-based access to body values regardless of encoding
trait ValueSource {
    fn next_value(&mut self, ty: ScalarType) -> Result<f64>;
    /// Fails when unread data remains after the last declared element
    fn finish(&mut self) -> Result<()>;
}

struct AsciiSource<'a> {
    tokens: std::str::SplitAsciiWhitespace<'a>,
}

impl ValueSource for AsciiSource<'_> {
    fn next_value(&mut self, _ty: ScalarType) -> Result<f64> {
        let token = self
            .tokens
            .next()
            .ok_or_else(|| GeometryError::malformed("PLY body shorter than declared"))?;
        token
            .parse()
            .map_err(|_| GeometryError::malformed(format!("bad PLY value '{}'", token)))
    }

    fn finish(&mut self) -> Result<()> {
        match self.tokens.next() {
            Some(_) => Err(GeometryError::malformed("PLY body longer than declared")),
            None => Ok(()),
        }
    }
}

struct BinarySource<'a> {
    bytes: &'a [u8],
    pos: usize,
    big_endian: bool,
}

impl BinarySource<'_> {
    fn take<const N: usize>(&mut self) -> Result<[u8; N]> {
        let chunk = self
            .bytes
            .get(self.pos..self.pos + N)
            .ok_or_else(|| GeometryError::malformed("PLY body shorter than declared"))?;
        self.pos += N;
        let mut out = [0u8; N];
        out.copy_from_slice(chunk);
        if self.big_endian {
            out.reverse();
        }
        Ok(out)
    }
}

impl ValueSource for BinarySource<'_> {
    fn next_value(&mut self, ty: ScalarType) -> Result<f64> {
        Ok(match ty {
            ScalarType::I8 => i8::from_le_bytes(self.take::<1>()?) as f64,
            ScalarType::U8 => u8::from_le_bytes(self.take::<1>()?) as f64,
            ScalarType::I16 => i16::from_le_bytes(self.take::<2>()?) as f64,
            ScalarType::U16 => u16::from_le_bytes(self.take::<2>()?) as f64,
            ScalarType::I32 => i32::from_le_bytes(self.take::<4>()?) as f64,
            ScalarType::U32 => u32::from_le_bytes(self.take::<4>()?) as f64,
            ScalarType::F32 => f32::from_le_bytes(self.take::<4>()?) as f64,
            ScalarType::F64 => f64::from_le_bytes(self.take::<8>()?),
        })
    }

    fn finish(&mut self) -> Result<()> {
        if self.pos != self.bytes.len() {
            return Err(GeometryError::malformed(format!(
                "{} trailing bytes after PLY body",
                self.bytes.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn to_count(value: f64) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(GeometryError::malformed(format!("bad PLY list length {}", value)));
    }
    Ok(value as usize)
}

fn to_index(value: f64) -> Result<usize> {
    if value < 0.0 || value.fract() != 0.0 {
        return Err(GeometryError::malformed(format!("bad PLY vertex index {}", value)));
    }
    Ok(value as usize)
}

/// Parse one record, returning scalar values and list values by property slot
fn read_record(source: &mut dyn ValueSource, element: &Element) -> Result<Vec<Vec<f64>>> {
    element
        .properties
        .iter()
        .map(|property| match property.kind {
            PropertyKind::Scalar(ty) => Ok(vec![source.next_value(ty)?]),
            PropertyKind::List { count, item } => {
                let len = to_count(source.next_value(count)?)?;
                (0..len).map(|_| source.next_value(item)).collect()
            }
        })
        .collect()
}

/// Decode a PLY byte stream
pub fn read_ply(bytes: &[u8]) -> Result<Mesh> {
    let header = parse_header(bytes)?;
    let body = &bytes[header.body_offset..];

    let mut source: Box<dyn ValueSource + '_> = match header.format {
        PlyFormat::Ascii => {
            let text = std::str::from_utf8(body)
                .map_err(|_| GeometryError::malformed("ASCII PLY body is not text"))?;
            Box::new(AsciiSource {
                tokens: text.split_ascii_whitespace(),
            })
        }
        PlyFormat::BinaryLittleEndian | PlyFormat::BinaryBigEndian => Box::new(BinarySource {
            bytes: body,
            pos: 0,
            big_endian: header.format == PlyFormat::BinaryBigEndian,
        }),
    };

    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    let mut has_normals = false;
    let mut faces = Vec::new();

    for element in &header.elements {
        match element.name.as_str() {
            "vertex" => {
                let slot = |name: &str| {
                    element
                        .position(name)
                        .ok_or_else(|| GeometryError::malformed(format!("vertex element lacks '{}'", name)))
                };
                let (x, y, z) = (slot("x")?, slot("y")?, slot("z")?);
                let normal_slots = match (element.position("nx"), element.position("ny"), element.position("nz")) {
                    (Some(nx), Some(ny), Some(nz)) => Some((nx, ny, nz)),
                    _ => None,
                };
                has_normals = normal_slots.is_some();

                for _ in 0..element.count {
                    let record = read_record(source.as_mut(), element)?;
                    vertices.push(Point3::new(record[x][0], record[y][0], record[z][0]));
                    if let Some((nx, ny, nz)) = normal_slots {
                        normals.push(Vector3::new(record[nx][0], record[ny][0], record[nz][0]));
                    }
                }
            }
            "face" => {
                let slot = element
                    .position("vertex_indices")
                    .or_else(|| element.position("vertex_index"))
                    .ok_or_else(|| GeometryError::malformed("face element lacks vertex_indices"))?;

                for face_idx in 0..element.count {
                    let record = read_record(source.as_mut(), element)?;
                    let polygon = record[slot]
                        .iter()
                        .map(|&v| to_index(v))
                        .collect::<Result<Vec<usize>>>()?;
                    if polygon.len() < 3 {
                        return Err(GeometryError::malformed(format!(
                            "face {} has {} vertices",
                            face_idx,
                            polygon.len()
                        )));
                    }
                    for i in 1..polygon.len() - 1 {
                        faces.push(Face::new([polygon[0], polygon[i], polygon[i + 1]]));
                    }
                }
            }
            other => {
                tracing::trace!(element = other, count = element.count, "skipping PLY element");
                for _ in 0..element.count {
                    read_record(source.as_mut(), element)?;
                }
            }
        }
    }
    source.finish()?;

    let mesh = Mesh::from_parts(vertices, faces).map_err(|e| match e {
        GeometryError::OutOfRange(msg) => GeometryError::MalformedFile(msg),
        other => other,
    })?;
    let mesh = if has_normals { mesh.with_normals(normals)? } else { mesh };

    tracing::debug!(
        format = ?header.format,
        vertices = mesh.vertex_count(),
        faces = mesh.face_count(),
        "parsed PLY"
    );
    Ok(mesh)
}

fn check_index(index: usize) -> Result<i32> {
    i32::try_from(index)
        .map_err(|_| GeometryError::invalid_input(format!("vertex index {} exceeds PLY int range", index)))
}

/// Encode a mesh as PLY; positions are written as doubles
pub fn write_ply<W: Write>(mesh: &Mesh, writer: &mut W, encoding: Encoding) -> Result<()> {
    let format = match encoding {
        Encoding::Ascii => "ascii",
        Encoding::Binary => "binary_little_endian",
    };
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", format)?;
    writeln!(writer, "comment shapekit")?;
    writeln!(writer, "element vertex {}", mesh.vertex_count())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {}", axis)?;
    }
    if mesh.normals().is_some() {
        for axis in ["nx", "ny", "nz"] {
            writeln!(writer, "property double {}", axis)?;
        }
    }
    writeln!(writer, "element face {}", mesh.face_count())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    match encoding {
        Encoding::Ascii => {
            for (i, v) in mesh.vertices().iter().enumerate() {
                write!(writer, "{} {} {}", v.x, v.y, v.z)?;
                if let Some(normals) = mesh.normals() {
                    let n = normals[i];
                    write!(writer, " {} {} {}", n.x, n.y, n.z)?;
                }
                writeln!(writer)?;
            }
            for face in mesh.faces() {
                let [a, b, c] = face.indices;
                writeln!(writer, "3 {} {} {}", check_index(a)?, check_index(b)?, check_index(c)?)?;
            }
        }
        Encoding::Binary => {
            for (i, v) in mesh.vertices().iter().enumerate() {
                for value in [v.x, v.y, v.z] {
                    writer.write_all(&value.to_le_bytes())?;
                }
                if let Some(normals) = mesh.normals() {
                    for value in normals[i].iter() {
                        writer.write_all(&value.to_le_bytes())?;
                    }
                }
            }
            for face in mesh.faces() {
                writer.write_all(&[3u8])?;
                for &index in &face.indices {
                    writer.write_all(&check_index(index)?.to_le_bytes())?;
                }
            }
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;

    const QUAD: &str = "ply
format ascii 1.0
comment hand written
element vertex 4
property float x
property float y
property float z
property uchar red
element face 1
property list uchar int vertex_indices
element edge 1
property int vertex1
property int vertex2
end_header
0 0 0 255
1 0 0 0
1 1 0 0
0 1 0 0
4 0 1 2 3
0 1
";

    #[test]
    fn test_ascii_quad_is_fanned() {
        let mesh = read_ply(QUAD.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.faces()[0].indices, [0, 1, 2]);
        assert_eq!(mesh.faces()[1].indices, [0, 2, 3]);
        assert!(mesh.normals().is_none());
    }

    #[test]
    fn test_count_mismatch_is_malformed() {
        let truncated = QUAD.replace("0 1\n", "");
        assert!(matches!(read_ply(truncated.as_bytes()), Err(GeometryError::MalformedFile(_))));

        let extra = format!("{}7 7\n", QUAD);
        assert!(matches!(read_ply(extra.as_bytes()), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_oversized_counts_are_malformed() {
        let huge = QUAD.replace("element vertex 4", &format!("element vertex {}", usize::MAX));
        assert!(matches!(read_ply(huge.as_bytes()), Err(GeometryError::MalformedFile(_))));

        let huge_faces = QUAD.replace("element face 1", &format!("element face {}", u64::MAX));
        assert!(matches!(read_ply(huge_faces.as_bytes()), Err(GeometryError::MalformedFile(_))));

        let mut binary = format!(
            "ply\nformat binary_little_endian 1.0\nelement vertex {}\nproperty float x\nproperty float y\nproperty float z\nend_header\n",
            usize::MAX
        )
        .into_bytes();
        binary.extend_from_slice(&1.0f32.to_le_bytes());
        assert!(matches!(read_ply(&binary), Err(GeometryError::MalformedFile(_))));

        let bare = QUAD.replace("end_header", &format!("element marker {}\nend_header", usize::MAX));
        assert!(matches!(read_ply(bare.as_bytes()), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_index_out_of_range_is_malformed() {
        let bad = QUAD.replace("4 0 1 2 3", "4 0 1 2 9");
        assert!(matches!(read_ply(bad.as_bytes()), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_round_trip_both_encodings() {
        let mut mesh = shapes::uv_sphere(1.3, 12);
        mesh.recompute_normals();

        for encoding in [Encoding::Ascii, Encoding::Binary] {
            let mut bytes = Vec::new();
            write_ply(&mesh, &mut bytes, encoding).unwrap();
            let back = read_ply(&bytes).unwrap();
            assert_eq!(back, mesh);
        }
    }

    #[test]
    fn test_binary_truncation() {
        let mut bytes = Vec::new();
        write_ply(&shapes::unit_cube(), &mut bytes, Encoding::Binary).unwrap();
        bytes.truncate(bytes.len() - 3);
        assert!(matches!(read_ply(&bytes), Err(GeometryError::MalformedFile(_))));
    }

    #[test]
    fn test_big_endian_floats() {
        let mut bytes = b"ply\nformat binary_big_endian 1.0\nelement vertex 3\nproperty float x\nproperty float y\nproperty float z\nelement face 1\nproperty list uchar uint vertex_index\nend_header\n".to_vec();
        for v in [0.0f32, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0, 0.0] {
            bytes.extend_from_slice(&v.to_be_bytes());
        }
        bytes.push(3);
        for i in [0u32, 1, 2] {
            bytes.extend_from_slice(&i.to_be_bytes());
        }
        let mesh = read_ply(&bytes).unwrap();
        assert_eq!(mesh.vertices()[1], Point3::new(2.0, 0.0, 0.0));
        assert_eq!(mesh.face_count(), 1);
    }
}
