//! Wavefront OBJ format support.
//!
//! The reader understands the four records a garment export needs:
//!
//! | key | fields | meaning |
//! |-----|--------|---------|
//! | `v` | 3 floats | vertex position |
//! | `vn` | 3 floats | vertex normal |
//! | `vt` | 2 floats | texture coordinate |
//! | `f` | corner tokens | face (`v`, `v/t`, `v//n` or `v/t/n`) |
//!
//! Any other key (`o`, `g`, `usemtl`, `s`, ...) is skipped, as are blank
//! lines and `#` comments. Trailing extra fields on `v`/`vn`/`vt` records
//! (weights, vertex colours) must still be numbers but are dropped.
//!
//! The writer emits the blocks in the order vertices, normals, texture
//! coordinates, faces. Coordinates are written with Rust's shortest
//! round-trip float formatting, so `save` followed by `load` reproduces the
//! arrays bit for bit.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use nalgebra::{Point2, Point3, Vector3};

use crate::error::{MeshError, Result};
use crate::mesh::{Face, FaceCorner, Mesh};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use drapeflat::io::obj;
///
/// let garment = obj::load("garment.obj").unwrap();
/// println!("{} vertices", garment.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mesh = from_reader(BufReader::new(file))?;
    log::debug!(
        "loaded {}: {} vertices, {} faces",
        path.display(),
        mesh.num_vertices(),
        mesh.num_faces()
    );
    Ok(mesh)
}

/// Parse a mesh from OBJ text.
pub fn parse(text: &str) -> Result<Mesh> {
    from_reader(text.as_bytes())
}

/// Parse a mesh from raw OBJ bytes, e.g. a blob fetched from a file store.
pub fn from_bytes(bytes: &[u8]) -> Result<Mesh> {
    from_reader(bytes)
}

/// Parse a mesh from any buffered reader.
///
/// # Errors
///
/// - [`MeshError::Format`] for a record with missing or non-numeric fields,
///   or a line that is not valid UTF-8 (line numbers are 1-based)
/// - [`MeshError::InvalidVertexIndex`] if a face references a vertex that
///   was never declared
/// - [`MeshError::Io`] if reading fails
pub fn from_reader<R: BufRead>(reader: R) -> Result<Mesh> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut normals: Vec<Vector3<f64>> = Vec::new();
    let mut texcoords: Vec<Point2<f64>> = Vec::new();
    let mut faces: Vec<Face> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line_no = i + 1;
        let line = line.map_err(|e| match e.kind() {
            ErrorKind::InvalidData => MeshError::format(line_no, "line is not valid UTF-8"),
            _ => MeshError::Io(e),
        })?;

        let mut tokens = line.split_whitespace();
        let Some(key) = tokens.next() else {
            continue;
        };

        match key {
            "v" => {
                let [x, y, z] = parse_floats::<3>(tokens, line_no, key)?;
                vertices.push(Point3::new(x, y, z));
            }
            "vn" => {
                let [x, y, z] = parse_floats::<3>(tokens, line_no, key)?;
                normals.push(Vector3::new(x, y, z));
            }
            "vt" => {
                let [u, v] = parse_floats::<2>(tokens, line_no, key)?;
                texcoords.push(Point2::new(u, v));
            }
            "f" => {
                let corners = tokens
                    .map(|t| t.parse::<FaceCorner>())
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|msg| MeshError::format(line_no, msg))?;
                if corners.len() < 3 {
                    return Err(MeshError::format(
                        line_no,
                        format!("face has {} corners, at least 3 required", corners.len()),
                    ));
                }
                faces.push(Face::new(corners));
            }
            _ => {}
        }
    }

    Mesh::from_attributes(vertices, faces, normals, texcoords)
}

/// Parse the numeric fields of a `v`/`vn`/`vt` record, keeping the first `N`.
fn parse_floats<'a, const N: usize>(
    tokens: impl Iterator<Item = &'a str>,
    line_no: usize,
    key: &str,
) -> Result<[f64; N]> {
    let mut out = [0.0; N];
    let mut count = 0;
    for token in tokens {
        let value = token.parse::<f64>().map_err(|_| {
            MeshError::format(line_no, format!("invalid number '{}' in '{}' record", token, key))
        })?;
        if count < N {
            out[count] = value;
        }
        count += 1;
    }
    if count < N {
        return Err(MeshError::format(
            line_no,
            format!("'{}' record needs {} values, found {}", key, N, count),
        ));
    }
    Ok(out)
}

/// Save a mesh to an OBJ file.
///
/// Every face must be a triangle; this is checked before the file is
/// created, so a rejected mesh never leaves a partial file behind.
///
/// # Errors
///
/// - [`MeshError::UnsupportedTopology`] for the first non-triangular face
/// - [`MeshError::Io`] if the file cannot be written
pub fn save<P: AsRef<Path>>(mesh: &Mesh, path: P) -> Result<()> {
    check_triangulated(mesh)?;
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Serialize a mesh as OBJ text.
pub fn to_string(mesh: &Mesh) -> Result<String> {
    let mut buf = Vec::new();
    write(mesh, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write a mesh as OBJ records to any writer.
pub fn write<W: Write>(mesh: &Mesh, writer: &mut W) -> Result<()> {
    for v in mesh.vertices() {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for n in mesh.normals() {
        writeln!(writer, "vn {} {} {}", n.x, n.y, n.z)?;
    }
    for t in mesh.texcoords() {
        writeln!(writer, "vt {} {}", t.x, t.y)?;
    }
    for (fi, face) in mesh.faces().iter().enumerate() {
        match face.corners() {
            [a, b, c] => writeln!(writer, "f {} {} {}", a, b, c)?,
            corners => {
                return Err(MeshError::UnsupportedTopology {
                    face: fi,
                    corners: corners.len(),
                })
            }
        }
    }

    Ok(())
}

fn check_triangulated(mesh: &Mesh) -> Result<()> {
    match mesh.faces().iter().position(|f| !f.is_triangle()) {
        Some(face) => Err(MeshError::UnsupportedTopology {
            face,
            corners: mesh.faces()[face].len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{FaceId, IndexBase, VertexId};
    use approx::assert_relative_eq;
    use tempfile::tempdir;

    const GARMENT: &str = "\
# exported drape
o Garment
v 0.1 1.25 -0.3333333333333333
v 1e-3 2.5 0.0
v -4.75 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 1.0 0.0
vn 1.0 0.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 0.5 1.0
usemtl fabric
s off
f 1/1/1 2/2/2 3/3/3
";

    #[test]
    fn test_parse_records() {
        let mesh = parse(GARMENT).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.normals().len(), 3);
        assert_eq!(mesh.texcoords().len(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.index_base(), IndexBase::One);
        assert_relative_eq!(mesh.vertices()[1].x, 0.001);
        assert_eq!(
            mesh.triangle(FaceId::new(0)).unwrap(),
            [VertexId::new(0), VertexId::new(1), VertexId::new(2)]
        );
        assert_eq!(mesh.faces()[0].corners()[2].to_string(), "3/3/3");
    }

    #[test]
    fn test_roundtrip_is_exact() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garment.obj");

        let mesh = parse(GARMENT).unwrap();
        save(&mesh, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, mesh);
        assert_eq!(
            loaded.vertices()[0].z.to_bits(),
            (-0.3333333333333333f64).to_bits()
        );
    }

    #[test]
    fn test_zero_based_faces_preserved() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 0 1 2\n";
        let mesh = parse(text).unwrap();
        assert_eq!(mesh.index_base(), IndexBase::Zero);
        let out = to_string(&mesh).unwrap();
        assert!(out.ends_with("f 0 1 2\n"));
    }

    #[test]
    fn test_block_order() {
        let text = "f 1 2 3\nvt 0 0\nv 0 0 0\nvn 0 0 1\nv 1 0 0\nv 0 1 0\n";
        let out = to_string(&parse(text).unwrap()).unwrap();
        let keys: Vec<&str> = out
            .lines()
            .map(|l| l.split_whitespace().next().unwrap())
            .collect();
        assert_eq!(keys, vec!["v", "v", "v", "vn", "vt", "f"]);
    }

    #[test]
    fn test_malformed_number_names_line() {
        let text = "v 0 0 0\nv 1 zero 0\n";
        match parse(text) {
            Err(MeshError::Format { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("zero"));
            }
            other => panic!("expected format error, got {:?}", other),
        }
    }

    #[test]
    fn test_short_record_is_format_error() {
        assert!(matches!(
            parse("v 0 0\n"),
            Err(MeshError::Format { line: 1, .. })
        ));
        assert!(matches!(
            parse("v 0 0 0\nv 1 0 0\nf 1 2\n"),
            Err(MeshError::Format { line: 3, .. })
        ));
    }

    #[test]
    fn test_out_of_range_face() {
        let result = parse("v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 4\n");
        assert!(matches!(
            result,
            Err(MeshError::InvalidVertexIndex { face: 0, vertex: 4 })
        ));
    }

    #[test]
    fn test_invalid_utf8_is_format_error() {
        let bytes = b"v 0 0 0\nv \xff 0 0\n";
        assert!(matches!(
            from_bytes(bytes),
            Err(MeshError::Format { line: 2, .. })
        ));
    }

    #[test]
    fn test_save_rejects_quads_without_creating_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quad.obj");
        let mesh = parse("v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n").unwrap();

        let result = save(&mesh, &path);
        assert!(matches!(
            result,
            Err(MeshError::UnsupportedTopology { face: 0, corners: 4 })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load(dir.path().join("missing.obj")),
            Err(MeshError::Io(_))
        ));
    }
}
