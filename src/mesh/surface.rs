//! The triangulated surface container.

use std::path::Path;

use nalgebra::{Point2, Point3, Vector3};

use super::face::{Face, IndexBase};
use super::index::{FaceId, VertexId};
use crate::error::{MeshError, Result};

/// Faces whose corner angle has a smaller sine are treated as flat.
const DEGENERATE_SINE: f64 = 1e-12;

/// A triangulated surface with optional per-vertex attributes.
///
/// Normals and texture coordinates, when present, are index-aligned with the
/// vertex block. Faces keep the corner records they were loaded with, in the
/// mesh's [`IndexBase`]. Geometry code reads zero-based triangles through
/// [`Mesh::triangle`].
///
/// Stages never mutate a mesh in place; they build a new one (see
/// [`Mesh::with_vertices`]) or a derived point map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    normals: Vec<Vector3<f64>>,
    texcoords: Vec<Point2<f64>>,
    faces: Vec<Face>,
    index_base: IndexBase,
}

impl Mesh {
    /// Build a mesh from already computed attribute arrays.
    ///
    /// The index base of `faces` is inferred (see [`IndexBase::detect`]).
    /// Records that never reference index 0 are taken as one-based, so a
    /// zero-based face list that skips vertex 0 must go through
    /// [`Mesh::with_index_base`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidVertexIndex`] if a face references a vertex
    /// outside the vertex block.
    pub fn from_attributes(
        vertices: Vec<Point3<f64>>,
        faces: Vec<Face>,
        normals: Vec<Vector3<f64>>,
        texcoords: Vec<Point2<f64>>,
    ) -> Result<Self> {
        let index_base = IndexBase::detect(&faces);
        if index_base == IndexBase::One
            && faces
                .iter()
                .flat_map(Face::corners)
                .all(|c| c.vertex < vertices.len())
        {
            log::debug!("face indices fit either index base, reading them as one-based");
        }
        Self::with_index_base(vertices, faces, normals, texcoords, index_base)
    }

    /// Build a mesh whose faces use an explicit index base.
    pub fn with_index_base(
        vertices: Vec<Point3<f64>>,
        faces: Vec<Face>,
        normals: Vec<Vector3<f64>>,
        texcoords: Vec<Point2<f64>>,
        index_base: IndexBase,
    ) -> Result<Self> {
        let mesh = Self {
            vertices,
            normals,
            texcoords,
            faces,
            index_base,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Build a mesh from positions and zero-based triangles.
    ///
    /// # Example
    ///
    /// ```
    /// use drapeflat::mesh::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let mesh = Mesh::from_triangles(
    ///     vec![
    ///         Point3::new(0.0, 0.0, 0.0),
    ///         Point3::new(1.0, 0.0, 0.0),
    ///         Point3::new(0.0, 1.0, 0.0),
    ///     ],
    ///     &[[0, 1, 2]],
    /// )
    /// .unwrap();
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn from_triangles(vertices: Vec<Point3<f64>>, triangles: &[[usize; 3]]) -> Result<Self> {
        let faces = triangles
            .iter()
            .map(|&[a, b, c]| Face::triangle(a, b, c))
            .collect();
        Self::with_index_base(vertices, faces, Vec::new(), Vec::new(), IndexBase::Zero)
    }

    /// Load a mesh from a geometry file. See [`crate::io::obj::load`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        crate::io::obj::load(path)
    }

    /// Parse a mesh from geometry text. See [`crate::io::obj::parse`].
    pub fn parse(text: &str) -> Result<Self> {
        crate::io::obj::parse(text)
    }

    /// Parse a mesh from a fetched blob. See [`crate::io::obj::from_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        crate::io::obj::from_bytes(bytes)
    }

    /// Parse a mesh from any buffered reader. See [`crate::io::obj::from_reader`].
    pub fn from_reader<R: std::io::BufRead>(reader: R) -> Result<Self> {
        crate::io::obj::from_reader(reader)
    }

    /// Save this mesh to a geometry file. See [`crate::io::obj::save`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        crate::io::obj::save(self, path)
    }

    fn validate(&self) -> Result<()> {
        let offset = self.index_base.offset();
        let n = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            for corner in face.corners() {
                if corner.vertex < offset || corner.vertex - offset >= n {
                    return Err(MeshError::InvalidVertexIndex {
                        face: fi,
                        vertex: corner.vertex,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    /// Vertex normals (empty if the mesh has none).
    #[inline]
    pub fn normals(&self) -> &[Vector3<f64>] {
        &self.normals
    }

    /// Texture coordinates (empty if the mesh has none).
    #[inline]
    pub fn texcoords(&self) -> &[Point2<f64>] {
        &self.texcoords
    }

    /// Face records as loaded.
    #[inline]
    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    /// Index base of the face records.
    #[inline]
    pub fn index_base(&self) -> IndexBase {
        self.index_base
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.index()]
    }

    /// Iterate over all face ids.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// True if every face is a triangle.
    pub fn is_triangulated(&self) -> bool {
        self.faces.iter().all(Face::is_triangle)
    }

    /// Zero-based vertex ids of a triangular face.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnsupportedTopology`] if the face is not a triangle.
    pub fn triangle(&self, f: FaceId) -> Result<[VertexId; 3]> {
        let face = &self.faces[f.index()];
        match face.corners() {
            [a, b, c] => {
                let offset = self.index_base.offset();
                Ok([
                    VertexId::new(a.vertex - offset),
                    VertexId::new(b.vertex - offset),
                    VertexId::new(c.vertex - offset),
                ])
            }
            corners => Err(MeshError::UnsupportedTopology {
                face: f.index(),
                corners: corners.len(),
            }),
        }
    }

    /// Zero-based triangles for every face.
    ///
    /// # Errors
    ///
    /// Fails on the first face that is not a triangle.
    pub fn triangles(&self) -> Result<Vec<[VertexId; 3]>> {
        self.face_ids().map(|f| self.triangle(f)).collect()
    }

    /// Unit normal of a triangular face, or `None` if the face has zero area.
    ///
    /// A face counts as flat when the sine of the angle at its first corner
    /// is below `1e-12`, whatever the mesh units.
    pub fn face_normal(&self, f: FaceId) -> Result<Option<Vector3<f64>>> {
        let [a, b, c] = self.triangle(f)?;
        let p0 = self.position(a);
        let e1 = self.position(b) - p0;
        let e2 = self.position(c) - p0;
        let n = e1.cross(&e2);
        let len = n.norm();
        if len <= DEGENERATE_SINE * e1.norm() * e2.norm() {
            Ok(None)
        } else {
            Ok(Some(n / len))
        }
    }

    /// Euclidean distance between two vertices.
    #[inline]
    pub fn edge_length(&self, a: VertexId, b: VertexId) -> f64 {
        (self.position(a) - self.position(b)).norm()
    }

    /// Axis-aligned bounding box, or `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(min, max), p| {
            (min.inf(p), max.sup(p))
        }))
    }

    /// Lowest Y coordinate, or `None` for a mesh without vertices.
    pub fn min_y(&self) -> Option<f64> {
        self.vertices.iter().map(|p| p.y).reduce(f64::min)
    }

    /// A copy of this mesh with new vertex positions.
    ///
    /// Faces, normals and texture coordinates are carried over unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::InvalidParameter`] if the number of positions
    /// differs from the current vertex count.
    pub fn with_vertices(&self, vertices: Vec<Point3<f64>>) -> Result<Self> {
        if vertices.len() != self.vertices.len() {
            return Err(MeshError::invalid_param(
                "vertices",
                vertices.len(),
                "must match the mesh vertex count",
            ));
        }
        Ok(Self {
            vertices,
            normals: self.normals.clone(),
            texcoords: self.texcoords.clone(),
            faces: self.faces.clone(),
            index_base: self.index_base,
        })
    }

    /// A copy of this mesh moved by `offset`.
    pub fn translated(&self, offset: Vector3<f64>) -> Self {
        Self {
            vertices: self.vertices.iter().map(|p| p + offset).collect(),
            ..self.clone()
        }
    }
}
