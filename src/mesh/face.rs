//! Face records.
//!
//! Faces are kept exactly as they were written in the geometry file: each
//! corner carries the vertex index and the optional texture-coordinate and
//! normal references, in the file's own index base. Nothing is renumbered on
//! load, so a loaded mesh saves back to the same face lines.

use std::fmt;
use std::str::FromStr;

/// Whether face records count vertices from 1 (the OBJ convention) or from 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexBase {
    /// Indices start at 1.
    #[default]
    One,
    /// Indices start at 0.
    Zero,
}

impl IndexBase {
    /// Offset to subtract from a written index to get a zero-based position.
    #[inline]
    pub fn offset(self) -> usize {
        match self {
            IndexBase::One => 1,
            IndexBase::Zero => 0,
        }
    }

    /// Infer the base from a set of faces: any corner written as `0` means
    /// the records are zero-based, anything else is taken as one-based.
    ///
    /// Zero-based records that never reference vertex 0 cannot be told
    /// apart from one-based ones and are read as one-based. Use
    /// [`Mesh::with_index_base`](crate::mesh::Mesh::with_index_base) when
    /// the base is known.
    pub fn detect<'a>(faces: impl IntoIterator<Item = &'a Face>) -> IndexBase {
        let zero_based = faces.into_iter().flat_map(|f| f.corners()).any(|c| {
            c.vertex == 0 || c.texcoord == Some(0) || c.normal == Some(0)
        });
        if zero_based {
            IndexBase::Zero
        } else {
            IndexBase::One
        }
    }
}

/// One corner of a face record, as written: `v`, `v/t`, `v//n` or `v/t/n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceCorner {
    /// Vertex index as written.
    pub vertex: usize,
    /// Texture-coordinate reference as written, if any.
    pub texcoord: Option<usize>,
    /// Normal reference as written, if any.
    pub normal: Option<usize>,
}

impl FaceCorner {
    /// A corner that only references a vertex.
    pub fn vertex(vertex: usize) -> Self {
        Self {
            vertex,
            texcoord: None,
            normal: None,
        }
    }
}

impl FromStr for FaceCorner {
    type Err = String;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut parts = token.split('/');
        let parse = |s: &str, what: &str| {
            s.parse::<usize>()
                .map_err(|_| format!("invalid {} index '{}' in face token '{}'", what, s, token))
        };

        let vertex = parse(parts.next().unwrap_or(""), "vertex")?;
        let texcoord = match parts.next() {
            None | Some("") => None,
            Some(s) => Some(parse(s, "texture")?),
        };
        let normal = match parts.next() {
            None => None,
            Some(s) => Some(parse(s, "normal")?),
        };
        if parts.next().is_some() {
            return Err(format!("face token '{}' has too many fields", token));
        }

        Ok(Self {
            vertex,
            texcoord,
            normal,
        })
    }
}

impl fmt::Display for FaceCorner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.texcoord, self.normal) {
            (None, None) => write!(f, "{}", self.vertex),
            (Some(t), None) => write!(f, "{}/{}", self.vertex, t),
            (None, Some(n)) => write!(f, "{}//{}", self.vertex, n),
            (Some(t), Some(n)) => write!(f, "{}/{}/{}", self.vertex, t, n),
        }
    }
}

/// A face record: an ordered list of corners.
///
/// Only triangles take part in geometry processing, but polygons are kept
/// as loaded so that the caller gets a precise error instead of silently
/// truncated faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    corners: Vec<FaceCorner>,
}

impl Face {
    /// Create a face from its corners.
    pub fn new(corners: Vec<FaceCorner>) -> Self {
        Self { corners }
    }

    /// A triangle whose corners only reference vertices.
    pub fn triangle(v0: usize, v1: usize, v2: usize) -> Self {
        Self::new(vec![
            FaceCorner::vertex(v0),
            FaceCorner::vertex(v1),
            FaceCorner::vertex(v2),
        ])
    }

    /// The corners of this face.
    #[inline]
    pub fn corners(&self) -> &[FaceCorner] {
        &self.corners
    }

    /// Number of corners.
    #[inline]
    pub fn len(&self) -> usize {
        self.corners.len()
    }

    /// True if the face has no corners.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.corners.is_empty()
    }

    /// True if the face has exactly three corners.
    #[inline]
    pub fn is_triangle(&self) -> bool {
        self.corners.len() == 3
    }
}
