//! The flattened point map and its observer.

use nalgebra::{Point2, Point3};

use crate::error::{MeshError, Result};
use crate::mesh::{Face, FaceCorner, IndexBase, Mesh, VertexId};

/// 2D positions assigned to the vertices of a mesh.
///
/// A vertex is either placed or unplaced. Once placed, a vertex keeps its
/// position: [`place`](Self::place) never overwrites.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedPointMap {
    points: Vec<Option<Point2<f64>>>,
}

impl FlattenedPointMap {
    /// A map over `n` vertices, all unplaced.
    pub fn new(n: usize) -> Self {
        Self {
            points: vec![None; n],
        }
    }

    /// Number of vertices covered by the map, placed or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the map covers no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of a vertex, if placed.
    #[inline]
    pub fn get(&self, v: VertexId) -> Option<Point2<f64>> {
        self.points.get(v.index()).copied().flatten()
    }

    /// True if the vertex has a position.
    #[inline]
    pub fn is_placed(&self, v: VertexId) -> bool {
        self.get(v).is_some()
    }

    /// Place a vertex. Returns false, leaving the map unchanged, if it was
    /// already placed.
    pub fn place(&mut self, v: VertexId, p: Point2<f64>) -> bool {
        match &mut self.points[v.index()] {
            Some(_) => false,
            slot => {
                *slot = Some(p);
                true
            }
        }
    }

    /// Number of placed vertices.
    pub fn placed_count(&self) -> usize {
        self.points.iter().filter(|p| p.is_some()).count()
    }

    /// True if every vertex is placed.
    pub fn is_complete(&self) -> bool {
        self.points.iter().all(Option::is_some)
    }

    /// Vertices without a position, in ascending order.
    pub fn unplaced(&self) -> Vec<VertexId> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_none())
            .map(|(i, _)| VertexId::new(i))
            .collect()
    }

    /// Iterate over placed vertices and their positions.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, Point2<f64>)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (VertexId::new(i), p)))
    }

    /// Bounding box of the placed positions, or `None` if nothing is placed.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let mut placed = self.iter().map(|(_, p)| p);
        let first = placed.next()?;
        Some(placed.fold((first, first), |(min, max), p| (min.inf(&p), max.sup(&p))))
    }

    /// Largest difference between a 3D edge length of `mesh` and the length
    /// of the same edge in the plane.
    ///
    /// Only faces with all three corners placed are measured; `0.0` is
    /// returned when there are none.
    pub fn max_edge_error(&self, mesh: &Mesh) -> Result<f64> {
        self.check_len(mesh)?;
        let mut worst = 0.0_f64;
        for tri in mesh.triangles()? {
            let flat = match (self.get(tri[0]), self.get(tri[1]), self.get(tri[2])) {
                (Some(a), Some(b), Some(c)) => [a, b, c],
                _ => continue,
            };
            for k in 0..3 {
                let l = (k + 1) % 3;
                let err = ((flat[k] - flat[l]).norm() - mesh.edge_length(tri[k], tri[l])).abs();
                worst = worst.max(err);
            }
        }
        Ok(worst)
    }

    /// Re-emit the pattern as a mesh lying in the z = 0 plane.
    ///
    /// The faces of `source` are kept as written, minus their normal
    /// references; texture coordinates are kept, normals are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::Incomplete`] if any vertex is unplaced.
    pub fn to_mesh(&self, source: &Mesh) -> Result<Mesh> {
        self.check_len(source)?;

        let mut vertices = Vec::with_capacity(self.points.len());
        let mut unplaced = 0;
        for p in &self.points {
            match p {
                Some(p) => vertices.push(Point3::new(p.x, p.y, 0.0)),
                None => unplaced += 1,
            }
        }
        if unplaced > 0 {
            return Err(MeshError::Incomplete { unplaced });
        }

        let faces = source
            .faces()
            .iter()
            .map(|f| {
                Face::new(
                    f.corners()
                        .iter()
                        .map(|c| FaceCorner { normal: None, ..*c })
                        .collect(),
                )
            })
            .collect();

        Mesh::with_index_base(
            vertices,
            faces,
            Vec::new(),
            source.texcoords().to_vec(),
            source.index_base(),
        )
    }

    /// Re-emit only the placed part of the pattern.
    ///
    /// Unplaced vertices are removed and the remaining ones renumbered in
    /// order. Faces survive only if every corner is placed. The result is
    /// one-based and carries no normals or texture coordinates.
    pub fn to_placed_mesh(&self, source: &Mesh) -> Result<Mesh> {
        self.check_len(source)?;

        let mut remap = vec![None; self.points.len()];
        let mut vertices = Vec::new();
        for (v, p) in self.iter() {
            remap[v.index()] = Some(vertices.len());
            vertices.push(Point3::new(p.x, p.y, 0.0));
        }

        let offset = source.index_base().offset();
        let faces = source
            .faces()
            .iter()
            .filter_map(|f| {
                f.corners()
                    .iter()
                    .map(|c| remap[c.vertex - offset].map(|i| FaceCorner::vertex(i + 1)))
                    .collect::<Option<Vec<_>>>()
                    .map(Face::new)
            })
            .collect();

        Mesh::with_index_base(vertices, faces, Vec::new(), Vec::new(), IndexBase::One)
    }

    fn check_len(&self, mesh: &Mesh) -> Result<()> {
        if mesh.num_vertices() != self.points.len() {
            return Err(MeshError::invalid_param(
                "mesh",
                mesh.num_vertices(),
                "vertex count does not match the point map",
            ));
        }
        Ok(())
    }
}

/// A callback that receives the point map after every placement.
///
/// This is the hook for plotting or recording an unfolding while it runs.
pub struct Observer {
    callback: Box<dyn Fn(&FlattenedPointMap) + Send + Sync>,
}

impl Observer {
    /// Create an observer from a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&FlattenedPointMap) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// An observer that ignores every update.
    pub fn none() -> Self {
        Self::new(|_| {})
    }

    #[inline]
    pub(crate) fn notify(&self, points: &FlattenedPointMap) {
        (self.callback)(points);
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}
