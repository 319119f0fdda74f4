//! Face adjacency.
//!
//! Two triangles are adjacent when they share exactly one edge, i.e. exactly
//! two vertex indices. Faces are bucketed by their sorted edge keys, so the
//! graph is built in a single pass instead of a pairwise scan over all faces.
//!
//! An edge indexed by more than two faces is non-manifold. It is recorded,
//! logged, and only its first two faces are paired, passing over exact
//! copies of the first one; the caller decides whether that is acceptable
//! ([`AdjacencyGraph::require_manifold`]).

use std::collections::HashMap;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, Mesh, VertexId};

/// Two faces sharing one edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacePair {
    /// The face found first (lower face index).
    pub a: FaceId,
    /// The other face.
    pub b: FaceId,
    /// The two vertices both faces share, in ascending order.
    pub shared: [VertexId; 2],
    /// The vertex of `a` not on the shared edge.
    pub lone_a: VertexId,
    /// The vertex of `b` not on the shared edge.
    pub lone_b: VertexId,
}

impl FacePair {
    /// The four distinct vertices this pair touches.
    pub fn vertices(&self) -> [VertexId; 4] {
        [self.shared[0], self.shared[1], self.lone_a, self.lone_b]
    }
}

/// An edge shared by more than two faces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonManifoldEdge {
    /// The edge endpoints, in ascending order.
    pub edge: [VertexId; 2],
    /// Every face indexing the edge, in face order.
    pub faces: Vec<FaceId>,
}

/// The face-adjacency relation of a triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyGraph {
    pairs: Vec<FacePair>,
    /// Pair indices per face.
    face_pairs: Vec<Vec<usize>>,
    non_manifold: Vec<NonManifoldEdge>,
}

type EdgeKey = (usize, usize);

#[inline]
fn edge_key(u: VertexId, v: VertexId) -> EdgeKey {
    let (u, v) = (u.index(), v.index());
    if u < v {
        (u, v)
    } else {
        (v, u)
    }
}

impl AdjacencyGraph {
    /// Build the adjacency graph of `mesh`.
    ///
    /// Pairs are emitted in ascending order of their first face. Faces
    /// with a repeated vertex index take no part in adjacency.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnsupportedTopology`] if any face is not a triangle.
    pub fn build(mesh: &Mesh) -> Result<Self> {
        let triangles = mesh.triangles()?;

        let degenerate = |t: &[VertexId; 3]| t[0] == t[1] || t[1] == t[2] || t[0] == t[2];

        let mut edge_faces: HashMap<EdgeKey, Vec<FaceId>> = HashMap::with_capacity(triangles.len() * 2);
        for (fi, t) in triangles.iter().enumerate() {
            if degenerate(t) {
                log::debug!("face {} has a repeated vertex, skipped for adjacency", fi);
                continue;
            }
            for k in 0..3 {
                edge_faces
                    .entry(edge_key(t[k], t[(k + 1) % 3]))
                    .or_default()
                    .push(FaceId::new(fi));
            }
        }

        let mut graph = AdjacencyGraph {
            pairs: Vec::new(),
            face_pairs: vec![Vec::new(); triangles.len()],
            non_manifold: Vec::new(),
        };

        // Walk faces in order so that the pair list does not depend on the
        // hash map's iteration order.
        for (fi, t) in triangles.iter().enumerate() {
            if degenerate(t) {
                continue;
            }
            for k in 0..3 {
                let key = edge_key(t[k], t[(k + 1) % 3]);
                let faces = &edge_faces[&key];
                if faces[0].index() != fi || faces.len() < 2 {
                    continue;
                }

                // Exact copies of the first face share all three vertices
                // with it; its neighbour is the first face that is not one.
                let pair = faces[1..]
                    .iter()
                    .find_map(|&b| make_pair(&triangles, faces[0], b, key));

                if faces.len() > 2 {
                    match &pair {
                        Some(p) => log::warn!(
                            "edge ({}, {}) is shared by {} faces, pairing faces {} and {} only",
                            key.0,
                            key.1,
                            faces.len(),
                            p.a,
                            p.b
                        ),
                        None => log::warn!(
                            "edge ({}, {}) is shared by {} copies of one face",
                            key.0,
                            key.1,
                            faces.len()
                        ),
                    }
                    graph.non_manifold.push(NonManifoldEdge {
                        edge: [VertexId::new(key.0), VertexId::new(key.1)],
                        faces: faces.clone(),
                    });
                }

                if let Some(pair) = pair {
                    let id = graph.pairs.len();
                    graph.face_pairs[pair.a.index()].push(id);
                    graph.face_pairs[pair.b.index()].push(id);
                    graph.pairs.push(pair);
                }
            }
        }

        log::debug!(
            "adjacency: {} faces, {} pairs, {} non-manifold edges",
            triangles.len(),
            graph.pairs.len(),
            graph.non_manifold.len()
        );

        Ok(graph)
    }

    /// All adjacency pairs.
    #[inline]
    pub fn pairs(&self) -> &[FacePair] {
        &self.pairs
    }

    /// Number of adjacency pairs.
    #[inline]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// True if no two faces are adjacent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Number of faces of the mesh the graph was built from.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.face_pairs.len()
    }

    /// Indices into [`pairs`](Self::pairs) of the pairs containing `face`.
    pub fn pairs_of_face(&self, face: FaceId) -> &[usize] {
        self.face_pairs
            .get(face.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges shared by more than two faces.
    #[inline]
    pub fn non_manifold_edges(&self) -> &[NonManifoldEdge] {
        &self.non_manifold
    }

    /// True if no edge is shared by more than two faces.
    #[inline]
    pub fn is_manifold(&self) -> bool {
        self.non_manifold.is_empty()
    }

    /// Fail if the mesh had a non-manifold edge.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::NonManifoldEdge`] describing the first such edge.
    pub fn require_manifold(&self) -> Result<()> {
        match self.non_manifold.first() {
            Some(e) => Err(MeshError::NonManifoldEdge {
                v0: e.edge[0].index(),
                v1: e.edge[1].index(),
                faces: e.faces.len(),
            }),
            None => Ok(()),
        }
    }
}

/// Pair two faces that index the same edge, if they share exactly that edge.
fn make_pair(triangles: &[[VertexId; 3]], a: FaceId, b: FaceId, key: EdgeKey) -> Option<FacePair> {
    let ta = &triangles[a.index()];
    let tb = &triangles[b.index()];

    let shared = ta.iter().filter(|v| tb.contains(v)).count();
    if shared != 2 {
        // Same three vertices: a duplicated face, not a neighbour.
        return None;
    }

    let on_edge = |v: &&VertexId| v.index() == key.0 || v.index() == key.1;
    let lone_a = *ta.iter().find(|v| !on_edge(v))?;
    let lone_b = *tb.iter().find(|v| !on_edge(v))?;

    Some(FacePair {
        a,
        b,
        shared: [VertexId::new(key.0), VertexId::new(key.1)],
        lone_a,
        lone_b,
    })
}
