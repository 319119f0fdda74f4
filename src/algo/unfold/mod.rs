//! Edge-length preserving unfolding of a draped surface.
//!
//! Unfolding computes a 2D pattern from a 3D triangle mesh. A seed face is
//! laid flat in its own plane; every other vertex is then placed from a face
//! pair whose shared edge and opposite vertex are already flat. The new
//! vertex sits at the intersection of two circles centred on the shared
//! edge's endpoints, with the 3D distances to them as radii. Of the two
//! intersections, the one farther from the neighbouring face's lone vertex
//! is taken, so the new face folds open instead of back over its neighbour.
//!
//! Every face reached this way keeps its three edge lengths. Vertices that
//! cannot be reached from the seed face (other components, or behind
//! degenerate geometry) stay unplaced and are listed in the
//! [`UnfoldReport`].
//!
//! # Traversal
//!
//! Placements never change once made, so the pattern depends on the order in
//! which pairs are visited:
//!
//! - [`Traversal::BreadthFirst`] propagates outward from the seed face. A
//!   pair is revisited whenever one of its vertices gets placed, so every
//!   reachable vertex is placed regardless of how the pairs are listed.
//! - [`Traversal::Rounds`] scans all pairs in adjacency order, round after
//!   round, until a round places nothing.
//!
//! Both are bounded by the number of adjacency pairs.
//!
//! # Example
//!
//! ```no_run
//! use drapeflat::algo::unfold::{flatten, UnfoldOptions};
//! use drapeflat::io;
//!
//! let drape = io::load("drape.obj").unwrap();
//! let report = flatten(&drape, &UnfoldOptions::default()).unwrap();
//!
//! if report.is_complete() {
//!     io::save(&report.points.to_mesh(&drape).unwrap(), "pattern.obj").unwrap();
//! }
//! ```

mod circle;
mod points;
mod seed;

pub use circle::{circle_intersection, Intersection};
pub use points::{FlattenedPointMap, Observer};
pub use seed::project_face;

use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, Mesh, VertexId};

use super::adjacency::{AdjacencyGraph, FacePair};
use super::Progress;

/// Order in which face pairs are visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    /// Worklist propagation outward from the seed face.
    #[default]
    BreadthFirst,
    /// Repeated full scans over the pair list.
    Rounds,
}

/// Options for unfolding.
#[derive(Debug, Clone, Default)]
pub struct UnfoldOptions {
    /// Face laid flat first. Default: the first face with nonzero area
    /// among the faces of the adjacency pairs, then among all faces.
    pub seed_face: Option<usize>,

    /// Pair visiting order.
    pub traversal: Traversal,

    /// Upper bound on rounds (breadth-first layers or full scans). The
    /// number of adjacency pairs is always an upper bound as well.
    pub max_rounds: Option<usize>,
}

impl UnfoldOptions {
    /// Start from the given face.
    pub fn with_seed_face(mut self, face: usize) -> Self {
        self.seed_face = Some(face);
        self
    }

    /// Set the traversal order.
    pub fn with_traversal(mut self, traversal: Traversal) -> Self {
        self.traversal = traversal;
        self
    }

    /// Cap the number of rounds.
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = Some(rounds);
        self
    }
}

/// Result of an unfolding.
#[derive(Debug, Clone)]
pub struct UnfoldReport {
    /// Placed 2D positions.
    pub points: FlattenedPointMap,
    /// Vertices that were never placed, in ascending order.
    pub unplaced: Vec<VertexId>,
    /// The face laid flat first.
    pub seed_face: FaceId,
    /// Rounds run (breadth-first layers or full scans).
    pub rounds: usize,
    /// Pairs skipped at least once because their circles did not intersect.
    pub skipped_degenerate: usize,
    /// Edges shared by more than two faces in the adjacency graph.
    pub non_manifold_edges: usize,
    /// True if the round cap stopped the traversal while unsettled pairs
    /// were still pending.
    pub truncated: bool,
}

impl UnfoldReport {
    /// True if every vertex was placed.
    pub fn is_complete(&self) -> bool {
        self.unplaced.is_empty()
    }

    /// Largest 3D-to-2D edge length deviation over fully placed faces.
    pub fn max_edge_error(&self, mesh: &Mesh) -> Result<f64> {
        self.points.max_edge_error(mesh)
    }
}

/// Unfold a triangle mesh.
///
/// # Errors
///
/// - [`MeshError::UnsupportedTopology`] if a face is not a triangle.
/// - [`MeshError::InvalidParameter`] if the mesh has no faces, the seed face
///   is out of range, or `graph` was built from a different mesh.
/// - [`MeshError::DegenerateFace`] if the seed face has zero area.
///
/// Unplaced vertices are not an error; see [`UnfoldReport::unplaced`].
pub fn unfold(mesh: &Mesh, graph: &AdjacencyGraph, options: &UnfoldOptions) -> Result<UnfoldReport> {
    unfold_with_progress(mesh, graph, options, &Progress::none())
}

/// Unfold with progress reporting. See [`unfold`].
pub fn unfold_with_progress(
    mesh: &Mesh,
    graph: &AdjacencyGraph,
    options: &UnfoldOptions,
    progress: &Progress,
) -> Result<UnfoldReport> {
    unfold_observed(mesh, graph, options, progress, &Observer::none())
}

/// Unfold with progress reporting and an observer that sees the point map
/// after every placement. See [`unfold`].
pub fn unfold_observed(
    mesh: &Mesh,
    graph: &AdjacencyGraph,
    options: &UnfoldOptions,
    progress: &Progress,
    observer: &Observer,
) -> Result<UnfoldReport> {
    let triangles = mesh.triangles()?;
    if triangles.is_empty() {
        return Err(MeshError::invalid_param("mesh", 0, "has no faces to unfold"));
    }
    if graph.num_faces() != triangles.len() {
        return Err(MeshError::invalid_param(
            "graph",
            graph.num_faces(),
            "face count does not match the mesh",
        ));
    }

    let seed = match options.seed_face {
        Some(f) if f >= triangles.len() => {
            return Err(MeshError::invalid_param("seed_face", f, "out of range"));
        }
        Some(f) => FaceId::new(f),
        None => default_seed(mesh, graph),
    };

    let mut points = FlattenedPointMap::new(mesh.num_vertices());
    let seed_triangle = triangles[seed.index()];
    for (v, p) in seed_triangle.iter().zip(project_face(mesh, seed)?) {
        points.place(*v, p);
    }

    let cap = options
        .max_rounds
        .map_or(graph.len(), |m| m.min(graph.len()));

    let mut unfolder = Unfolder {
        mesh,
        pairs: graph.pairs(),
        points,
        degenerate: vec![false; graph.len()],
        truncated: false,
        progress,
        observer,
    };
    unfolder.notify();

    let rounds = match options.traversal {
        Traversal::BreadthFirst => unfolder.breadth_first(&seed_triangle, cap),
        Traversal::Rounds => unfolder.rounds(cap),
    };

    let skipped_degenerate = unfolder.degenerate.iter().filter(|&&d| d).count();
    let truncated = unfolder.truncated;
    let points = unfolder.points;
    let unplaced = points.unplaced();

    log::debug!(
        "unfold: seed face {}, {} of {} vertices placed in {} rounds",
        seed,
        points.placed_count(),
        points.len(),
        rounds
    );
    if !unplaced.is_empty() {
        log::warn!(
            "{} vertices could not be reached from seed face {}",
            unplaced.len(),
            seed
        );
    }

    Ok(UnfoldReport {
        points,
        unplaced,
        seed_face: seed,
        rounds,
        skipped_degenerate,
        non_manifold_edges: graph.non_manifold_edges().len(),
        truncated,
    })
}

/// The first face with nonzero area, trying the faces of the adjacency
/// pairs in pair order before the rest. If every face is flat, the first
/// candidate is returned and fails later as a degenerate seed.
fn default_seed(mesh: &Mesh, graph: &AdjacencyGraph) -> FaceId {
    let mut candidates = graph
        .pairs()
        .iter()
        .flat_map(|p| [p.a, p.b])
        .chain(mesh.face_ids());
    let first = graph.pairs().first().map_or(FaceId::new(0), |p| p.a);
    candidates
        .find(|&f| matches!(mesh.face_normal(f), Ok(Some(_))))
        .unwrap_or(first)
}

/// Build the adjacency graph of `mesh` and unfold it.
pub fn flatten(mesh: &Mesh, options: &UnfoldOptions) -> Result<UnfoldReport> {
    let graph = AdjacencyGraph::build(mesh)?;
    unfold(mesh, &graph, options)
}

/// What visiting a pair did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The lone vertex was placed.
    Placed(VertexId),
    /// Both lone vertices were already placed.
    Settled,
    /// A prerequisite vertex is still unplaced.
    Waiting,
    /// The circles did not intersect.
    Degenerate,
}

struct Unfolder<'a> {
    mesh: &'a Mesh,
    pairs: &'a [FacePair],
    points: FlattenedPointMap,
    degenerate: Vec<bool>,
    truncated: bool,
    progress: &'a Progress,
    observer: &'a Observer,
}

impl Unfolder<'_> {
    fn notify(&self) {
        self.observer.notify(&self.points);
        self.progress
            .report(self.points.placed_count(), self.points.len(), "Unfolding");
    }

    fn is_settled(&self, i: usize) -> bool {
        let pair = &self.pairs[i];
        self.points.is_placed(pair.lone_a) && self.points.is_placed(pair.lone_b)
    }

    fn step(&mut self, i: usize) -> Step {
        let pair = self.pairs[i];
        let (c0, c1) = match (self.points.get(pair.shared[0]), self.points.get(pair.shared[1])) {
            (Some(c0), Some(c1)) => (c0, c1),
            _ => return Step::Waiting,
        };

        let (target, known) = match (self.points.get(pair.lone_a), self.points.get(pair.lone_b)) {
            (Some(_), Some(_)) => return Step::Settled,
            (None, None) => return Step::Waiting,
            (Some(k), None) => (pair.lone_b, k),
            (None, Some(k)) => (pair.lone_a, k),
        };

        let r0 = self.mesh.edge_length(target, pair.shared[0]);
        let r1 = self.mesh.edge_length(target, pair.shared[1]);

        match circle_intersection(&c0, r0, &c1, r1).farthest_from(&known) {
            Some(p) => {
                self.points.place(target, p);
                self.notify();
                Step::Placed(target)
            }
            None => {
                log::trace!("pair {} ({} / {}): no circle intersection", i, pair.a, pair.b);
                self.degenerate[i] = true;
                Step::Degenerate
            }
        }
    }

    /// Worklist propagation. Each layer holds the pairs touched by the
    /// previous layer's placements.
    fn breadth_first(&mut self, seed: &[VertexId; 3], cap: usize) -> usize {
        let mut vertex_pairs = vec![Vec::new(); self.points.len()];
        for (i, pair) in self.pairs.iter().enumerate() {
            for v in pair.vertices() {
                vertex_pairs[v.index()].push(i);
            }
        }

        let mut queued = vec![false; self.pairs.len()];
        let mut current = Vec::new();
        for v in seed {
            for &i in &vertex_pairs[v.index()] {
                if !queued[i] {
                    queued[i] = true;
                    current.push(i);
                }
            }
        }

        let mut rounds = 0;
        while !current.is_empty() {
            if rounds == cap {
                let pending = current.iter().filter(|&&i| !self.is_settled(i)).count();
                if pending > 0 {
                    log::warn!("unfolding stopped after {} rounds with {} pairs pending", rounds, pending);
                    self.truncated = true;
                }
                break;
            }
            rounds += 1;

            let mut next = Vec::new();
            for i in current {
                queued[i] = false;
                if let Step::Placed(v) = self.step(i) {
                    for &j in &vertex_pairs[v.index()] {
                        if !queued[j] && !self.is_settled(j) {
                            queued[j] = true;
                            next.push(j);
                        }
                    }
                }
            }
            log::trace!("round {}: {} pairs queued", rounds, next.len());
            current = next;
        }
        rounds
    }

    /// Full scans over the pair list until one places nothing.
    fn rounds(&mut self, cap: usize) -> usize {
        let mut rounds = 0;
        loop {
            if (0..self.pairs.len()).all(|i| self.is_settled(i)) {
                break;
            }
            if rounds == cap {
                log::warn!("unfolding stopped after {} rounds", rounds);
                self.truncated = true;
                break;
            }
            rounds += 1;

            let mut placed = 0;
            for i in 0..self.pairs.len() {
                if let Step::Placed(_) = self.step(i) {
                    placed += 1;
                }
            }
            log::trace!("round {}: {} vertices placed", rounds, placed);
            if placed == 0 {
                break;
            }
        }
        rounds
    }
}
