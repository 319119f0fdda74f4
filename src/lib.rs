//! # Drapeflat
//!
//! Garment grading and pattern unfolding for draped 3D meshes.
//!
//! A garment technologist drapes a garment on a reference avatar, exports the
//! draped surface, and needs two things from it:
//!
//! - **Grading**: the same garment on a different avatar size or shape. Each
//!   garment vertex keeps its offset from the nearest body vertex.
//! - **Unfolding**: a flat 2D pattern reconstructed from the 3D drape, with
//!   every triangle's edge lengths preserved.
//!
//! ## Features
//!
//! - **Plain-text geometry I/O**: OBJ vertices, normals, texture coordinates
//!   and faces, with face records kept exactly as written
//! - **Nearest-vertex index**: k-d tree with deterministic tie breaking
//! - **Parallel grading**: per-vertex work spread over a thread pool
//! - **Unfolding**: circle-intersection placement propagated across the
//!   face adjacency graph, with a report of anything left unplaced
//!
//! ## Quick Start
//!
//! ```no_run
//! use drapeflat::prelude::*;
//!
//! let source = drapeflat::io::load("avatar_m.obj").unwrap();
//! let target = drapeflat::io::load("avatar_xl.obj").unwrap();
//! let garment = drapeflat::io::load("shirt_m.obj").unwrap();
//!
//! // Move the shirt onto the larger avatar
//! let graded = grade(&source, &target, &garment, &GradeOptions::default()).unwrap();
//!
//! // Flatten it
//! let report = flatten(&graded, &UnfoldOptions::default()).unwrap();
//! println!("{} vertices unplaced", report.unplaced.len());
//!
//! let pattern = report.points.to_placed_mesh(&graded).unwrap();
//! drapeflat::io::save(&pattern, "shirt_xl_pattern.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use drapeflat::prelude::*;
//! use nalgebra::Point3;
//!
//! let mesh = Mesh::from_triangles(
//!     vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.5),
//!     ],
//!     &[[0, 1, 2], [1, 3, 2]],
//! )
//! .unwrap();
//!
//! let graph = AdjacencyGraph::build(&mesh).unwrap();
//! assert_eq!(graph.len(), 1);
//!
//! let report = unfold(&mesh, &graph, &UnfoldOptions::default()).unwrap();
//! assert!(report.is_complete());
//! assert!(report.max_edge_error(&mesh).unwrap() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod source;
pub mod spatial;

pub use nalgebra;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use drapeflat::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::adjacency::{AdjacencyGraph, FacePair};
    pub use crate::algo::grade::{grade, GradeOptions};
    pub use crate::algo::unfold::{
        flatten, unfold, FlattenedPointMap, Traversal, UnfoldOptions, UnfoldReport,
    };
    pub use crate::algo::Progress;
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{Face, FaceCorner, FaceId, IndexBase, Mesh, VertexId};
    pub use crate::spatial::SpatialIndex;
}
