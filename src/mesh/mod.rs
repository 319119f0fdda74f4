//! Core mesh data structures.
//!
//! The primary type is [`Mesh`]: an owned, index-addressed triangle surface
//! with optional per-vertex normals and texture coordinates, as exported by
//! garment design tools.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! Meshes come from file I/O ([`crate::io`]) or from attribute arrays:
//!
//! ```
//! use drapeflat::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = Mesh::from_triangles(vertices, &[[0, 1, 2]]).unwrap();
//! assert_eq!(mesh.num_vertices(), 3);
//! ```

mod face;
mod index;
mod surface;

pub use face::{Face, FaceCorner, IndexBase};
pub use index::{FaceId, VertexId};
pub use surface::Mesh;
