//! Error types for drapeflat.
//!
//! This module defines all error types used throughout the library.
//!
//! Geometric degeneracies met while unfolding (disjoint or nested circles)
//! are not errors. They surface as
//! [`Intersection::None`](crate::algo::unfold::Intersection) and, at the end,
//! as the list of vertices that were never placed.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A geometry record could not be parsed.
    #[error("line {line}: {message}")]
    Format {
        /// 1-based line number of the offending record.
        line: usize,
        /// What was wrong with it.
        message: String,
    },

    /// A face is not a triangle.
    #[error("face {face} has {corners} corners, only triangles are supported")]
    UnsupportedTopology {
        /// The face index.
        face: usize,
        /// Number of corners the face actually has.
        corners: usize,
    },

    /// A spatial index was requested over an empty point set.
    #[error("cannot index an empty point set")]
    EmptyInput,

    /// Source and target avatars do not share a vertex layout.
    #[error("avatar vertex counts differ: source has {source_vertices}, target has {target_vertices}")]
    TopologyMismatch {
        /// Vertex count of the source avatar.
        source_vertices: usize,
        /// Vertex count of the target avatar.
        target_vertices: usize,
    },

    /// An edge has more than two incident faces.
    #[error("edge ({v0}, {v1}) is shared by {faces} faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
        /// Number of faces indexing the edge.
        faces: usize,
    },

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index (as written in the face record).
        vertex: usize,
    },

    /// A face has zero area and cannot define a plane.
    #[error("face {face} is degenerate (zero area)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// A flattened mesh was requested while some vertices are unplaced.
    #[error("{unplaced} vertices have no flattened position")]
    Incomplete {
        /// Number of unplaced vertices.
        unplaced: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// A garment catalog or blob store failed.
    #[error("garment source: {0}")]
    Source(String),

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a format error for a 1-based line number.
    pub fn format(line: usize, message: impl Into<String>) -> Self {
        MeshError::Format {
            line,
            message: message.into(),
        }
    }
}
