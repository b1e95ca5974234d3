//! Error types for relief.
//!
//! This module defines all error types used throughout the library. Every
//! error aborts the whole displacement computation; no partial map is ever
//! returned to the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`ReliefError`].
pub type Result<T> = std::result::Result<T, ReliefError>;

/// Errors that can occur while building a grid or computing displacements.
#[derive(Error, Debug)]
pub enum ReliefError {
    /// The patch (or mesh) has no vertices to work with.
    #[error("patch has no vertices")]
    EmptyPatch,

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// The shape occupies all four planar quadrants around the origin.
    #[error("shape covers all four quadrants ({quadrants}); no angular gap to start the grid from")]
    ShapeCoverage {
        /// Human-readable list of occupied quadrants.
        quadrants: String,
    },

    /// The angular sort found no discontinuity in the boundary loop.
    #[error("no angular gap found among {vertices} boundary vertices")]
    NoGapFound {
        /// Number of vertices that were sorted.
        vertices: usize,
    },

    /// An interior cell could not be placed inside the grid.
    #[error("malformed grid at vertex {vertex} (neighbors {neighbors:?}): {reason}")]
    MalformedGrid {
        /// The offending vertex index.
        vertex: usize,
        /// Indices of the vertex's neighbors, for diagnosis.
        neighbors: Vec<usize>,
        /// What went wrong.
        reason: String,
    },

    /// A face or edge references an invalid vertex index.
    #[error("element {element} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face or edge index.
        element: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// An edge has more than two incident faces.
    #[error("edge ({v0}, {v1}) has more than two incident faces")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A curve or options document is not valid JSON of the expected shape.
    #[error("failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

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

impl ReliefError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        ReliefError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create a malformed grid error for a vertex.
    pub fn malformed(vertex: usize, neighbors: Vec<usize>, reason: impl Into<String>) -> Self {
        ReliefError::MalformedGrid {
            vertex,
            neighbors,
            reason: reason.into(),
        }
    }
}
