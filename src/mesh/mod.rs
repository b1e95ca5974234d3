//! Core mesh data structures.
//!
//! This module provides the polygon surface mesh that relief patches are cut
//! from, together with its construction helpers.
//!
//! # Overview
//!
//! The primary type is [`SurfaceMesh`], which stores vertices, polygon faces,
//! and undirected edges with their incident face counts. Border detection and
//! neighbor queries are answered from a compact adjacency table built once at
//! construction time.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`FaceId`] - Identifies a face
//!
//! # Construction
//!
//! Meshes are typically constructed from file I/O or from face-vertex lists:
//!
//! ```
//! use relief::mesh::{SurfaceMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: SurfaceMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_edges(), 3);
//! ```

mod builder;
mod index;
mod surface;

pub use builder::{
    build_from_edges, build_from_polygons, build_from_quads, build_from_triangles,
    build_vertical_grid, to_face_vertex,
};
pub use index::{EdgeId, FaceId, VertexId};
pub use surface::{Edge, SurfaceMesh, Vertex};
