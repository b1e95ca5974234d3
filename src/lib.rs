//! # Relief
//!
//! Curve-driven relief extrusion for mesh patches.
//!
//! Relief indexes the vertices of a roughly planar patch into a grid of
//! rows and columns, walks that grid along two axes with user-drawn Bezier
//! profiles, and blends the two passes into a per-vertex displacement that
//! pushes the patch out along its normals.
//!
//! ## Features
//!
//! - **Shape grid**: quadrant classification, angular ordering of the shape
//!   loop, and row/column indexing with enclosing spans per cell
//! - **Curve profiles**: the curve editor's JSON format, normalized to a target
//!   height and evaluated as cubic Bezier segments
//! - **Anchored blending**: column and row extrusions merged into one map
//! - **Mesh I/O**: STL and PLY, with polygon faces kept in PLY
//! - **Smoothing**: region Laplacian relaxation after displacement
//!
//! ## Quick Start
//!
//! ```
//! use relief::prelude::*;
//!
//! // A 5 x 5 vertical patch, 10 m in front of the origin
//! let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
//! let patch = Patch::from_mesh(&mesh).unwrap();
//!
//! // One hump-shaped segment for both axes
//! let hump = Curve::new(vec![ControlSegment::new(
//!     UvPoint::new(0.0, 1.0),
//!     UvPoint::new(0.2, 0.5),
//!     UvPoint::new(0.425, 0.5),
//!     UvPoint::new(0.625, 1.0),
//! )]);
//!
//! let options = ReliefOptions::default().with_height(10.0);
//! let map = compute_displacement(&patch, &hump, &hump, &options).unwrap();
//!
//! // The center rises 7.5 mm, the rim stays put
//! assert!((map.get(VertexId::new(12)) - 0.0075).abs() < 1e-12);
//! assert_eq!(map.get(VertexId::new(0)), 0.0);
//! ```
//!
//! ## Working With Files
//!
//! ```no_run
//! use relief::prelude::*;
//!
//! let mut mesh = relief::io::load("patch.ply").unwrap();
//! let patch = Patch::from_mesh(&mesh).unwrap();
//!
//! let curve = Curve::from_json(&std::fs::read_to_string("profile.json").unwrap()).unwrap();
//! let options = ReliefOptions::default();
//! let map = compute_displacement(&patch, &curve, &curve, &options).unwrap();
//!
//! apply_and_smooth(&mut mesh, &patch, &map, options.smooth_amount).unwrap();
//! relief::io::save(&mesh, "relief.stl").unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod error;
pub mod io;
pub mod mesh;
pub mod patch;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use relief::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::apply::{apply_and_smooth, apply_displacement};
    pub use crate::algo::blend::{compute_displacement, compute_displacement_with_progress, DisplacementMap, SourceDisplacement};
    pub use crate::algo::curve::{ControlSegment, Curve, UvPoint};
    pub use crate::algo::grid::{build_grid, Axis, Grid, GridCell};
    pub use crate::algo::Progress;
    pub use crate::config::{GridOptions, ReliefOptions};
    pub use crate::error::{ReliefError, Result};
    pub use crate::mesh::{build_from_polygons, build_from_triangles, build_vertical_grid, SurfaceMesh, VertexId};
    pub use crate::patch::Patch;
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_pipeline_from_mesh_to_moved_mesh() {
        let mut mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
        let patch = Patch::from_mesh(&mesh).unwrap();
        let options = ReliefOptions::default().with_height(10.0);

        let map = compute_displacement(&patch, &Curve::default(), &Curve::default(), &options).unwrap();
        let moved = apply_displacement(&mut mesh, &patch, &map).unwrap();

        // Nine interior vertices of a 5 x 5 grid
        assert_eq!(moved, 9);
        let center = mesh.position(VertexId::new(12));
        assert!((center.y - 10.01).abs() < 1e-12);
        assert_eq!(mesh.position(VertexId::new(0)).y, 10.0);
    }
}
