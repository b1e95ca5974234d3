//! Relief algorithms.
//!
//! The pipeline runs leaves first:
//!
//! - **Quadrants** ([`quadrant`]): planar quadrant split and shape extremes
//! - **Angular order** ([`angular`]): the shape loop sorted by polar angle
//! - **Loop diagnostics** ([`border`]): open ends and shortcut chords
//! - **Grid** ([`grid`]): row/column indexing and enclosing spans
//! - **Curves** ([`curve`]): host curve format, normalization, Bezier evaluation
//! - **Extrusion** ([`extrude`]): per-axis displacement along a curve
//! - **Blend** ([`blend`]): anchored two-axis merge and the pipeline entry point
//! - **Apply** ([`apply`], [`smooth`]): moving the mesh and relaxing the patch

pub mod angular;
pub mod apply;
pub mod blend;
pub mod border;
pub mod curve;
pub mod extrude;
pub mod grid;
pub mod progress;
pub mod quadrant;
pub mod smooth;

pub use progress::{Progress, Stage};
