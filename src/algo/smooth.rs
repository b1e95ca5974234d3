//! Laplacian smoothing of a displaced region.
//!
//! After a relief is applied, the patch is relaxed with a few uniform
//! Laplacian steps so the seams between grid cells soften. Only the vertices
//! of the region move; its rim (region vertices touching the rest of the
//! mesh or an open border) is held fixed by default.
//!
//! # Example
//!
//! ```
//! use relief::algo::smooth::{smooth_region, SmoothOptions};
//! use relief::mesh::{build_vertical_grid, VertexId};
//! use nalgebra::Point3;
//!
//! let mut mesh = build_vertical_grid(3, 3, 1.0, 0.0).unwrap();
//! mesh.set_position(VertexId::new(4), Point3::new(0.0, 1.0, 1.0));
//!
//! let region: Vec<VertexId> = mesh.vertex_ids().collect();
//! smooth_region(&mut mesh, &region, &SmoothOptions::default());
//! assert!(mesh.position(VertexId::new(4)).y < 0.1);
//! ```

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::mesh::{SurfaceMesh, VertexId};

use super::Progress;

/// Regions smaller than this are smoothed on the calling thread.
const PARALLEL_THRESHOLD: usize = 1024;

/// Options for region smoothing.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Number of smoothing iterations.
    pub iterations: usize,

    /// Smoothing factor (0.0 to 1.0).
    /// Higher values result in more aggressive smoothing.
    pub lambda: f64,

    /// Whether to hold the region's rim in place.
    pub preserve_boundary: bool,

    /// Whether to use parallel execution for large regions (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 5,
            lambda: 0.5,
            preserve_boundary: true,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Create options with the specified number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Create options with the specified lambda value.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda.clamp(0.0, 1.0);
        self
    }

    /// Create options that allow rim vertices to move.
    pub fn allow_boundary_movement(mut self) -> Self {
        self.preserve_boundary = false;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Smooth a vertex region of a mesh in place.
///
/// Vertices outside `region` never move, but they still pull on their
/// region neighbors.
pub fn smooth_region(mesh: &mut SurfaceMesh, region: &[VertexId], options: &SmoothOptions) {
    smooth_region_with_progress(mesh, region, options, &Progress::none());
}

/// Region smoothing with progress reporting.
pub fn smooth_region_with_progress(
    mesh: &mut SurfaceMesh,
    region: &[VertexId],
    options: &SmoothOptions,
    progress: &Progress,
) {
    if options.iterations == 0 || options.lambda == 0.0 || region.is_empty() {
        return;
    }

    let mut in_region = vec![false; mesh.num_vertices()];
    for &v in region {
        in_region[v.index()] = true;
    }

    // Vertices that actually move
    let movable: Vec<VertexId> = region
        .iter()
        .copied()
        .filter(|&v| {
            !options.preserve_boundary
                || !(mesh.is_border_vertex(v) || mesh.vertex_neighbors(v).any(|n| !in_region[n.index()]))
        })
        .collect();

    let parallel = options.parallel && movable.len() >= PARALLEL_THRESHOLD;
    debug!(
        region = region.len(),
        movable = movable.len(),
        iterations = options.iterations,
        parallel,
        "smoothing region"
    );

    for iter in 0..options.iterations {
        progress.report(iter, options.iterations, "Laplacian smoothing");

        let mesh_ref: &SurfaceMesh = mesh;
        let new_positions: Vec<Point3<f64>> = if parallel {
            movable
                .par_iter()
                .map(|&v| compute_laplacian_step(mesh_ref, v, options.lambda))
                .collect()
        } else {
            movable
                .iter()
                .map(|&v| compute_laplacian_step(mesh_ref, v, options.lambda))
                .collect()
        };

        for (&v, pos) in movable.iter().zip(new_positions) {
            mesh.set_position(v, pos);
        }
    }
    progress.report(options.iterations, options.iterations, "Laplacian smoothing");
}

/// Compute one Laplacian smoothing step for a vertex using uniform weights.
fn compute_laplacian_step(mesh: &SurfaceMesh, v: VertexId, lambda: f64) -> Point3<f64> {
    let pos = mesh.position(v);

    let mut centroid = Vector3::zeros();
    let mut count = 0;
    for neighbor in mesh.vertex_neighbors(v) {
        centroid += mesh.position(neighbor).coords;
        count += 1;
    }

    if count == 0 {
        return *pos;
    }

    centroid /= count as f64;
    Point3::from(pos.coords + lambda * (centroid - pos.coords))
}
