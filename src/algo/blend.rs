//! Two-axis blending and the full displacement pipeline.
//!
//! The column-axis and row-axis extrusions are merged per vertex with an
//! anchored average: the column pass runs first and seeds every vertex, the
//! column-axis anchor is claimed, and the row pass then averages its value
//! into every unclaimed vertex. The anchor therefore keeps its unaveraged
//! column-axis value.
//!
//! # Example
//!
//! ```
//! use relief::algo::blend::compute_displacement;
//! use relief::algo::curve::Curve;
//! use relief::config::ReliefOptions;
//! use relief::mesh::{build_vertical_grid, VertexId};
//! use relief::patch::Patch;
//!
//! let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
//! let patch = Patch::from_mesh(&mesh).unwrap();
//! let options = ReliefOptions::default().with_height(10.0);
//!
//! // Without curves every interior vertex moves by the full height
//! let map = compute_displacement(&patch, &Curve::default(), &Curve::default(), &options).unwrap();
//! assert_eq!(map.get(VertexId::new(12)), 0.01);
//! assert_eq!(map.get(VertexId::new(0)), 0.0);
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::curve::{Curve, NormalizedCurve};
use super::extrude::calculate_extrusion;
use super::grid::{build_grid, Axis, Grid};
use super::progress::{Progress, Stage};
use crate::config::ReliefOptions;
use crate::error::Result;
use crate::mesh::VertexId;
use crate::patch::Patch;

/// Millimeters per meter.
const MM_PER_M: f64 = 1000.0;

/// Scalar displacement per patch vertex, in meters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplacementMap {
    values: Vec<f64>,
}

impl DisplacementMap {
    /// Create a map of zeros for `len` vertices.
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// Create a map from per-vertex values.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the map covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Displacement of a patch vertex.
    #[inline]
    pub fn get(&self, v: VertexId) -> f64 {
        self.values[v.index()]
    }

    /// Set the displacement of a patch vertex.
    #[inline]
    pub fn set(&mut self, v: VertexId, value: f64) {
        self.values[v.index()] = value;
    }

    /// Iterate over `(vertex, displacement)` pairs in vertex order.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &d)| (VertexId::new(i), d))
    }

    /// All values in vertex order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Largest absolute displacement.
    pub fn max_abs(&self) -> f64 {
        self.values.iter().fold(0.0, |m, d| m.max(d.abs()))
    }

    /// Re-key the map by the vertex ids of the mesh the patch was cut from.
    pub fn to_source(&self, patch: &Patch) -> Vec<SourceDisplacement> {
        self.iter()
            .map(|(v, displacement)| SourceDisplacement {
                vertex: patch.source_vertex(v),
                displacement,
            })
            .collect()
    }
}

/// Displacement of one vertex of the source mesh, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceDisplacement {
    /// Vertex in the source mesh.
    pub vertex: VertexId,

    /// Displacement along the vertex normal.
    pub displacement: f64,
}

/// Merge per-axis extrusions (millimeters) into a displacement map (meters).
///
/// The column pass completes before the row pass starts. Border cells are
/// left at zero.
pub fn blend_axes(grid: &Grid, column: &[f64], row: &[f64]) -> DisplacementMap {
    let mut map = DisplacementMap::zeros(grid.cells().len());
    let mut claimed = vec![false; grid.cells().len()];
    let anchor = grid.anchor(Axis::Column);

    for cell in grid.interior_cells() {
        let i = cell.vertex.index();
        if claimed[i] {
            continue;
        }
        map.values[i] = column[i] / MM_PER_M;
        if cell.vertex == anchor {
            claimed[i] = true;
        }
    }

    for cell in grid.interior_cells() {
        let i = cell.vertex.index();
        if claimed[i] {
            continue;
        }
        map.values[i] = (map.values[i] + row[i] / MM_PER_M) / 2.0;
    }

    map
}

/// Uniform displacement used when a curve is missing.
///
/// Every interior vertex moves by the full height, border vertices stay.
pub fn flat_displacement(grid: &Grid, height: f64) -> DisplacementMap {
    let mut map = DisplacementMap::zeros(grid.cells().len());
    for cell in grid.interior_cells() {
        map.set(cell.vertex, height / MM_PER_M);
    }
    map
}

/// Compute the displacement map of a patch from two curves.
///
/// `curve_x` drives the column axis and `curve_y` the row axis. If either
/// curve is empty the result is the flat fallback of
/// [`flat_displacement`]. Any error aborts the computation; no partial map is
/// returned.
pub fn compute_displacement(patch: &Patch, curve_x: &Curve, curve_y: &Curve, options: &ReliefOptions) -> Result<DisplacementMap> {
    compute_displacement_with_progress(patch, curve_x, curve_y, options, &Progress::none())
}

/// Compute the displacement map with progress reporting.
pub fn compute_displacement_with_progress(
    patch: &Patch,
    curve_x: &Curve,
    curve_y: &Curve,
    options: &ReliefOptions,
    progress: &Progress,
) -> Result<DisplacementMap> {
    options.validate()?;

    progress.stage(Stage::Grid);
    let grid = build_grid(patch, &options.grid)?;

    if curve_x.is_empty() || curve_y.is_empty() {
        info!(height = options.height, "curve missing, using flat displacement");
        progress.stage(Stage::Done);
        return Ok(flat_displacement(&grid, options.height));
    }

    let norm_x = NormalizedCurve::new(curve_x, options.height);
    let norm_y = NormalizedCurve::new(curve_y, options.height);
    debug!(
        x_segments = norm_x.segment_count(),
        y_segments = norm_y.segment_count(),
        x_max = norm_x.curve_max,
        y_max = norm_y.curve_max,
        "curves normalized"
    );

    progress.stage(Stage::ColumnAxis);
    let column = calculate_extrusion(&grid, &norm_x, Axis::Column)?;

    progress.stage(Stage::RowAxis);
    let row = calculate_extrusion(&grid, &norm_y, Axis::Row)?;

    progress.stage(Stage::Blend);
    let map = blend_axes(&grid, &column, &row);

    info!(
        vertices = map.len(),
        peak_m = map.max_abs(),
        "displacement computed"
    );
    progress.stage(Stage::Done);
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::curve::{ControlSegment, UvPoint};
    use crate::config::GridOptions;
    use crate::error::ReliefError;
    use crate::mesh::build_vertical_grid;
    use nalgebra::{Point3, Vector3};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn create_grid_patch(n: usize) -> Patch {
        let mesh = build_vertical_grid(n, n, 1.0, 10.0).unwrap();
        Patch::from_mesh(&mesh).unwrap()
    }

    fn create_hump() -> Curve {
        Curve::new(vec![ControlSegment::new(
            UvPoint::new(0.0, 1.0),
            UvPoint::new(0.2, 0.5),
            UvPoint::new(0.425, 0.5),
            UvPoint::new(0.625, 1.0),
        )])
    }

    #[test]
    fn test_flat_fallback_on_three_by_three() {
        let patch = create_grid_patch(3);
        let options = ReliefOptions::default().with_height(4.0);
        let map = compute_displacement(&patch, &Curve::default(), &create_hump(), &options).unwrap();

        for (v, d) in map.iter() {
            if patch.is_border(v) {
                assert_eq!(d, 0.0);
            } else {
                assert_eq!(d, 4.0 / 1000.0);
            }
        }
    }

    #[test]
    fn test_anchor_keeps_column_value() {
        let patch = create_grid_patch(5);
        let grid = build_grid(&patch, &GridOptions::default()).unwrap();
        let anchor = grid.anchor(Axis::Column);

        let column = vec![3.0; patch.num_vertices()];
        let row = vec![9.0; patch.num_vertices()];
        let map = blend_axes(&grid, &column, &row);

        assert_eq!(map.get(anchor), 0.003);
        for cell in grid.interior_cells().filter(|c| c.vertex != anchor) {
            assert!((map.get(cell.vertex) - 0.006).abs() < 1e-15);
        }
        for cell in grid.cells().iter().filter(|c| c.is_border) {
            assert_eq!(map.get(cell.vertex), 0.0);
        }
    }

    #[test]
    fn test_hump_on_five_by_five() {
        let patch = create_grid_patch(5);
        let options = ReliefOptions::default().with_height(10.0);
        let map = compute_displacement(&patch, &create_hump(), &create_hump(), &options).unwrap();

        let at = |i: usize, k: usize| map.get(VertexId::new(k * 5 + i));
        let h = 10.0 / 1000.0;
        assert!((at(2, 2) - 0.75 * h).abs() < 1e-12);
        assert!((at(1, 1) - 0.28125 * h).abs() < 1e-12);
        assert!((at(2, 1) - 0.515625 * h).abs() < 1e-12);
        assert!((at(1, 2) - 0.515625 * h).abs() < 1e-12);
        assert_eq!(at(0, 0), 0.0);
    }

    #[test]
    fn test_errors_abort_without_partial_map() {
        let positions: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                let a = i as f64 * std::f64::consts::FRAC_PI_4 + 0.1;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        let edges: Vec<[usize; 2]> = (0..8).map(|i| [i, (i + 1) % 8]).collect();
        let patch = Patch::new(positions, vec![Vector3::z(); 8], &edges, vec![true; 8]).unwrap();

        let result = compute_displacement(&patch, &create_hump(), &create_hump(), &ReliefOptions::default());
        assert!(matches!(result, Err(ReliefError::ShapeCoverage { .. })));
    }

    #[test]
    fn test_progress_reaches_end() {
        let calls = Arc::new(AtomicUsize::new(0));
        let last = Arc::new(AtomicUsize::new(0));
        let (c, l) = (calls.clone(), last.clone());
        let progress = Progress::new(move |current, _, _| {
            c.fetch_add(1, Ordering::SeqCst);
            l.store(current, Ordering::SeqCst);
        });

        let patch = create_grid_patch(5);
        compute_displacement_with_progress(&patch, &create_hump(), &create_hump(), &ReliefOptions::default(), &progress)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(last.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_map_serializes_as_list() {
        let map = DisplacementMap::from_values(vec![0.0, 0.5]);
        assert_eq!(serde_json::to_string(&map).unwrap(), "[0.0,0.5]");
    }
}
