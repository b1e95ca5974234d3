//! Row/column grid construction over a patch.
//!
//! Every patch vertex is given a `(row, column)` coordinate:
//!
//! - **Columns** come from the angular order of the shape loop. Boundary
//!   vertices at the same polar angle share a column; interior vertices
//!   reached by the flood fill take the nearest boundary column by angle.
//! - **Rows** are the rank of a vertex's height: vertices sorted by
//!   descending Z, with equal heights sharing a row.
//!
//! Boundary edges then bound every interior cell: walking down its column,
//! the cell sits between two boundary rows (`column_rows`), and walking along
//! its row it sits between two boundary columns (`row_columns`). These spans
//! are the parametric domains the extrusion curves are evaluated over.
//!
//! # Example
//!
//! ```
//! use relief::algo::grid::build_grid;
//! use relief::config::GridOptions;
//! use relief::mesh::{build_vertical_grid, VertexId};
//! use relief::patch::Patch;
//!
//! let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
//! let patch = Patch::from_mesh(&mesh).unwrap();
//! let grid = build_grid(&patch, &GridOptions::default()).unwrap();
//!
//! assert_eq!((grid.column_count(), grid.row_count()), (5, 5));
//! let centre = grid.cell(VertexId::new(12));
//! assert_eq!(centre.column_rows, Some((0, 4)));
//! assert_eq!(centre.row_columns, Some((0, 4)));
//! ```

use std::collections::VecDeque;

use serde::Serialize;
use tracing::{debug, info};

use super::angular::{polar_angle, sort_border, AngularSequence};
use super::border::{inspect_loop, LoopReport};
use super::quadrant::{shape_limits, ShapeLimits};
use crate::config::GridOptions;
use crate::error::{ReliefError, Result};
use crate::mesh::VertexId;
use crate::patch::Patch;

/// One of the two traversal axes of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Walks down each column: position is the row, span is `column_rows`.
    Column,
    /// Walks along each row: position is the column, span is `row_columns`.
    Row,
}

/// Grid coordinates and parametric spans of one patch vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridCell {
    /// Patch vertex this cell belongs to.
    pub vertex: VertexId,
    /// Column index, in angular order of the shape loop.
    pub column: usize,
    /// Row index, top row first.
    pub row: usize,
    /// Whether the vertex lies on the shape loop.
    pub is_border: bool,

    /// Boundary rows enclosing this cell along its column.
    pub column_rows: Option<(usize, usize)>,

    /// Boundary columns enclosing this cell along its row.
    pub row_columns: Option<(usize, usize)>,
}

impl GridCell {
    /// The cell's index along an axis.
    #[inline]
    pub fn position(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.row,
            Axis::Row => self.column,
        }
    }

    /// The cell's enclosing span along an axis.
    #[inline]
    pub fn span(&self, axis: Axis) -> Option<(usize, usize)> {
        match axis {
            Axis::Column => self.column_rows,
            Axis::Row => self.row_columns,
        }
    }
}

/// The row/column indexing of a patch.
#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<GridCell>,
    column_count: usize,
    row_count: usize,
    middle_column: usize,
    middle_row: usize,
    column_anchor: VertexId,
    row_anchor: VertexId,
    limits: ShapeLimits,
    sequence: AngularSequence,
    loop_report: LoopReport,
}

impl Grid {
    // ==================== Accessors ====================

    /// All cells, indexed by patch vertex.
    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    /// The cell of a patch vertex.
    #[inline]
    pub fn cell(&self, v: VertexId) -> &GridCell {
        &self.cells[v.index()]
    }

    /// Iterate over non-border cells.
    pub fn interior_cells(&self) -> impl Iterator<Item = &GridCell> + '_ {
        self.cells.iter().filter(|c| !c.is_border)
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// The middle column.
    pub fn middle_column(&self) -> usize {
        self.middle_column
    }

    /// The middle row.
    pub fn middle_row(&self) -> usize {
        self.middle_row
    }

    /// The middle index along an axis (middle row when walking columns).
    pub fn middle(&self, axis: Axis) -> usize {
        match axis {
            Axis::Column => self.middle_row,
            Axis::Row => self.middle_column,
        }
    }

    /// The anchor vertex of an axis, evaluated without tapering.
    pub fn anchor(&self, axis: Axis) -> VertexId {
        match axis {
            Axis::Column => self.column_anchor,
            Axis::Row => self.row_anchor,
        }
    }

    /// The extremal vertices the traversal was seeded from.
    pub fn limits(&self) -> &ShapeLimits {
        &self.limits
    }

    /// The shape loop in angular order.
    pub fn sequence(&self) -> &AngularSequence {
        &self.sequence
    }

    /// Loop diagnostics gathered while building.
    pub fn loop_report(&self) -> &LoopReport {
        &self.loop_report
    }
}

/// `round(count / 2)` with ties to even, clamped to the last index.
fn middle_index(count: usize) -> usize {
    let half = count / 2;
    let rounded = if count % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    };
    rounded.min(count.saturating_sub(1))
}

/// Index of the column angle nearest to `angle`; ties go to the lower column.
fn nearest_column(column_angles: &[f64], angle: f64) -> usize {
    let i = column_angles.partition_point(|&c| c < angle);
    if i == 0 {
        return 0;
    }
    if i == column_angles.len() {
        return i - 1;
    }
    if angle - column_angles[i - 1] <= column_angles[i] - angle {
        i - 1
    } else {
        i
    }
}

/// Candidate bounds collected for one cell along one axis.
#[derive(Debug, Clone, Copy, Default)]
struct Bounds {
    below: Option<usize>,
    above: Option<usize>,
}

impl Bounds {
    fn record(&mut self, own: usize, candidate: usize) {
        if candidate < own {
            self.below = Some(self.below.map_or(candidate, |b| b.max(candidate)));
        } else if candidate > own {
            self.above = Some(self.above.map_or(candidate, |a| a.min(candidate)));
        }
    }
}

/// Build the grid of a patch.
///
/// # Errors
/// * [`ReliefError::EmptyPatch`] for a patch without vertices
/// * [`ReliefError::ShapeCoverage`] if the patch spans all four quadrants
/// * [`ReliefError::NoGapFound`] if the shape loop has no angular gap
/// * [`ReliefError::MalformedGrid`] if a vertex is unreachable from the loop
///   or an interior cell is missing a bound on either side
pub fn build_grid(patch: &Patch, options: &GridOptions) -> Result<Grid> {
    options.validate()?;

    let limits = shape_limits(patch)?;
    let loop_report = inspect_loop(patch);
    if loop_report.border_vertices == 0 {
        return Err(ReliefError::invalid_param("border", 0, "patch has no border vertices"));
    }
    let sequence = sort_border(patch, options.gap_offset)?;

    let n = patch.num_vertices();

    // Columns along the shape loop
    let mut column = vec![0usize; n];
    let mut column_angles: Vec<f64> = Vec::new();
    for (&v, &angle) in sequence.vertices.iter().zip(&sequence.angles) {
        let opens = column_angles
            .last()
            .map_or(true, |&first| angle - first > options.column_tolerance);
        if opens {
            column_angles.push(angle);
        }
        column[v.index()] = column_angles.len() - 1;
    }

    // Flood fill from the extremes, then around the loop
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();
    let seeds = [limits.shape_min, limits.shape_max]
        .into_iter()
        .chain(sequence.vertices.iter().copied());
    for seed in seeds {
        if visited[seed.index()] {
            continue;
        }
        visited[seed.index()] = true;
        queue.push_back(seed);

        while let Some(v) = queue.pop_front() {
            if !patch.is_border(v) {
                let angle = sequence.unwrap_angle(polar_angle(patch.position(v)));
                column[v.index()] = nearest_column(&column_angles, angle);
            }
            for nb in patch.neighbors(v) {
                if !visited[nb.index()] {
                    visited[nb.index()] = true;
                    queue.push_back(nb);
                }
            }
        }
    }
    if let Some(i) = visited.iter().position(|&seen| !seen) {
        let v = VertexId::new(i);
        return Err(ReliefError::malformed(
            i,
            patch.neighbor_indices(v),
            "vertex is not connected to the shape loop",
        ));
    }

    // Rows by descending height
    let mut by_height: Vec<VertexId> = patch.vertex_ids().collect();
    by_height.sort_by(|&a, &b| {
        patch.position(b).z.total_cmp(&patch.position(a).z).then(a.cmp(&b))
    });
    let mut row = vec![0usize; n];
    let mut row_count = 0usize;
    let mut row_top = f64::INFINITY;
    for v in by_height {
        let z = patch.position(v).z;
        if row_count == 0 || row_top - z > options.row_tolerance {
            row_count += 1;
            row_top = z;
        }
        row[v.index()] = row_count - 1;
    }
    let column_count = column_angles.len();

    // Interior vertices bucketed by column and by row
    let mut in_column: Vec<Vec<VertexId>> = vec![Vec::new(); column_count];
    let mut in_row: Vec<Vec<VertexId>> = vec![Vec::new(); row_count];
    for v in patch.vertex_ids().filter(|&v| !patch.is_border(v)) {
        in_column[column[v.index()]].push(v);
        in_row[row[v.index()]].push(v);
    }

    // Bounds from boundary edges
    let mut row_bounds = vec![Bounds::default(); n];
    let mut column_bounds = vec![Bounds::default(); n];
    for [a, b] in patch.border_edges() {
        if loop_report.is_chord(a, b) {
            continue;
        }

        let (first, second) = if column[a.index()] <= column[b.index()] { (a, b) } else { (b, a) };
        let (c0, c1) = (column[first.index()], column[second.index()]);
        for bucket in &in_column[c0..=c1] {
            for &v in bucket {
                let c = column[v.index()];
                let nearer = if c - c0 <= c1 - c { first } else { second };
                row_bounds[v.index()].record(row[v.index()], row[nearer.index()]);
            }
        }

        let (first, second) = if row[a.index()] <= row[b.index()] { (a, b) } else { (b, a) };
        let (r0, r1) = (row[first.index()], row[second.index()]);
        for bucket in &in_row[r0..=r1] {
            for &v in bucket {
                let r = row[v.index()];
                let nearer = if r - r0 <= r1 - r { first } else { second };
                column_bounds[v.index()].record(column[v.index()], column[nearer.index()]);
            }
        }
    }

    let mut cells = Vec::with_capacity(n);
    for v in patch.vertex_ids() {
        let i = v.index();
        let is_border = patch.is_border(v);
        let (column_rows, row_columns) = if is_border {
            (None, None)
        } else {
            let missing = |what: &str| {
                ReliefError::malformed(
                    i,
                    patch.neighbor_indices(v),
                    format!("no boundary {} at row {}, column {}", what, row[i], column[i]),
                )
            };
            let rb = row_bounds[i];
            let cb = column_bounds[i];
            (
                Some((
                    rb.below.ok_or_else(|| missing("row above"))?,
                    rb.above.ok_or_else(|| missing("row below"))?,
                )),
                Some((
                    cb.below.ok_or_else(|| missing("column before"))?,
                    cb.above.ok_or_else(|| missing("column after"))?,
                )),
            )
        };
        cells.push(GridCell {
            vertex: v,
            column: column[i],
            row: row[i],
            is_border,
            column_rows,
            row_columns,
        });
    }

    let middle_column = middle_index(column_count);
    let middle_row = middle_index(row_count);
    let column_anchor = find_anchor(&cells, |c| c.row == middle_row, |c| c.column.abs_diff(middle_column))?;
    let row_anchor = find_anchor(&cells, |c| c.column == middle_column, |c| c.row.abs_diff(middle_row))?;

    info!(
        vertices = n,
        columns = column_count,
        rows = row_count,
        middle_column,
        middle_row,
        "grid built"
    );
    debug!(column_anchor = %column_anchor, row_anchor = %row_anchor, "grid anchors");

    Ok(Grid {
        cells,
        column_count,
        row_count,
        middle_column,
        middle_row,
        column_anchor,
        row_anchor,
        limits,
        sequence,
        loop_report,
    })
}

/// Pick the anchor on a middle line: interior cells before border cells,
/// then smallest distance to the crossing middle, then lowest index.
fn find_anchor<F, D>(cells: &[GridCell], on_line: F, distance: D) -> Result<VertexId>
where
    F: Fn(&GridCell) -> bool,
    D: Fn(&GridCell) -> usize,
{
    cells
        .iter()
        .filter(|c| on_line(c))
        .min_by_key(|c| (c.is_border, distance(c), c.vertex))
        .map(|c| c.vertex)
        .ok_or_else(|| ReliefError::malformed(0, Vec::new(), "middle line holds no vertex"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_vertical_grid;
    use nalgebra::{Point3, Vector3};

    fn create_grid_patch(nx: usize, nz: usize) -> Patch {
        let mesh = build_vertical_grid(nx, nz, 1.0, 10.0).unwrap();
        Patch::from_mesh(&mesh).unwrap()
    }

    #[test]
    fn test_middle_index_rounds_half_to_even() {
        assert_eq!(middle_index(5), 2);
        assert_eq!(middle_index(4), 2);
        assert_eq!(middle_index(3), 2);
        assert_eq!(middle_index(7), 4);
        assert_eq!(middle_index(1), 0);
        assert_eq!(middle_index(2), 1);
    }

    #[test]
    fn test_nearest_column() {
        let angles = [10.0, 20.0, 30.0];
        assert_eq!(nearest_column(&angles, 0.0), 0);
        assert_eq!(nearest_column(&angles, 14.0), 0);
        assert_eq!(nearest_column(&angles, 15.0), 0);
        assert_eq!(nearest_column(&angles, 16.0), 1);
        assert_eq!(nearest_column(&angles, 99.0), 2);
    }

    #[test]
    fn test_five_by_five_layout() {
        let patch = create_grid_patch(5, 5);
        let grid = build_grid(&patch, &GridOptions::default()).unwrap();

        assert_eq!(grid.column_count(), 5);
        assert_eq!(grid.row_count(), 5);
        assert_eq!((grid.middle_column(), grid.middle_row()), (2, 2));

        // Vertex k * 5 + i sits at x = i - 2, z = k
        for v in patch.vertex_ids() {
            let (i, k) = (v.index() % 5, v.index() / 5);
            let cell = grid.cell(v);
            assert_eq!(cell.column, 4 - i, "column of {:?}", v);
            assert_eq!(cell.row, 4 - k, "row of {:?}", v);
        }

        assert_eq!(grid.anchor(Axis::Column), VertexId::new(12));
        assert_eq!(grid.anchor(Axis::Row), VertexId::new(12));
        assert_eq!(grid.interior_cells().count(), 9);
        assert!(grid.loop_report().is_clean());
    }

    #[test]
    fn test_interior_spans_strictly_contain_cell() {
        let patch = create_grid_patch(7, 6);
        let grid = build_grid(&patch, &GridOptions::default()).unwrap();

        for cell in grid.interior_cells() {
            let (lo, hi) = cell.column_rows.unwrap();
            assert!(lo < cell.row && cell.row < hi, "{:?}", cell);
            let (lo, hi) = cell.row_columns.unwrap();
            assert!(lo < cell.column && cell.column < hi, "{:?}", cell);
        }
        for cell in grid.cells().iter().filter(|c| c.is_border) {
            assert!(cell.column_rows.is_none() && cell.row_columns.is_none());
        }
    }

    #[test]
    fn test_chord_is_ignored_for_bounds() {
        let mesh = build_vertical_grid(5, 5, 1.0, 10.0).unwrap();
        let clean = Patch::from_mesh(&mesh).unwrap();

        // Same patch with a chord between border vertices 1 and 5
        let positions: Vec<Point3<f64>> = clean.vertex_ids().map(|v| *clean.position(v)).collect();
        let normals: Vec<Vector3<f64>> = clean.vertex_ids().map(|v| *clean.normal(v)).collect();
        let border: Vec<bool> = clean.vertex_ids().map(|v| clean.is_border(v)).collect();
        let mut edges: Vec<[usize; 2]> = clean.edges().map(|[a, b]| [a.index(), b.index()]).collect();
        edges.push([1, 5]);
        let chorded = Patch::new(positions, normals, &edges, border).unwrap();

        let expected = build_grid(&clean, &GridOptions::default()).unwrap();
        let grid = build_grid(&chorded, &GridOptions::default()).unwrap();
        assert_eq!(grid.loop_report().chords, vec![[VertexId::new(1), VertexId::new(5)]]);
        assert_eq!(grid.cells(), expected.cells());
    }

    #[test]
    fn test_disconnected_vertex_is_malformed() {
        let positions = vec![
            Point3::new(1.0, 5.0, 0.0),
            Point3::new(0.0, 5.0, 2.0),
            Point3::new(-1.0, 5.0, 0.0),
            Point3::new(0.0, 5.0, 1.0),
        ];
        let border = vec![true, true, true, false];
        let patch = Patch::new(positions, vec![Vector3::y(); 4], &[[0, 1], [1, 2], [2, 0]], border).unwrap();

        match build_grid(&patch, &GridOptions::default()) {
            Err(ReliefError::MalformedGrid { vertex, neighbors, .. }) => {
                assert_eq!(vertex, 3);
                assert!(neighbors.is_empty());
            }
            other => panic!("expected MalformedGrid, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_bound_is_malformed() {
        // All boundary vertices on the top row, interior vertex hangs below
        let positions = vec![
            Point3::new(1.0, 5.0, 2.0),
            Point3::new(0.0, 5.0, 2.0),
            Point3::new(-1.0, 5.0, 2.0),
            Point3::new(0.0, 5.0, 0.0),
        ];
        let border = vec![true, true, true, false];
        let edges = [[0, 1], [1, 2], [2, 0], [3, 0], [3, 1], [3, 2]];
        let patch = Patch::new(positions, vec![Vector3::y(); 4], &edges, border).unwrap();

        match build_grid(&patch, &GridOptions::default()) {
            Err(ReliefError::MalformedGrid { vertex, neighbors, reason }) => {
                assert_eq!(vertex, 3);
                assert_eq!(neighbors, vec![0, 1, 2]);
                assert!(reason.contains("row below"), "{}", reason);
            }
            other => panic!("expected MalformedGrid, got {:?}", other),
        }
    }

    #[test]
    fn test_full_enclosure_rejected() {
        // Ring around the origin in the XY plane
        let positions: Vec<Point3<f64>> = (0..8)
            .map(|i| {
                let a = i as f64 * std::f64::consts::FRAC_PI_4 + 0.1;
                Point3::new(a.cos(), a.sin(), 0.0)
            })
            .collect();
        let edges: Vec<[usize; 2]> = (0..8).map(|i| [i, (i + 1) % 8]).collect();
        let patch = Patch::new(positions, vec![Vector3::z(); 8], &edges, vec![true; 8]).unwrap();

        let result = build_grid(&patch, &GridOptions::default());
        assert!(matches!(result, Err(ReliefError::ShapeCoverage { .. })));
    }
}
