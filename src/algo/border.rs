//! Shape-loop diagnostics.
//!
//! The shape loop of a clean patch is a simple cycle: every border vertex has
//! exactly two border neighbors. Loops cut by boolean intersection are often
//! not that clean. A border vertex with fewer than two border edges is an
//! **open end**, and one with more than two is a **shortcut vertex**. An edge
//! joining two shortcut vertices is a **shortcut chord** that cuts across the
//! loop; hosts dissolve chords before extrusion, and the grid builder ignores
//! them when inferring cell bounds.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::mesh::VertexId;
use crate::patch::Patch;

/// Findings about a patch's shape loop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Number of border vertices.
    pub border_vertices: usize,

    /// Border vertices with fewer than two border edges.
    pub open_ends: Vec<VertexId>,

    /// Border vertices with more than two border edges.
    pub shortcut_vertices: Vec<VertexId>,

    /// Border edges joining two shortcut vertices, lower index first.
    pub chords: Vec<[VertexId; 2]>,
}

impl LoopReport {
    /// Check if the loop is a simple closed cycle.
    pub fn is_clean(&self) -> bool {
        self.open_ends.is_empty() && self.shortcut_vertices.is_empty()
    }

    /// Check if an edge is one of the reported chords.
    pub fn is_chord(&self, a: VertexId, b: VertexId) -> bool {
        let key = if a <= b { [a, b] } else { [b, a] };
        self.chords.binary_search(&key).is_ok()
    }
}

/// Inspect the shape loop of a patch.
///
/// The patch is never modified.
pub fn inspect_loop(patch: &Patch) -> LoopReport {
    let mut degree = vec![0usize; patch.num_vertices()];
    for [a, b] in patch.border_edges() {
        degree[a.index()] += 1;
        degree[b.index()] += 1;
    }

    let mut report = LoopReport::default();
    for v in patch.border_vertices() {
        report.border_vertices += 1;
        match degree[v.index()] {
            0 | 1 => report.open_ends.push(v),
            2 => {}
            _ => report.shortcut_vertices.push(v),
        }
    }

    let shortcuts: HashSet<VertexId> = report.shortcut_vertices.iter().copied().collect();
    report.chords = patch
        .border_edges()
        .filter(|[a, b]| shortcuts.contains(a) && shortcuts.contains(b))
        .collect();

    if !report.open_ends.is_empty() {
        warn!(
            count = report.open_ends.len(),
            vertices = ?report.open_ends,
            "shape loop has open ends"
        );
    }
    if !report.chords.is_empty() {
        warn!(
            count = report.chords.len(),
            chords = ?report.chords,
            "shape loop has shortcut chords"
        );
    }
    debug!(
        border = report.border_vertices,
        shortcuts = report.shortcut_vertices.len(),
        clean = report.is_clean(),
        "loop inspected"
    );

    report
}
