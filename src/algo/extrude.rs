//! Per-axis extrusion along a displacement curve.
//!
//! For one [`Axis`], every interior cell is placed inside its enclosing span
//! (the boundary rows above and below it when walking a column, or the
//! boundary columns on either side when walking a row). The span is split
//! evenly between the curve's segments, the cell's offset inside its segment
//! becomes the Bezier parameter, and the result is tapered linearly towards
//! the border by the cell's distance from the middle line.
//!
//! Values are in the curve's height units (millimeters).

use tracing::debug;

use super::curve::{cubic_bezier, NormalizedCurve};
use super::grid::{Axis, Grid, GridCell};
use crate::error::{ReliefError, Result};

/// How a span's cells are distributed over a curve's segments.
///
/// Counts are real-valued: only the segments that absorb the residual are
/// rounded up, the others keep the fractional quotient.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLayout {
    /// Number of cells per segment.
    pub counts: Vec<f64>,
}

impl SegmentLayout {
    /// Distribute `data_length - (segments - 1)` cells over `segments` pieces.
    ///
    /// With `q = available / segments` and `residual = available mod
    /// segments` (Euclidean), the first `residual` segments hold `ceil(q)`
    /// cells and the rest hold `q`.
    pub fn new(data_length: usize, segments: usize) -> Self {
        let n = segments.max(1) as i64;
        let available = data_length as i64 - (n - 1);
        let quotient = available as f64 / n as f64;
        let residual = available.rem_euclid(n);

        let counts = (0..n)
            .map(|i| if i < residual { quotient.ceil() } else { quotient })
            .collect();
        Self { counts }
    }

    /// Find the segment holding `position` and the offset inside it.
    ///
    /// The segment is the first whose cumulative count reaches `position`;
    /// positions past the end land in the last segment. The offset is
    /// `count - (cumulative - position)`.
    pub fn locate(&self, position: usize) -> (usize, f64) {
        let position = position as f64;
        let mut cumulative = 0.0;
        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if position <= cumulative {
                return (i, count - (cumulative - position));
            }
        }
        let last = self.counts.len().saturating_sub(1);
        let count = self.counts.get(last).copied().unwrap_or(0.0);
        (last, count - (cumulative - position))
    }
}

/// Linear taper from the middle line towards the border.
///
/// `index / middle` up to the middle, mirrored beyond it, never negative.
/// A middle of zero does not taper.
#[inline]
pub fn taper(index: usize, middle: usize) -> f64 {
    if middle == 0 {
        return 1.0;
    }
    let (index, middle) = (index as f64, middle as f64);
    let scale = if index <= middle {
        index / middle
    } else {
        (2.0 * middle - index) / middle
    };
    scale.max(0.0)
}

/// Extrusion value of a single cell along one axis.
///
/// `anchor` marks the axis' anchor cell, which is evaluated without taper.
pub fn cell_extrusion(cell: &GridCell, curve: &NormalizedCurve, axis: Axis, middle: usize, anchor: bool) -> Result<f64> {
    if cell.is_border || curve.segment_count() == 0 {
        return Ok(0.0);
    }

    let (lower, upper) = cell.span(axis).ok_or_else(|| {
        ReliefError::malformed(cell.vertex.index(), Vec::new(), format!("cell has no {:?}-axis span", axis))
    })?;
    let data_length = upper.saturating_sub(lower);
    if data_length == 0 {
        return Ok(0.0);
    }

    let layout = SegmentLayout::new(data_length, curve.segment_count());
    let index = cell.position(axis);
    let (segment, local_offset) = layout.locate(index.saturating_sub(lower));

    let (x_min, x_max) = curve.limits[segment];
    let step = 2.0 * (x_max - x_min) / (layout.counts[segment] + 1.0);
    let u = step * local_offset;

    let value = cubic_bezier(&curve.y[segment], u);
    if anchor {
        Ok(value)
    } else {
        // Scaling every control height scales the Bezier value linearly
        Ok(taper(index, middle) * value)
    }
}

/// Compute the extrusion of every cell along one axis.
///
/// The result is indexed by patch vertex; border cells are zero.
pub fn calculate_extrusion(grid: &Grid, curve: &NormalizedCurve, axis: Axis) -> Result<Vec<f64>> {
    let middle = grid.middle(axis);
    let anchor = grid.anchor(axis);

    let values = grid
        .cells()
        .iter()
        .map(|cell| cell_extrusion(cell, curve, axis, middle, cell.vertex == anchor))
        .collect::<Result<Vec<f64>>>()?;

    debug!(
        axis = ?axis,
        middle,
        anchor = %anchor,
        peak = values.iter().copied().fold(0.0, f64::max),
        "extrusion computed"
    );
    Ok(values)
}
