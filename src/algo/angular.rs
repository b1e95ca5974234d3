//! Angular ordering of the shape loop.
//!
//! Boundary vertices are sorted by their polar angle around the origin and
//! the sorted ring is cut at its widest angular discontinuity, so the
//! sequence runs from one side of the gap around to the other.
//!
//! # Example
//!
//! ```
//! use relief::algo::angular::sort_by_angle;
//! use relief::mesh::VertexId;
//!
//! let items = [10.0, 20.0, 200.0, 210.0]
//!     .iter()
//!     .enumerate()
//!     .map(|(i, &a)| (VertexId::new(i), a))
//!     .collect::<Vec<_>>();
//!
//! let seq = sort_by_angle(&items, 2.0).unwrap();
//! let order: Vec<usize> = seq.vertices.iter().map(|v| v.index()).collect();
//! assert_eq!(order, vec![2, 3, 0, 1]);
//! assert_eq!(seq.angles, vec![200.0, 210.0, 370.0, 380.0]);
//! ```

use nalgebra::Point3;
use tracing::debug;

use crate::error::{ReliefError, Result};
use crate::mesh::VertexId;
use crate::patch::Patch;

/// Polar angle of a point around the origin in degrees, in `[0, 360)`.
///
/// Z is ignored.
#[inline]
pub fn polar_angle(p: &Point3<f64>) -> f64 {
    let a = p.y.atan2(p.x).to_degrees();
    let a = if a < 0.0 { a + 360.0 } else { a };
    // -tiny + 360 rounds to 360
    if a >= 360.0 {
        a - 360.0
    } else {
        a
    }
}

/// The discontinuity the sequence was cut at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngularGap {
    /// Angle (degrees, `[0, 360)`) on the near side of the gap.
    pub from: f64,

    /// Angle (degrees, `[0, 360)`) on the far side of the gap.
    pub to: f64,

    /// Angular width of the gap in degrees.
    pub width: f64,

    /// Whether the gap spans 0°, leaving the sorted order as it was.
    pub wraps: bool,
}

/// Boundary vertices in traversal order.
#[derive(Debug, Clone, PartialEq)]
pub struct AngularSequence {
    /// Vertices from one side of the gap round to the other.
    pub vertices: Vec<VertexId>,

    /// Angle of each vertex, unwrapped so it never decreases along the
    /// sequence (vertices past 360° carry `angle + 360`).
    pub angles: Vec<f64>,

    /// The gap the ring was cut at, `None` for a single vertex.
    pub gap: Option<AngularGap>,
}

impl AngularSequence {
    /// Number of vertices in the sequence.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// First unwrapped angle of the sequence.
    pub fn start_angle(&self) -> f64 {
        self.angles.first().copied().unwrap_or(0.0)
    }

    /// Last unwrapped angle of the sequence.
    pub fn end_angle(&self) -> f64 {
        self.angles.last().copied().unwrap_or(0.0)
    }

    /// Bring a raw `[0, 360)` angle into the sequence's unwrapped range.
    ///
    /// Of `angle - 360`, `angle`, and `angle + 360`, the one closest to the
    /// interval `[start_angle, end_angle]` is returned.
    pub fn unwrap_angle(&self, angle: f64) -> f64 {
        let (lo, hi) = (self.start_angle(), self.end_angle());
        let distance = |a: f64| {
            if a < lo {
                lo - a
            } else if a > hi {
                a - hi
            } else {
                0.0
            }
        };
        [angle, angle + 360.0, angle - 360.0]
            .into_iter()
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
            .unwrap_or(angle)
    }
}

/// Sort vertices by angle and cut the ring at its widest gap.
///
/// `items` pairs each vertex with its polar angle in `[0, 360)`. Ties in
/// angle are broken by vertex index. Among all consecutive differences,
/// including the wrap-around difference `first + 360 - last`, the largest one
/// exceeding `offset` is the gap (earliest wins on ties):
///
/// - an interior gap between sorted positions `i` and `i + 1` rotates the
///   sequence to start at `i + 1`;
/// - a wrap-around gap leaves the sorted order unchanged.
///
/// # Errors
/// * [`ReliefError::EmptyPatch`] if `items` is empty
/// * [`ReliefError::NoGapFound`] if two or more vertices cover the full
///   circle without any difference above `offset`
pub fn sort_by_angle(items: &[(VertexId, f64)], offset: f64) -> Result<AngularSequence> {
    if items.is_empty() {
        return Err(ReliefError::EmptyPatch);
    }

    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let n = sorted.len();
    if n == 1 {
        return Ok(AngularSequence {
            vertices: vec![sorted[0].0],
            angles: vec![sorted[0].1],
            gap: None,
        });
    }

    // Position i holds the gap after sorted[i]; position n-1 is the wrap.
    let mut best: Option<(usize, f64)> = None;
    for i in 0..n {
        let width = if i + 1 < n {
            sorted[i + 1].1 - sorted[i].1
        } else {
            sorted[0].1 + 360.0 - sorted[n - 1].1
        };
        if width > offset && best.map_or(true, |(_, w)| width > w) {
            best = Some((i, width));
        }
    }

    let (cut, width) = best.ok_or(ReliefError::NoGapFound { vertices: n })?;
    let wraps = cut == n - 1;
    let gap = AngularGap {
        from: sorted[cut].1,
        to: sorted[(cut + 1) % n].1,
        width,
        wraps,
    };

    let mut vertices = Vec::with_capacity(n);
    let mut angles = Vec::with_capacity(n);
    if wraps {
        for &(v, a) in &sorted {
            vertices.push(v);
            angles.push(a);
        }
    } else {
        for &(v, a) in &sorted[cut + 1..] {
            vertices.push(v);
            angles.push(a);
        }
        for &(v, a) in &sorted[..=cut] {
            vertices.push(v);
            angles.push(a + 360.0);
        }
    }

    debug!(
        vertices = n,
        gap_from = gap.from,
        gap_to = gap.to,
        gap_width = gap.width,
        wraps,
        "angular sequence"
    );

    Ok(AngularSequence {
        vertices,
        angles,
        gap: Some(gap),
    })
}

/// Order the border vertices of a patch by polar angle.
pub fn sort_border(patch: &Patch, offset: f64) -> Result<AngularSequence> {
    let items: Vec<(VertexId, f64)> = patch
        .border_vertices()
        .map(|v| (v, polar_angle(patch.position(v))))
        .collect();
    sort_by_angle(&items, offset)
}
