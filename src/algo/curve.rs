//! Displacement curves.
//!
//! A [`Curve`] is a piecewise cubic Bezier path drawn in normalized UV space,
//! one [`ControlSegment`] per piece. It is exchanged with the host's curve
//! editor as JSON, one object per segment:
//!
//! ```json
//! [
//!   { "start": { "position": { "x": 0.0, "y": 1.0 }, "control": { "x": 0.0, "y": 0.75 } },
//!     "end":   { "position": { "x": 0.5, "y": 0.33 }, "control": { "x": 0.25, "y": 0.33 } } }
//! ]
//! ```
//!
//! [`NormalizedCurve`] turns the UV-space y values into displacement heights:
//! `y = 1` (the top of the editor) is no displacement and the lowest point of
//! the curve is the full target height.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Evaluate a one-dimensional cubic Bezier at `u`.
///
/// `u` is not clamped; values outside `[0, 1]` extrapolate the polynomial.
///
/// # Example
///
/// ```
/// use relief::algo::curve::cubic_bezier;
///
/// let p = [1.0, 4.0, -2.0, 3.0];
/// assert_eq!(cubic_bezier(&p, 0.0), 1.0);
/// assert_eq!(cubic_bezier(&p, 1.0), 3.0);
/// ```
#[inline]
pub fn cubic_bezier(p: &[f64; 4], u: f64) -> f64 {
    let t = 1.0 - u;
    p[0] * t * t * t + 3.0 * p[1] * u * t * t + 3.0 * p[2] * u * u * t + p[3] * u * u * u
}

/// A point in the curve editor's normalized space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UvPoint {
    /// Horizontal coordinate, along the grid axis.
    pub x: f64,
    /// Vertical coordinate, the relief profile.
    pub y: f64,
}

impl UvPoint {
    /// Create a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An anchor of the editor's path with its handle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct Handle {
    position: UvPoint,
    control: UvPoint,
}

/// The editor's serialized form of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct HostSegment {
    start: Handle,
    end: Handle,
}

/// One cubic piece of a curve, control points `P0..P3` in order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "HostSegment", into = "HostSegment")]
pub struct ControlSegment {
    /// Start, start handle, end handle, end.
    pub points: [UvPoint; 4],
}

impl ControlSegment {
    /// Create a segment from its four control points.
    pub fn new(p0: UvPoint, p1: UvPoint, p2: UvPoint, p3: UvPoint) -> Self {
        Self {
            points: [p0, p1, p2, p3],
        }
    }

    /// The four x coordinates.
    pub fn xs(&self) -> [f64; 4] {
        self.points.map(|p| p.x)
    }

    /// The four y coordinates.
    pub fn ys(&self) -> [f64; 4] {
        self.points.map(|p| p.y)
    }
}

impl From<HostSegment> for ControlSegment {
    fn from(s: HostSegment) -> Self {
        Self::new(s.start.position, s.start.control, s.end.control, s.end.position)
    }
}

impl From<ControlSegment> for HostSegment {
    fn from(s: ControlSegment) -> Self {
        let [p0, p1, p2, p3] = s.points;
        HostSegment {
            start: Handle {
                position: p0,
                control: p1,
            },
            end: Handle {
                position: p3,
                control: p2,
            },
        }
    }
}

/// A piecewise cubic Bezier displacement profile.
///
/// Segments are expected to join end to start; this is not checked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Curve {
    /// Segments in editor order.
    pub segments: Vec<ControlSegment>,
}

impl Curve {
    /// Create a curve from its segments.
    pub fn new(segments: Vec<ControlSegment>) -> Self {
        Self { segments }
    }

    /// Parse a curve from the host editor's JSON.
    pub fn from_json(json_str: &str) -> Result<Self> {
        Ok(serde_json::from_str(json_str)?)
    }

    /// Serialize the curve to the host editor's JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the curve has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A curve converted to displacement units.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCurve {
    /// Control x coordinates per segment, unchanged from UV space.
    pub x: Vec<[f64; 4]>,

    /// Control heights per segment: `(1 - y) / curve_max * height`.
    pub y: Vec<[f64; 4]>,

    /// `(min x, max x)` per segment.
    pub limits: Vec<(f64, f64)>,

    /// Largest `1 - y` over every control point.
    pub curve_max: f64,
}

impl NormalizedCurve {
    /// Normalize a curve so its deepest point maps to `height`.
    ///
    /// A curve that never dips below `y = 1` normalizes to all-zero heights.
    pub fn new(curve: &Curve, height: f64) -> Self {
        let curve_max = curve
            .segments
            .iter()
            .flat_map(|s| s.ys())
            .map(|y| 1.0 - y)
            .fold(f64::NEG_INFINITY, f64::max);

        let x: Vec<[f64; 4]> = curve.segments.iter().map(ControlSegment::xs).collect();
        let y = curve
            .segments
            .iter()
            .map(|s| {
                s.ys().map(|y| {
                    if curve_max > 0.0 {
                        (1.0 - y) / curve_max * height
                    } else {
                        0.0
                    }
                })
            })
            .collect();
        let limits = x
            .iter()
            .map(|xs| {
                let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
                let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (lo, hi)
            })
            .collect();

        Self {
            x,
            y,
            limits,
            curve_max,
        }
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.y.len()
    }
}
