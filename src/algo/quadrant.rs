//! Quadrant classification and shape extremes.
//!
//! Patch vertices are partitioned into the four planar quadrants around the
//! origin (Z is ignored). The set of occupied quadrants decides which two
//! vertices bound the shape's angular traversal: `shape_min` where it starts
//! and `shape_max` where it ends.
//!
//! Quadrants are half-open polar sectors, so a vertex lying exactly on an
//! axis belongs to the quadrant its angle opens:
//!
//! | Quadrant | Angle        |
//! |----------|--------------|
//! | Q1       | `[0, 90)`    |
//! | Q2       | `[90, 180)`  |
//! | Q3       | `[180, 270)` |
//! | Q4       | `[270, 360)` |
//!
//! # Example
//!
//! ```
//! use relief::algo::quadrant::{shape_limits_of, Quadrant};
//! use relief::mesh::VertexId;
//! use nalgebra::Point3;
//!
//! // An arc above the origin, spanning Q1 and Q2
//! let points = [
//!     (VertexId::new(0), Point3::new(2.0, 1.0, 0.0)),
//!     (VertexId::new(1), Point3::new(0.0, 2.0, 0.0)),
//!     (VertexId::new(2), Point3::new(-2.0, 1.0, 0.0)),
//! ];
//! let limits = shape_limits_of(points).unwrap();
//!
//! assert!(limits.coverage.contains(Quadrant::First));
//! assert_eq!(limits.shape_min, VertexId::new(0));
//! assert_eq!(limits.shape_max, VertexId::new(2));
//! ```

use std::fmt;

use nalgebra::Point3;
use tracing::debug;

use super::angular::polar_angle;
use crate::error::{ReliefError, Result};
use crate::mesh::VertexId;
use crate::patch::Patch;

/// One of the four planar quadrants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quadrant {
    /// `[0°, 90°)`
    First,
    /// `[90°, 180°)`
    Second,
    /// `[180°, 270°)`
    Third,
    /// `[270°, 360°)`
    Fourth,
}

impl Quadrant {
    /// All quadrants in angular order.
    pub const ALL: [Quadrant; 4] = [
        Quadrant::First,
        Quadrant::Second,
        Quadrant::Third,
        Quadrant::Fourth,
    ];

    /// Get the quadrant containing a point (Z ignored).
    pub fn of(p: &Point3<f64>) -> Self {
        let angle = polar_angle(p);
        if angle < 90.0 {
            Quadrant::First
        } else if angle < 180.0 {
            Quadrant::Second
        } else if angle < 270.0 {
            Quadrant::Third
        } else {
            Quadrant::Fourth
        }
    }

    #[inline]
    fn ordinal(self) -> usize {
        self as usize
    }

    #[inline]
    fn bit(self) -> u8 {
        1 << self.ordinal()
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.ordinal() + 1)
    }
}

/// The set of quadrants occupied by a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Coverage(u8);

impl Coverage {
    /// Add a quadrant to the set.
    pub fn insert(&mut self, q: Quadrant) {
        self.0 |= q.bit();
    }

    /// Check if a quadrant is occupied.
    pub fn contains(self, q: Quadrant) -> bool {
        self.0 & q.bit() != 0
    }

    /// Number of occupied quadrants.
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Check if no quadrant is occupied.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over occupied quadrants in angular order.
    pub fn iter(self) -> impl Iterator<Item = Quadrant> {
        Quadrant::ALL.into_iter().filter(move |&q| self.contains(q))
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|q| q.to_string()).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Patch vertices partitioned by quadrant, each group in input order.
#[derive(Debug, Clone, Default)]
pub struct QuadrantSplit {
    /// Every classified vertex in input order.
    pub points: Vec<(VertexId, Point3<f64>)>,

    /// Vertices per quadrant, indexed Q1..Q4.
    pub groups: [Vec<(VertexId, Point3<f64>)>; 4],

    /// Occupied quadrants.
    pub coverage: Coverage,
}

impl QuadrantSplit {
    /// Vertices in one quadrant.
    pub fn group(&self, q: Quadrant) -> &[(VertexId, Point3<f64>)] {
        &self.groups[q.ordinal()]
    }
}

/// The two extremal vertices that bound the angular traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeLimits {
    /// Vertex where the traversal starts.
    pub shape_min: VertexId,

    /// Vertex where the traversal ends.
    pub shape_max: VertexId,

    /// Quadrants the shape occupies.
    pub coverage: Coverage,
}

#[derive(Debug, Clone, Copy)]
enum Coord {
    X,
    Y,
}

#[derive(Debug, Clone, Copy)]
enum Pick {
    Smallest,
    Largest,
}

/// Selects one extremal vertex, optionally restricted to one quadrant.
#[derive(Debug, Clone, Copy)]
struct Rule {
    within: Option<Quadrant>,
    coord: Coord,
    pick: Pick,
}

const fn any(coord: Coord, pick: Pick) -> Rule {
    Rule {
        within: None,
        coord,
        pick,
    }
}

const fn within(q: Quadrant, coord: Coord, pick: Pick) -> Rule {
    Rule {
        within: Some(q),
        coord,
        pick,
    }
}

use Coord::{X, Y};
use Pick::{Largest, Smallest};
use Quadrant::{First as Q1, Fourth as Q4, Second as Q2, Third as Q3};

/// `(min rule, max rule)` for each coverage bitset (bit 0 = Q1 .. bit 3 = Q4).
///
/// `None` marks coverages the grid cannot start from: nothing, or all four.
const RULES: [Option<(Rule, Rule)>; 16] = [
    // 0b0000: empty
    None,
    // 0b0001: Q1
    Some((any(X, Smallest), any(X, Largest))),
    // 0b0010: Q2
    Some((any(X, Smallest), any(X, Largest))),
    // 0b0011: Q1 Q2
    Some((any(X, Largest), any(X, Smallest))),
    // 0b0100: Q3
    Some((any(X, Smallest), any(X, Largest))),
    // 0b0101: Q1 Q3
    Some((any(Y, Largest), any(Y, Smallest))),
    // 0b0110: Q2 Q3
    Some((any(Y, Largest), any(Y, Smallest))),
    // 0b0111: Q1 Q2 Q3
    Some((within(Q1, X, Largest), within(Q3, Y, Smallest))),
    // 0b1000: Q4
    Some((any(X, Smallest), any(X, Largest))),
    // 0b1001: Q4 Q1
    Some((any(Y, Smallest), any(Y, Largest))),
    // 0b1010: Q2 Q4
    Some((any(Y, Largest), any(Y, Smallest))),
    // 0b1011: Q4 Q1 Q2
    Some((within(Q4, Y, Smallest), within(Q2, X, Smallest))),
    // 0b1100: Q3 Q4
    Some((any(X, Smallest), any(X, Largest))),
    // 0b1101: Q3 Q4 Q1
    Some((within(Q3, X, Smallest), within(Q1, Y, Largest))),
    // 0b1110: Q2 Q3 Q4
    Some((within(Q2, Y, Largest), within(Q4, X, Largest))),
    // 0b1111: all four
    None,
];

impl Rule {
    /// Apply the rule. Ties keep the vertex seen first.
    fn select(&self, split: &QuadrantSplit) -> Option<VertexId> {
        let candidates = match self.within {
            Some(q) => split.group(q),
            None => &split.points,
        };

        let key = |p: &Point3<f64>| match self.coord {
            Coord::X => p.x,
            Coord::Y => p.y,
        };

        let mut best: Option<(VertexId, f64)> = None;
        for (v, p) in candidates {
            let value = key(p);
            let better = match (best, self.pick) {
                (None, _) => true,
                (Some((_, b)), Pick::Smallest) => value < b,
                (Some((_, b)), Pick::Largest) => value > b,
            };
            if better {
                best = Some((*v, value));
            }
        }
        best.map(|(v, _)| v)
    }
}

/// Partition points into quadrants, preserving input order within groups.
pub fn classify_points<I>(points: I) -> QuadrantSplit
where
    I: IntoIterator<Item = (VertexId, Point3<f64>)>,
{
    let mut split = QuadrantSplit::default();
    for (v, p) in points {
        let q = Quadrant::of(&p);
        split.coverage.insert(q);
        split.groups[q.ordinal()].push((v, p));
        split.points.push((v, p));
    }
    split
}

/// Partition all patch vertices into quadrants.
pub fn classify_quadrants(patch: &Patch) -> QuadrantSplit {
    classify_points(patch.vertex_ids().map(|v| (v, *patch.position(v))))
}

/// Derive `shape_min`/`shape_max` from an existing split.
///
/// # Errors
/// * [`ReliefError::EmptyPatch`] if the split holds no vertices
/// * [`ReliefError::ShapeCoverage`] if all four quadrants are occupied
pub fn limits_from_split(split: &QuadrantSplit) -> Result<ShapeLimits> {
    if split.coverage.is_empty() {
        return Err(ReliefError::EmptyPatch);
    }

    let (min_rule, max_rule) = RULES[split.coverage.0 as usize].ok_or_else(|| ReliefError::ShapeCoverage {
        quadrants: split.coverage.to_string(),
    })?;

    // Filtered rules always name an occupied quadrant, so both picks exist.
    let (shape_min, shape_max) = match (min_rule.select(split), max_rule.select(split)) {
        (Some(min), Some(max)) => (min, max),
        _ => return Err(ReliefError::EmptyPatch),
    };

    debug!(
        coverage = %split.coverage,
        shape_min = %shape_min,
        shape_max = %shape_max,
        "shape limits"
    );

    Ok(ShapeLimits {
        shape_min,
        shape_max,
        coverage: split.coverage,
    })
}

/// Classify points and derive the shape limits in one step.
pub fn shape_limits_of<I>(points: I) -> Result<ShapeLimits>
where
    I: IntoIterator<Item = (VertexId, Point3<f64>)>,
{
    limits_from_split(&classify_points(points))
}

/// Compute the shape limits over all vertices of a patch.
pub fn shape_limits(patch: &Patch) -> Result<ShapeLimits> {
    limits_from_split(&classify_quadrants(patch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_points(coords: &[(f64, f64)]) -> Vec<(VertexId, Point3<f64>)> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| (VertexId::new(i), Point3::new(x, y, 0.0)))
            .collect()
    }

    #[test]
    fn test_axis_points_use_half_open_sectors() {
        assert_eq!(Quadrant::of(&Point3::new(1.0, 0.0, 0.0)), Quadrant::First);
        assert_eq!(Quadrant::of(&Point3::new(0.0, 1.0, 0.0)), Quadrant::Second);
        assert_eq!(Quadrant::of(&Point3::new(-1.0, 0.0, 0.0)), Quadrant::Third);
        assert_eq!(Quadrant::of(&Point3::new(0.0, -1.0, 0.0)), Quadrant::Fourth);
        assert_eq!(Quadrant::of(&Point3::origin()), Quadrant::First);
    }

    #[test]
    fn test_single_quadrant_uses_x() {
        let points = create_points(&[(3.0, 1.0), (1.0, 2.0), (2.0, 5.0)]);
        let limits = shape_limits_of(points).unwrap();
        assert_eq!(limits.coverage.len(), 1);
        assert_eq!(limits.shape_min, VertexId::new(1));
        assert_eq!(limits.shape_max, VertexId::new(0));
    }

    #[test]
    fn test_limits_for_every_coverage() {
        // (points, shape_min, shape_max); each set is laid out so that
        // flipping a pick or dropping a quadrant filter changes the answer.
        let cases: Vec<(Vec<(f64, f64)>, usize, usize)> = vec![
            // Q1
            (vec![(3.0, 1.0), (1.0, 4.0), (2.0, 2.0)], 1, 0),
            // Q2
            (vec![(-1.0, 3.0), (-4.0, 1.0), (-2.0, 2.0)], 1, 0),
            // Q3
            (vec![(-1.0, -3.0), (-4.0, -1.0), (-2.0, -2.0)], 1, 0),
            // Q4
            (vec![(4.0, -1.0), (1.0, -3.0), (2.0, -2.0)], 1, 0),
            // Q1 Q2: largest x to smallest x
            (vec![(3.0, 1.0), (1.0, 4.0), (-2.0, 2.0), (-4.0, 1.0)], 0, 3),
            // Q3 Q4: smallest x to largest x
            (vec![(-4.0, -1.0), (-1.0, -3.0), (2.0, -2.0), (5.0, -1.0)], 0, 3),
            // Q4 Q1: smallest y to largest y
            (vec![(1.0, -3.0), (2.0, -1.0), (2.0, 1.0), (1.0, 4.0)], 0, 3),
            // Q1 Q3: largest y to smallest y
            (vec![(2.0, 3.0), (1.0, 1.0), (-1.0, -2.0), (-3.0, -4.0)], 0, 3),
            // Q2 Q3: largest y to smallest y
            (vec![(-1.0, 4.0), (-3.0, 1.0), (-2.0, -1.0), (-1.0, -5.0)], 0, 3),
            // Q2 Q4: largest y to smallest y
            (vec![(-1.0, 3.0), (-4.0, 1.0), (2.0, -1.0), (1.0, -6.0)], 0, 3),
            // Q1 Q2 Q3: largest x in Q1 to smallest y in Q3
            (vec![(5.0, 1.0), (1.0, 6.0), (-2.0, 3.0), (-6.0, -1.0), (-1.0, -4.0)], 0, 4),
            // Q4 Q1 Q2: smallest y in Q4 to smallest x in Q2
            (vec![(1.0, -5.0), (4.0, -1.0), (3.0, 2.0), (-1.0, 5.0), (-6.0, 1.0)], 0, 4),
            // Q2 Q3 Q4: largest y in Q2 to largest x in Q4
            (vec![(-1.0, 6.0), (-5.0, 1.0), (-3.0, -3.0), (1.0, -5.0), (6.0, -1.0)], 0, 4),
            // Q3 Q4 Q1: smallest x in Q3 to largest y in Q1
            (vec![(-6.0, -1.0), (-1.0, -5.0), (2.0, -3.0), (5.0, 1.0), (1.0, 6.0)], 0, 4),
        ];

        for (coords, min, max) in cases {
            let limits = shape_limits_of(create_points(&coords)).unwrap();
            assert_eq!(limits.shape_min, VertexId::new(min), "shape_min for {}", limits.coverage);
            assert_eq!(limits.shape_max, VertexId::new(max), "shape_max for {}", limits.coverage);
        }
    }

    #[test]
    fn test_right_half_uses_y() {
        // Q4 and Q1: the shape straddles the +X axis
        let points = create_points(&[(1.0, 2.0), (2.0, -1.0), (1.0, -3.0), (2.0, 1.0)]);
        let limits = shape_limits_of(points).unwrap();
        assert_eq!(limits.shape_min, VertexId::new(2));
        assert_eq!(limits.shape_max, VertexId::new(0));
    }

    #[test]
    fn test_three_quadrants_filter_outer_groups() {
        // Q3, Q4, Q1 occupied; Q2 is the gap
        let points = create_points(&[(2.0, 3.0), (1.0, 1.0), (-1.0, -1.0), (-3.0, -0.5), (1.0, -2.0)]);
        let limits = shape_limits_of(points).unwrap();
        assert_eq!(limits.coverage.to_string(), "Q1, Q3, Q4");
        assert_eq!(limits.shape_min, VertexId::new(3));
        assert_eq!(limits.shape_max, VertexId::new(0));
    }

    #[test]
    fn test_ties_keep_first_vertex() {
        let points = create_points(&[(1.0, 1.0), (1.0, 2.0), (3.0, 1.0), (3.0, 2.0)]);
        let limits = shape_limits_of(points).unwrap();
        assert_eq!(limits.shape_min, VertexId::new(0));
        assert_eq!(limits.shape_max, VertexId::new(2));
    }

    #[test]
    fn test_four_quadrants_rejected() {
        let points = create_points(&[(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)]);
        let result = shape_limits_of(points);
        match result {
            Err(ReliefError::ShapeCoverage { quadrants }) => assert_eq!(quadrants, "Q1, Q2, Q3, Q4"),
            other => panic!("expected ShapeCoverage, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(shape_limits_of(Vec::new()), Err(ReliefError::EmptyPatch)));
    }

    #[test]
    fn test_every_partial_coverage_has_rules() {
        for bits in 1..15usize {
            let (min_rule, max_rule) = RULES[bits].unwrap();
            for rule in [min_rule, max_rule] {
                if let Some(q) = rule.within {
                    assert!(bits & (1 << q.ordinal()) != 0, "rule for {:04b} filters on unoccupied {}", bits, q);
                }
            }
        }
    }
}
