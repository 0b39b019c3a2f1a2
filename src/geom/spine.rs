//! Spine and cross-section inputs for the extrusion generator.
//!
//! Both types detect closure by exact endpoint equality, drop the duplicated
//! endpoint and remember that the ring wraps. A spine caches its per-segment
//! lengths at construction so the LOD walk can run without touching the mesh.

use super::{Point3, Vec2};

/// Smallest circle subdivision that still encloses an area.
pub const MIN_CIRCLE_SEGMENTS: usize = 3;

/// Largest circle subdivision generated; larger requests are clamped.
pub const MAX_CIRCLE_SEGMENTS: usize = 4096;

/// Ordered 3D polyline the cross-section is swept along.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Spine {
    points: Vec<Point3>,
    closed: bool,
    source_len: usize,
    segment_lengths: Vec<f64>,
}

impl Spine {
    /// Builds a spine, treating `first == last` (exact) as a closed loop.
    #[must_use]
    pub fn new(mut points: Vec<Point3>) -> Self {
        let source_len = points.len();
        let closed = points.len() >= 2 && points.first() == points.last();
        if closed {
            points.pop();
        }
        Self::from_parts(points, closed, source_len)
    }

    /// Builds a closed spine from its unique points; the last point connects
    /// back to the first.
    #[must_use]
    pub fn closed_loop(points: Vec<Point3>) -> Self {
        let source_len = points.len() + 1;
        let closed = points.len() >= 2;
        Self::from_parts(points, closed, source_len)
    }

    fn from_parts(points: Vec<Point3>, closed: bool, source_len: usize) -> Self {
        let segment_lengths = segment_lengths(&points, closed);
        Self {
            points,
            closed,
            source_len,
            segment_lengths,
        }
    }

    /// Unique spine points (closing duplicate removed).
    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Point count as supplied, including a closing duplicate. Per-point
    /// colors are only honored when their count matches this value.
    #[must_use]
    pub fn source_len(&self) -> usize {
        self.source_len
    }

    /// Whether the spine has enough points to sweep a surface.
    #[must_use]
    pub fn is_sweepable(&self) -> bool {
        self.points.len() >= 2
    }

    /// Number of segments: `n - 1` for open spines, `n` for closed ones.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_lengths.len()
    }

    /// Cached Euclidean length of each segment.
    #[must_use]
    pub fn segment_lengths(&self) -> &[f64] {
        &self.segment_lengths
    }

    #[must_use]
    pub fn total_length(&self) -> f64 {
        self.segment_lengths.iter().sum()
    }

    /// Index of the point following `index`, wrapping on closed spines.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if self.closed && index + 1 == self.points.len() {
            0
        } else {
            index + 1
        }
    }

    /// Start and end points of segment `segment`.
    #[must_use]
    pub fn segment(&self, segment: usize) -> Option<(Point3, Point3)> {
        if segment >= self.segment_count() {
            return None;
        }
        let end = self.next_index(segment);
        Some((self.points[segment], self.points[end]))
    }

    /// Points as originally supplied, re-appending the closing duplicate.
    #[must_use]
    pub fn to_source_points(&self) -> Vec<Point3> {
        let mut out = self.points.clone();
        if self.closed {
            if let Some(first) = self.points.first().copied() {
                out.push(first);
            }
        }
        out
    }
}

fn segment_lengths(points: &[Point3], closed: bool) -> Vec<f64> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut lengths: Vec<f64> = points
        .windows(2)
        .map(|pair| pair[1].distance_to(pair[0]))
        .collect();
    if closed {
        lengths.push(points[0].distance_to(points[points.len() - 1]));
    }
    lengths
}

/// Ordered 2D polygon swept along the spine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CrossSection {
    points: Vec<Vec2>,
    closed: bool,
}

impl CrossSection {
    /// Builds a cross-section, treating `first == last` (exact) as closed.
    #[must_use]
    pub fn new(mut points: Vec<Vec2>) -> Self {
        let closed = points.len() >= 2 && points.first() == points.last();
        if closed {
            points.pop();
        }
        Self { points, closed }
    }

    /// Regular polygon approximating a circle of `radius`, starting at
    /// `(0, radius)` and running clockwise when viewed with +y up.
    /// `segments` is clamped to [`MIN_CIRCLE_SEGMENTS`]..=[`MAX_CIRCLE_SEGMENTS`].
    #[must_use]
    pub fn circle(radius: f64, segments: usize) -> Self {
        Self::new(circle_points(radius, segments))
    }

    /// The default square section `(±1, ±1)`, closed.
    #[must_use]
    pub fn unit_square() -> Self {
        Self::new(vec![
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, -1.0),
            Vec2::new(-1.0, -1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(1.0, 1.0),
        ])
    }

    /// Unique cross-section points (closing duplicate removed).
    #[must_use]
    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Largest distance of any point from the section origin.
    #[must_use]
    pub fn max_extent(&self) -> f64 {
        self.points.iter().map(|p| p.length()).fold(0.0, f64::max)
    }

    /// Points as originally supplied, re-appending the closing duplicate.
    #[must_use]
    pub fn to_source_points(&self) -> Vec<Vec2> {
        let mut out = self.points.clone();
        if self.closed {
            if let Some(first) = self.points.first().copied() {
                out.push(first);
            }
        }
        out
    }
}

/// Closed point list for [`CrossSection::circle`], including the repeated
/// start point.
#[must_use]
pub fn circle_points(radius: f64, segments: usize) -> Vec<Vec2> {
    let segments = segments.clamp(MIN_CIRCLE_SEGMENTS, MAX_CIRCLE_SEGMENTS);
    let angle = std::f64::consts::TAU / segments as f64;

    let mut points = Vec::with_capacity(segments + 1);
    points.push(Vec2::new(0.0, radius));
    for i in 1..segments {
        let a = i as f64 * angle;
        points.push(Vec2::new(radius * a.sin(), radius * a.cos()));
    }
    points.push(Vec2::new(0.0, radius));
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_spine_drops_duplicate_endpoint() {
        let spine = Spine::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        assert!(spine.is_closed());
        assert_eq!(spine.len(), 3);
        assert_eq!(spine.source_len(), 4);
        assert_eq!(spine.segment_count(), 3);
        assert_eq!(spine.next_index(2), 0);
    }

    #[test]
    fn open_spine_lengths() {
        let spine = Spine::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(3.0, 4.0, 0.0),
            Point3::new(3.0, 4.0, 2.0),
        ]);
        assert!(!spine.is_closed());
        assert_eq!(spine.segment_lengths(), &[5.0, 2.0]);
        assert_eq!(spine.total_length(), 7.0);
        assert!(spine.segment(2).is_none());
    }

    #[test]
    fn single_point_is_not_closed() {
        let spine = Spine::new(vec![Point3::new(1.0, 2.0, 3.0)]);
        assert!(!spine.is_closed());
        assert!(!spine.is_sweepable());
        assert_eq!(spine.segment_count(), 0);

        let section = CrossSection::new(vec![Vec2::new(0.5, 0.5)]);
        assert!(!section.is_closed());
        assert_eq!(section.len(), 1);
    }

    #[test]
    fn two_equal_points_collapse() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::ORIGIN]);
        assert!(spine.is_closed());
        assert_eq!(spine.len(), 1);
        assert!(!spine.is_sweepable());
    }

    #[test]
    fn circle_has_requested_segments() {
        let section = CrossSection::circle(2.0, 8);
        assert!(section.is_closed());
        assert_eq!(section.len(), 8);
        for p in section.points() {
            assert!((p.length() - 2.0).abs() < 1e-12);
        }
        assert_eq!(section.points()[0], Vec2::new(0.0, 2.0));
    }

    #[test]
    fn circle_clamps_segment_count() {
        assert_eq!(CrossSection::circle(1.0, 0).len(), MIN_CIRCLE_SEGMENTS);
        assert_eq!(CrossSection::circle(1.0, usize::MAX).len(), MAX_CIRCLE_SEGMENTS);
        assert_eq!(circle_points(1.0, usize::MAX).len(), MAX_CIRCLE_SEGMENTS + 1);
    }

    #[test]
    fn source_points_round_trip_closure() {
        let square = CrossSection::unit_square();
        assert_eq!(square.len(), 4);
        assert_eq!(square.to_source_points().len(), 5);
        assert!((square.max_extent() - 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
