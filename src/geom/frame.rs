//! Orthonormal frames along an extrusion spine.
//!
//! Each spine point gets a basis where Y follows the spine, Z is derived from
//! the local curvature (or a locked axis) and X completes the right-handed
//! set. Consecutive frames are kept close to each other so the swept
//! cross-section does not visibly flip between spine points.

use super::spine::Spine;
use super::{Point3, Tolerance, Transform, Vec3};

/// Dot product below which the two neighbor directions are treated as
/// pointing in opposite directions (straight spine); the curvature binormal
/// is meaningless there.
const ANTIPARALLEL_DOT: f64 = -0.999;

/// A binormal closer than this to the tangent (|Y·Z|) is replaced by a
/// synthesized axis.
const TANGENT_ALIGNMENT_LIMIT: f64 = 0.5;

/// Frames whose X or Z changed by more than this (dot ≤ limit) trigger the
/// twist re-selection.
const TWIST_DOT_LIMIT: f64 = 0.5;

/// Orthonormal basis placed at one spine point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpineFrame {
    pub origin: Point3,
    pub x: Vec3,
    pub y: Vec3,
    pub z: Vec3,
}

impl SpineFrame {
    /// Local-to-world transform: cross-section `(cx, cy)` is placed at local
    /// `(cx, 0, cy)`.
    #[must_use]
    pub fn transform(&self) -> Transform {
        Transform::from_axes(self.origin, self.x, self.y, self.z)
    }

    /// Negative entries among the nine basis components.
    #[must_use]
    pub fn negative_component_count(&self) -> usize {
        self.x.negative_component_count()
            + self.y.negative_component_count()
            + self.z.negative_component_count()
    }

    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.origin.is_finite() && self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Counts of the geometric fallbacks taken while building frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Spine points whose tangent had (near) zero length.
    pub degenerate_tangents: usize,
    /// Spine points where the neighbor directions were anti-parallel and the
    /// previous Z was reused.
    pub antiparallel_fallbacks: usize,
    /// Spine points where Z was replaced by an axis derived from the tangent.
    pub synthesized_axes: usize,
    /// Spine points where twist minimization picked a different axis.
    pub twist_corrections: usize,
}

/// Frames for every spine point plus the winding parity accumulated over
/// them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameSet {
    pub frames: Vec<SpineFrame>,
    /// +1 per frame with an even count of negative basis components, −1 per
    /// odd count.
    pub reverse_count: i64,
    pub stats: FrameStats,
}

impl FrameSet {
    /// Whether triangle winding must be reversed to keep the surface lit
    /// consistently.
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reverse_count < 0
    }
}

/// Computes one frame per unique spine point.
///
/// A `lock_axis` of zero length is ignored; otherwise Z is pinned to it and
/// only orthogonalized against the tangent.
#[must_use]
pub fn compute_spine_frames(spine: &Spine, lock_axis: Option<Vec3>, tol: Tolerance) -> FrameSet {
    let points = spine.points();
    let n = points.len();
    let mut set = FrameSet {
        frames: Vec::with_capacity(n),
        ..FrameSet::default()
    };
    if n < 2 {
        return set;
    }

    let lock = lock_axis.and_then(|axis| {
        let mut axis = axis;
        (axis.normalize_checked(tol) > tol.eps).then_some(axis)
    });

    let mut prev_x = Vec3::X;
    let mut prev_y = Vec3::Y;
    let mut prev_z = Vec3::Z;

    for i in 0..n {
        let mut y = tangent_at(points, spine.is_closed(), i);
        if y.normalize_checked(tol) <= tol.eps {
            set.stats.degenerate_tangents += 1;
            y = if prev_y.y < 0.0 { Vec3::Y.neg() } else { Vec3::Y };
        }

        let (x, z) = match lock {
            Some(axis) => locked_axes(y, axis, tol, &mut set.stats),
            None => adaptive_axes(points, spine.is_closed(), i, y, prev_x, prev_z, tol, &mut set.stats),
        };

        let frame = SpineFrame { origin: points[i], x, y, z };
        if frame.negative_component_count() % 2 == 1 {
            set.reverse_count -= 1;
        } else {
            set.reverse_count += 1;
        }

        prev_x = x;
        prev_y = y;
        prev_z = z;
        set.frames.push(frame);
    }

    if set.stats != FrameStats::default() {
        log::debug!(
            "spine frames: {} points, {} degenerate tangents, {} anti-parallel, {} synthesized, {} twist corrections",
            n,
            set.stats.degenerate_tangents,
            set.stats.antiparallel_fallbacks,
            set.stats.synthesized_axes,
            set.stats.twist_corrections
        );
    }

    set
}

/// Unnormalized tangent at `i`: centered difference inside the spine and
/// around the wrap of closed spines, one-sided at open ends.
fn tangent_at(points: &[Point3], closed: bool, i: usize) -> Vec3 {
    let n = points.len();
    if closed {
        let prev = if i == 0 { n - 1 } else { i - 1 };
        let next = (i + 1) % n;
        points[next] - points[prev]
    } else if i == 0 {
        points[1] - points[0]
    } else if i == n - 1 {
        points[n - 1] - points[n - 2]
    } else {
        points[i + 1] - points[i - 1]
    }
}

fn locked_axes(y: Vec3, lock: Vec3, tol: Tolerance, stats: &mut FrameStats) -> (Vec3, Vec3) {
    let mut x = y.cross(lock);
    if x.normalize_checked(tol) <= tol.eps {
        // Lock axis runs along the tangent; no plane to project into.
        return synthesized_axes(y, tol, stats);
    }
    let mut z = x.cross(y);
    z.normalize_checked(tol);
    (x, z)
}

#[allow(clippy::too_many_arguments)]
fn adaptive_axes(
    points: &[Point3],
    closed: bool,
    i: usize,
    y: Vec3,
    prev_x: Vec3,
    prev_z: Vec3,
    tol: Tolerance,
    stats: &mut FrameStats,
) -> (Vec3, Vec3) {
    let (mut z0, mut z1) = neighbor_directions(points, closed, i, y, tol);
    z0.normalize_checked(tol);
    z1.normalize_checked(tol);

    let mut z = if z0.dot(z1) < ANTIPARALLEL_DOT {
        stats.antiparallel_fallbacks += 1;
        prev_z
    } else {
        z0.cross(z1)
    };

    let mut x;
    if z.normalize_checked(tol) <= tol.eps || y.dot(z).abs() > TANGENT_ALIGNMENT_LIMIT {
        (x, z) = synthesized_axes(y, tol, stats);
    } else {
        x = y.cross(z);
        x.normalize_checked(tol);
    }

    if i > 0 && (z.dot(prev_z) <= TWIST_DOT_LIMIT || x.dot(prev_x) <= TWIST_DOT_LIMIT) {
        let candidates = [x, x.neg(), z, z.neg()];
        let mut best = 0;
        let mut best_dot = candidates[0].dot(prev_z);
        for (idx, candidate) in candidates.iter().enumerate().skip(1) {
            let dot = candidate.dot(prev_z);
            if dot > best_dot {
                best_dot = dot;
                best = idx;
            }
        }
        if best != 2 {
            stats.twist_corrections += 1;
        }
        z = candidates[best];
        x = y.cross(z);
        x.normalize_checked(tol);
    }

    (x, z)
}

/// Directions whose cross product gives the curvature binormal at `i`.
fn neighbor_directions(points: &[Point3], closed: bool, i: usize, y: Vec3, tol: Tolerance) -> (Vec3, Vec3) {
    let n = points.len();
    if closed {
        let prev = if i == 0 { n - 1 } else { i - 1 };
        let next = (i + 1) % n;
        return (points[next] - points[i], points[prev] - points[i]);
    }
    if n == 2 {
        // No curvature on a single segment; pick any axis not along Y.
        if Vec3::X.cross(y).length() <= tol.eps {
            return (Vec3::Y, y);
        }
        return (Vec3::X, y);
    }
    if i == 0 {
        (points[2] - points[1], points[0] - points[1])
    } else if i == n - 1 {
        (points[n - 1] - points[n - 2], points[n - 3] - points[n - 2])
    } else {
        (points[i + 1] - points[i], points[i - 1] - points[i])
    }
}

/// Axis perpendicular to `y`, taken from the component after `y`'s dominant
/// one and signed like it, then orthogonalized.
fn synthesized_axes(y: Vec3, tol: Tolerance, stats: &mut FrameStats) -> (Vec3, Vec3) {
    stats.synthesized_axes += 1;
    let dominant = y.dominant_axis();
    let sign = if y.component(dominant) > 0.0 { 1.0 } else { -1.0 };
    let mut z = Vec3::axis((dominant + 1) % 3, sign);

    let mut x = y.cross(z);
    x.normalize_checked(tol);
    z = x.cross(y);
    z.normalize_checked(tol);

    let mut x = y.cross(z);
    x.normalize_checked(tol);
    (x, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spine(points: &[[f64; 3]]) -> Spine {
        Spine::new(points.iter().copied().map(Point3::from).collect())
    }

    fn assert_orthonormal(frame: &SpineFrame) {
        let tol = 1e-9;
        assert!((frame.x.length() - 1.0).abs() < tol, "x not unit: {:?}", frame.x);
        assert!((frame.y.length() - 1.0).abs() < tol, "y not unit: {:?}", frame.y);
        assert!((frame.z.length() - 1.0).abs() < tol, "z not unit: {:?}", frame.z);
        assert!(frame.x.dot(frame.y).abs() < tol);
        assert!(frame.y.dot(frame.z).abs() < tol);
        assert!(frame.z.dot(frame.x).abs() < tol);
    }

    #[test]
    fn two_point_spine_along_y_uses_identity_basis() {
        let set = compute_spine_frames(&spine(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]), None, Tolerance::FRAME);
        assert_eq!(set.frames.len(), 2);
        for frame in &set.frames {
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.x, Vec3::X));
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.y, Vec3::Y));
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.z, Vec3::Z));
        }
        assert!(!set.is_reversed());
    }

    #[test]
    fn two_point_spine_along_x_falls_back() {
        let set = compute_spine_frames(&spine(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]), None, Tolerance::FRAME);
        for frame in &set.frames {
            assert_orthonormal(frame);
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.y, Vec3::X));
        }
    }

    #[test]
    fn right_angle_bend_keeps_z_continuous() {
        let set = compute_spine_frames(
            &spine(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
            None,
            Tolerance::FRAME,
        );
        for frame in &set.frames {
            assert_orthonormal(frame);
        }
        for pair in set.frames.windows(2) {
            assert!(pair[0].z.dot(pair[1].z) > 0.0);
        }
        assert_eq!(set.stats.twist_corrections, 0);
    }

    #[test]
    fn straight_spine_reuses_previous_z() {
        let set = compute_spine_frames(
            &spine(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 2.0, 0.0], [0.0, 3.0, 0.0]]),
            None,
            Tolerance::FRAME,
        );
        assert_eq!(set.stats.antiparallel_fallbacks, 4);
        for frame in &set.frames {
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.z, Vec3::Z));
        }
    }

    #[test]
    fn zero_length_tangent_uses_y_axis() {
        // Closed two-point spine: the centered difference cancels out.
        let set = compute_spine_frames(
            &Spine::closed_loop(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 1.0)]),
            None,
            Tolerance::FRAME,
        );
        assert_eq!(set.stats.degenerate_tangents, 2);
        for frame in &set.frames {
            assert!(frame.is_finite());
            assert_eq!(frame.y, Vec3::Y);
        }
    }

    #[test]
    fn lock_axis_pins_z() {
        let set = compute_spine_frames(
            &spine(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 1.0, 0.0]]),
            Some(Vec3::new(0.0, 0.0, 5.0)),
            Tolerance::FRAME,
        );
        for frame in &set.frames {
            assert_orthonormal(frame);
            assert!(Tolerance::DEFAULT.approx_eq_vec3(frame.z, Vec3::Z));
        }
    }

    #[test]
    fn lock_axis_along_tangent_stays_finite() {
        let set = compute_spine_frames(
            &spine(&[[0.0, 0.0, 0.0], [0.0, 0.0, 1.0]]),
            Some(Vec3::Z),
            Tolerance::FRAME,
        );
        for frame in &set.frames {
            assert_orthonormal(frame);
        }
        assert_eq!(set.stats.synthesized_axes, 2);
    }

    #[test]
    fn zero_lock_axis_is_ignored() {
        let points = [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let unlocked = compute_spine_frames(&spine(&points), None, Tolerance::FRAME);
        let zero = compute_spine_frames(&spine(&points), Some(Vec3::ZERO), Tolerance::FRAME);
        assert_eq!(unlocked, zero);
    }

    #[test]
    fn parity_counts_negative_components() {
        let frame = SpineFrame {
            origin: Point3::ORIGIN,
            x: Vec3::X.neg(),
            y: Vec3::Y,
            z: Vec3::Z,
        };
        assert_eq!(frame.negative_component_count(), 1);
    }
}
