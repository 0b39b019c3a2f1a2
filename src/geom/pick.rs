//! Ray picking against the extrusion centreline.
//!
//! The tube is approximated by a capsule of `radius` around each spine
//! segment, which is what a user clicking on a thin pipe expects.

use super::spine::Spine;
use super::{Point3, Tolerance, Vec3};

/// Ray with a unit direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickRay {
    pub origin: Point3,
    pub direction: Vec3,
}

impl PickRay {
    /// Returns `None` when `direction` has no length.
    #[must_use]
    pub fn new(origin: Point3, direction: Vec3) -> Option<Self> {
        let direction = direction.normalized()?;
        Some(Self { origin, direction })
    }

    #[must_use]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickOptions {
    /// Maximum perpendicular distance from the centreline.
    pub radius: f64,
    /// Segments whose endpoints are both at least this far from the camera
    /// are ignored.
    pub distance_cutoff: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    /// Point on the tube surface facing the ray origin.
    pub point: Point3,
    /// Point on the ray closest to the segment.
    pub ray_point: Point3,
    /// Closest centreline point, clamped to the segment.
    pub spine_point: Point3,
    pub segment: usize,
    /// Distance between `ray_point` and `spine_point`.
    pub distance: f64,
    /// Signed distance along the ray to `ray_point`.
    pub ray_parameter: f64,
}

/// Intersects `ray` with every spine segment. `clip` rejects ray points
/// outside the caller's view volume. Hits are sorted nearest first.
#[must_use]
pub fn pick_spine(
    ray: &PickRay,
    spine: &Spine,
    camera: Point3,
    options: PickOptions,
    clip: impl Fn(Point3) -> bool,
) -> Vec<PickHit> {
    let cutoff_squared = options
        .distance_cutoff
        .filter(|cutoff| *cutoff >= 0.0)
        .map_or(f64::INFINITY, |cutoff| cutoff * cutoff);
    let radius_squared = options.radius * options.radius;

    let mut hits = Vec::new();
    for segment in 0..spine.segment_count() {
        let Some((start, end)) = spine.segment(segment) else {
            continue;
        };
        if start == end {
            continue;
        }
        if camera.distance_squared_to(start) >= cutoff_squared && camera.distance_squared_to(end) >= cutoff_squared {
            continue;
        }

        let Some((t, s)) = closest_line_parameters(ray, start, end) else {
            continue;
        };
        let ray_point = ray.at(t);
        let spine_point = start + (end - start) * s.clamp(0.0, 1.0);
        let distance_squared = ray_point.distance_squared_to(spine_point);
        if distance_squared > radius_squared || !clip(ray_point) {
            continue;
        }

        let offset = (radius_squared - distance_squared).max(0.0).sqrt();
        hits.push(PickHit {
            point: ray.at(t - offset),
            ray_point,
            spine_point,
            segment,
            distance: distance_squared.sqrt(),
            ray_parameter: t,
        });
    }

    hits.sort_by(|a, b| a.ray_parameter.total_cmp(&b.ray_parameter));
    hits
}

/// Parameters `(t, s)` of the closest points between the ray line and the
/// line through `start` and `end` (`s` in segment units). `None` when the
/// lines are parallel.
fn closest_line_parameters(ray: &PickRay, start: Point3, end: Point3) -> Option<(f64, f64)> {
    let d = ray.direction;
    let e = end - start;
    let w = ray.origin - start;

    let a = d.dot(d);
    let b = d.dot(e);
    let c = e.dot(e);
    let denom = a * c - b * b;
    if denom <= Tolerance::PARALLEL.eps * a * c {
        return None;
    }

    let dw = d.dot(w);
    let ew = e.dot(w);
    let t = (b * ew - c * dw) / denom;
    let s = (a * ew - b * dw) / denom;
    Some((t, s))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(radius: f64) -> PickOptions {
        PickOptions {
            radius,
            distance_cutoff: None,
        }
    }

    #[test]
    fn zero_direction_is_rejected() {
        assert!(PickRay::new(Point3::ORIGIN, Vec3::ZERO).is_none());
    }

    #[test]
    fn parallel_ray_misses() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)]);
        let ray = PickRay::new(Point3::new(0.0, 0.5, 0.0), Vec3::X).unwrap();
        assert!(pick_spine(&ray, &spine, Point3::ORIGIN, options(1.0), |_| true).is_empty());
    }

    #[test]
    fn surface_point_sits_on_radius() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)]);
        let ray = PickRay::new(Point3::new(3.0, 0.0, 10.0), Vec3::Z.neg()).unwrap();
        let hits = pick_spine(&ray, &spine, Point3::ORIGIN, options(2.0), |_| true);
        assert_eq!(hits.len(), 1);
        let hit = hits[0];
        assert!(Tolerance::DEFAULT.approx_eq_point3(hit.point, Point3::new(3.0, 0.0, 2.0)));
        assert!(Tolerance::DEFAULT.approx_eq_point3(hit.spine_point, Point3::new(3.0, 0.0, 0.0)));
        assert!(Tolerance::DEFAULT.approx_eq_f64(hit.ray_parameter, 10.0));
    }

    #[test]
    fn closest_point_is_clamped_to_segment() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)]);
        let ray = PickRay::new(Point3::new(10.5, 0.0, 5.0), Vec3::Z.neg()).unwrap();
        let hits = pick_spine(&ray, &spine, Point3::ORIGIN, options(1.0), |_| true);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].spine_point, Point3::new(10.0, 0.0, 0.0));
        assert!((hits[0].distance - 0.5).abs() < 1e-12);

        let far = PickRay::new(Point3::new(12.0, 0.0, 5.0), Vec3::Z.neg()).unwrap();
        assert!(pick_spine(&far, &spine, Point3::ORIGIN, options(1.0), |_| true).is_empty());
    }

    #[test]
    fn cutoff_excludes_distant_segments() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)]);
        let ray = PickRay::new(Point3::new(5.0, 0.0, 10.0), Vec3::Z.neg()).unwrap();
        let camera = Point3::new(0.0, 0.0, 100.0);
        let cut = PickOptions {
            radius: 1.0,
            distance_cutoff: Some(50.0),
        };
        assert!(pick_spine(&ray, &spine, camera, cut, |_| true).is_empty());

        let negative = PickOptions {
            radius: 1.0,
            distance_cutoff: Some(-1.0),
        };
        assert_eq!(pick_spine(&ray, &spine, camera, negative, |_| true).len(), 1);
    }

    #[test]
    fn clip_rejects_hits() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::new(10.0, 0.0, 0.0)]);
        let ray = PickRay::new(Point3::new(5.0, 0.0, 10.0), Vec3::Z.neg()).unwrap();
        assert!(pick_spine(&ray, &spine, Point3::ORIGIN, options(1.0), |p| p.z > 1.0).is_empty());
    }
}
