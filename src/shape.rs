//! The level-of-detail extrusion shape.
//!
//! [`LodExtrusion`] owns the sweep inputs, regenerates its mesh lazily after
//! any geometric input changes and answers the queries a scene traversal
//! asks of a shape: bounds, primitive count, rendering and picking.

use std::sync::Arc;

use crate::geom::{
    AxisRotation, BBox, CachedMesh, Color, CrossSection, DrawCommand, DrawTarget, ExtrusionDiagnostics,
    ExtrusionMesh, ExtrusionOptions, LodBatch, LodThresholds, MeshCache, MeshCacheStats, PickHit,
    PickOptions, PickRay, Point3, Spine, Vec2, Vec3, extrude, pick_spine, replay_draw_commands,
    select_lod_batches, select_lod_draw_commands,
};

/// Swept tube drawn at a camera-dependent level of detail.
#[derive(Debug)]
pub struct LodExtrusion {
    spine: Spine,
    cross_section: CrossSection,
    color: Vec<Color>,
    radius: f64,
    circle_segments: usize,
    thresholds: LodThresholds,
    z_axis: Vec3,
    scale: Vec<[f64; 2]>,
    orientation: Vec<AxisRotation>,
    ccw: bool,
    pick_lines: bool,
    cache: MeshCache,
}

impl LodExtrusion {
    pub const DEFAULT_RADIUS: f64 = -1.0;
    pub const DEFAULT_CIRCLE_SEGMENTS: usize = 10;
    pub const DEFAULT_COLOR: Color = [1.0, 0.0, 0.0];

    #[must_use]
    pub fn new() -> Self {
        Self {
            spine: Spine::new(vec![Point3::ORIGIN, Point3::new(0.0, 1.0, 0.0)]),
            cross_section: CrossSection::unit_square(),
            color: vec![Self::DEFAULT_COLOR],
            radius: Self::DEFAULT_RADIUS,
            circle_segments: Self::DEFAULT_CIRCLE_SEGMENTS,
            thresholds: LodThresholds::default(),
            z_axis: Vec3::ZERO,
            scale: Vec::new(),
            orientation: Vec::new(),
            ccw: false,
            pick_lines: false,
            cache: MeshCache::new(),
        }
    }

    // ── inputs ──────────────────────────────────────────────────────────

    #[must_use]
    pub fn spine(&self) -> &Spine {
        &self.spine
    }

    pub fn set_spine(&mut self, points: Vec<Point3>) {
        self.spine = Spine::new(points);
        self.invalidate();
    }

    /// Replaces the spine with a closed loop through `points`.
    pub fn set_closed_spine(&mut self, points: Vec<Point3>) {
        self.spine = Spine::closed_loop(points);
        self.invalidate();
    }

    /// The cross-section as supplied, ignoring any auto-circle override.
    #[must_use]
    pub fn cross_section(&self) -> &CrossSection {
        &self.cross_section
    }

    pub fn set_cross_section(&mut self, points: Vec<Vec2>) {
        self.cross_section = CrossSection::new(points);
        self.invalidate();
    }

    /// Cross-section actually swept: a circle when `radius > 0`, otherwise
    /// the supplied polygon.
    #[must_use]
    pub fn effective_cross_section(&self) -> CrossSection {
        if self.radius > 0.0 {
            CrossSection::circle(self.radius, self.circle_segments)
        } else {
            self.cross_section.clone()
        }
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// A positive radius replaces the cross-section with a circle.
    pub fn set_radius(&mut self, radius: f64) {
        self.radius = radius;
        self.invalidate();
    }

    #[must_use]
    pub fn circle_segments(&self) -> usize {
        self.circle_segments
    }

    pub fn set_circle_segments(&mut self, segments: usize) {
        self.circle_segments = segments;
        self.invalidate();
    }

    #[must_use]
    pub fn color(&self) -> &[Color] {
        &self.color
    }

    /// Per spine point colours; only used when there is one per supplied
    /// spine point.
    pub fn set_color(&mut self, color: Vec<Color>) {
        self.color = color;
    }

    #[must_use]
    pub fn thresholds(&self) -> LodThresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: LodThresholds) {
        self.thresholds = thresholds;
    }

    #[must_use]
    pub fn z_axis(&self) -> Vec3 {
        self.z_axis
    }

    /// Locks every frame's Z axis; the zero vector unlocks it.
    pub fn set_z_axis(&mut self, axis: Vec3) {
        self.z_axis = axis;
        self.invalidate();
    }

    pub fn set_scale(&mut self, scale: Vec<[f64; 2]>) {
        self.scale = scale;
        self.invalidate();
    }

    pub fn set_orientation(&mut self, orientation: Vec<AxisRotation>) {
        self.orientation = orientation;
        self.invalidate();
    }

    #[must_use]
    pub fn ccw(&self) -> bool {
        self.ccw
    }

    pub fn set_ccw(&mut self, ccw: bool) {
        self.ccw = ccw;
        self.invalidate();
    }

    #[must_use]
    pub fn pick_lines(&self) -> bool {
        self.pick_lines
    }

    /// Extends picking out to the far threshold, covering line-drawn runs.
    pub fn set_pick_lines(&mut self, pick_lines: bool) {
        self.pick_lines = pick_lines;
    }

    #[must_use]
    pub fn options(&self) -> ExtrusionOptions {
        ExtrusionOptions {
            lock_axis: (self.z_axis != Vec3::ZERO).then_some(self.z_axis),
            scale: self.scale.clone(),
            orientation: self.orientation.clone(),
            ccw: self.ccw,
        }
    }

    // ── mesh cache ──────────────────────────────────────────────────────

    /// Marks the mesh stale; the next query regenerates it.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.cache.is_dirty()
    }

    /// Current mesh and diagnostics, regenerating if an input changed.
    pub fn generate(&mut self) -> &CachedMesh {
        let section = self.effective_cross_section();
        let options = self.options();
        let spine = &self.spine;
        self.cache.get_or_generate(|| {
            log::debug!(
                "regenerating extrusion: {} spine points, {} section points",
                spine.len(),
                section.len()
            );
            extrude(spine, &section, &options)
        })
    }

    pub fn mesh(&mut self) -> Arc<ExtrusionMesh> {
        Arc::clone(&self.generate().mesh)
    }

    pub fn diagnostics(&mut self) -> ExtrusionDiagnostics {
        self.generate().diagnostics.clone()
    }

    #[must_use]
    pub fn cache_stats(&self) -> MeshCacheStats {
        self.cache.stats()
    }

    // ── queries ─────────────────────────────────────────────────────────

    /// Bounds of the mesh vertices together with the spine points.
    pub fn bounding_box(&mut self) -> Option<BBox> {
        let spine_box = BBox::from_points(self.spine.points().iter().copied());
        let mesh_box = self.generate().mesh.bounding_box();
        match (mesh_box, spine_box) {
            (Some(a), Some(b)) => Some(a.union(b)),
            (a, b) => a.or(b),
        }
    }

    /// Triangles across all strips.
    pub fn triangle_count(&mut self) -> usize {
        self.generate().mesh.triangle_count()
    }

    #[must_use]
    pub fn lod_batches(&self, camera: Point3) -> Vec<LodBatch> {
        select_lod_batches(&self.spine, camera, self.thresholds)
    }

    #[must_use]
    pub fn draw_commands(&self, camera: Point3) -> Vec<DrawCommand> {
        select_lod_draw_commands(&self.spine, camera, self.thresholds)
    }

    /// Draws the shape as seen from `camera`.
    pub fn render(&mut self, camera: Point3, target: &mut dyn DrawTarget) {
        let commands = self.draw_commands(camera);
        let mesh = self.mesh();
        let colors = (self.color.len() == self.spine.source_len()).then_some(self.color.as_slice());
        replay_draw_commands(&mesh, &self.spine, colors, &commands, target);
    }

    /// Capsule radius used for picking: the tube radius, or the widest
    /// cross-section point when no radius is set.
    #[must_use]
    pub fn pick_radius(&self) -> f64 {
        if self.radius > 0.0 {
            self.radius
        } else {
            self.cross_section.max_extent()
        }
    }

    /// Camera distance beyond which segments are not pickable; `None` when
    /// the relevant threshold is negative.
    #[must_use]
    pub fn pick_cutoff(&self) -> Option<f64> {
        let cutoff = if self.pick_lines {
            self.thresholds.far
        } else {
            self.thresholds.near
        };
        (cutoff >= 0.0).then_some(cutoff)
    }

    #[must_use]
    pub fn pick(&self, ray: &PickRay, camera: Point3, clip: impl Fn(Point3) -> bool) -> Vec<PickHit> {
        let options = PickOptions {
            radius: self.pick_radius(),
            distance_cutoff: self.pick_cutoff(),
        };
        pick_spine(ray, &self.spine, camera, options, clip)
    }
}

impl Default for LodExtrusion {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_node_fields() {
        let shape = LodExtrusion::new();
        assert_eq!(shape.spine().len(), 2);
        assert_eq!(shape.cross_section().len(), 4);
        assert!(shape.cross_section().is_closed());
        assert_eq!(shape.radius(), -1.0);
        assert_eq!(shape.circle_segments(), 10);
        assert_eq!(shape.thresholds(), LodThresholds::new(1000.0, -1.0));
        assert_eq!(shape.z_axis(), Vec3::ZERO);
        assert!(shape.options().lock_axis.is_none());
        assert!(!shape.ccw());
        assert!(!shape.pick_lines());
        assert!(shape.is_dirty());
    }

    #[test]
    fn default_shape_generates_square_tube() {
        let mut shape = LodExtrusion::new();
        let mesh = shape.mesh();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.segment_count(), 1);
        assert_eq!(mesh.strip_len(0), 10);
        assert_eq!(shape.triangle_count(), 8);
    }

    #[test]
    fn lod_inputs_do_not_invalidate() {
        let mut shape = LodExtrusion::new();
        shape.generate();
        shape.set_thresholds(LodThresholds::new(5.0, 10.0));
        shape.set_color(vec![[0.0, 1.0, 0.0]]);
        shape.set_pick_lines(true);
        assert!(!shape.is_dirty());

        shape.set_ccw(true);
        assert!(shape.is_dirty());
    }

    #[test]
    fn huge_circle_segment_count_is_clamped() {
        let mut shape = LodExtrusion::new();
        shape.set_radius(1.0);
        shape.set_circle_segments(usize::MAX);
        assert_eq!(shape.effective_cross_section().len(), crate::geom::MAX_CIRCLE_SEGMENTS);
        assert_eq!(shape.mesh().ring_size, crate::geom::MAX_CIRCLE_SEGMENTS);
    }

    #[test]
    fn pick_cutoff_follows_pick_lines() {
        let mut shape = LodExtrusion::new();
        shape.set_thresholds(LodThresholds::new(100.0, 400.0));
        assert_eq!(shape.pick_cutoff(), Some(100.0));
        shape.set_pick_lines(true);
        assert_eq!(shape.pick_cutoff(), Some(400.0));
        shape.set_thresholds(LodThresholds::new(100.0, -1.0));
        assert_eq!(shape.pick_cutoff(), None);
    }

    #[test]
    fn pick_radius_falls_back_to_section_extent() {
        let mut shape = LodExtrusion::new();
        assert!((shape.pick_radius() - 2.0_f64.sqrt()).abs() < 1e-12);
        shape.set_radius(0.25);
        assert_eq!(shape.pick_radius(), 0.25);
    }
}
