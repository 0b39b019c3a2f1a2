//! Distance-based level of detail along the spine.
//!
//! The spine is walked from its first point. At the start of each batch the
//! camera distance to the current spine point picks a mode, and the batch
//! then runs for as much spine length as the distance to the nearest LOD
//! threshold; a segment cannot cross a threshold faster than its own length,
//! so the mode stays valid for the whole batch.

use std::ops::Range;

use super::Point3;
use super::spine::Spine;

/// Camera distance thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LodThresholds {
    /// Below this distance the full tube is drawn.
    pub near: f64,
    /// At or beyond this distance nothing is drawn. Values `<= 0` disable the
    /// far threshold.
    pub far: f64,
}

impl LodThresholds {
    pub const DEFAULT_NEAR: f64 = 1000.0;
    pub const DEFAULT_FAR: f64 = -1.0;

    #[must_use]
    pub const fn new(near: f64, far: f64) -> Self {
        Self { near, far }
    }

    /// Far threshold, if enabled.
    #[must_use]
    pub fn far_bound(&self) -> Option<f64> {
        (self.far > 0.0).then_some(self.far)
    }
}

impl Default for LodThresholds {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NEAR, Self::DEFAULT_FAR)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LodMode {
    /// Lit triangle strips.
    Full,
    /// Unlit polyline through the spine points.
    Line,
    /// Nothing.
    Skip,
}

impl LodMode {
    #[must_use]
    pub fn classify(distance: f64, thresholds: LodThresholds) -> Self {
        if distance < thresholds.near {
            return Self::Full;
        }
        match thresholds.far_bound() {
            Some(far) if distance >= far => Self::Skip,
            _ => Self::Line,
        }
    }

    /// Spine length this mode stays valid for, starting `distance` away from
    /// the camera.
    fn run_length(self, distance: f64, thresholds: LodThresholds) -> f64 {
        let to_near = (distance - thresholds.near).abs();
        let to_far = thresholds
            .far_bound()
            .map_or(f64::INFINITY, |far| (distance - far).abs());
        match self {
            Self::Full => to_near,
            Self::Line => to_near.min(to_far),
            Self::Skip => to_far,
        }
    }
}

/// Consecutive spine segments drawn with one mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LodBatch {
    pub mode: LodMode,
    pub segments: Range<usize>,
}

impl LodBatch {
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// One primitive to emit for a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    /// Draw the mesh strip of one spine segment.
    TriangleStrip { segment: usize },
    /// Draw a polyline through these spine point indices.
    LineStrip { points: Vec<usize> },
}

/// Splits the spine segments into LOD batches for a camera position. Every
/// segment belongs to exactly one batch and each batch holds at least one
/// segment.
#[must_use]
pub fn select_lod_batches(spine: &Spine, camera: Point3, thresholds: LodThresholds) -> Vec<LodBatch> {
    let lengths = spine.segment_lengths();
    let points = spine.points();
    let mut batches = Vec::new();
    let mut i = 0;

    while i < lengths.len() {
        let start = i;
        let distance = camera.distance_to(points[start]);
        let mode = LodMode::classify(distance, thresholds);
        let limit = mode.run_length(distance, thresholds);

        let mut accumulated = 0.0;
        loop {
            accumulated += lengths[i];
            i += 1;
            if accumulated >= limit || i == lengths.len() {
                break;
            }
        }

        batches.push(LodBatch {
            mode,
            segments: start..i,
        });
    }

    batches
}

/// Draw commands for a camera position; see [`select_lod_batches`].
#[must_use]
pub fn select_lod_draw_commands(spine: &Spine, camera: Point3, thresholds: LodThresholds) -> Vec<DrawCommand> {
    batches_to_draw_commands(spine, &select_lod_batches(spine, camera, thresholds))
}

#[must_use]
pub fn batches_to_draw_commands(spine: &Spine, batches: &[LodBatch]) -> Vec<DrawCommand> {
    let mut commands = Vec::new();
    for batch in batches {
        match batch.mode {
            LodMode::Full => {
                commands.extend(batch.segments.clone().map(|segment| DrawCommand::TriangleStrip { segment }));
            }
            LodMode::Line => {
                let Some(last) = batch.segments.clone().last() else {
                    continue;
                };
                let mut points: Vec<usize> = batch.segments.clone().collect();
                points.push(spine.next_index(last));
                commands.push(DrawCommand::LineStrip { points });
            }
            LodMode::Skip => {}
        }
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;

    fn straight_spine(count: usize) -> Spine {
        Spine::new((0..count).map(|i| Point3::new(i as f64, 0.0, 0.0)).collect())
    }

    #[test]
    fn classify_respects_disabled_far() {
        let t = LodThresholds::new(10.0, -1.0);
        assert_eq!(LodMode::classify(5.0, t), LodMode::Full);
        assert_eq!(LodMode::classify(10.0, t), LodMode::Line);
        assert_eq!(LodMode::classify(1e9, t), LodMode::Line);
    }

    #[test]
    fn classify_far_is_inclusive() {
        let t = LodThresholds::new(10.0, 50.0);
        assert_eq!(LodMode::classify(49.9, t), LodMode::Line);
        assert_eq!(LodMode::classify(50.0, t), LodMode::Skip);
    }

    #[test]
    fn near_camera_draws_everything() {
        let spine = straight_spine(5);
        let batches = select_lod_batches(&spine, Point3::ORIGIN, LodThresholds::default());
        assert_eq!(batches, vec![LodBatch { mode: LodMode::Full, segments: 0..4 }]);
    }

    #[test]
    fn zero_length_segments_still_advance() {
        let spine = Spine::new(vec![Point3::ORIGIN, Point3::ORIGIN, Point3::ORIGIN, Point3::new(1.0, 0.0, 0.0)]);
        let batches = select_lod_batches(&spine, Point3::new(10.0, 0.0, 0.0), LodThresholds::new(10.0, -1.0));
        let covered: usize = batches.iter().map(LodBatch::len).sum();
        assert_eq!(covered, spine.segment_count());
        assert!(batches.iter().all(|b| !b.is_empty()));
    }

    #[test]
    fn line_batch_closes_on_next_point() {
        let spine = straight_spine(4);
        let commands = select_lod_draw_commands(&spine, Point3::new(-100.0, 0.0, 0.0), LodThresholds::new(1.0, -1.0));
        assert_eq!(commands, vec![DrawCommand::LineStrip { points: vec![0, 1, 2, 3] }]);
    }

    #[test]
    fn closed_spine_line_wraps() {
        let spine = Spine::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ]);
        let commands = select_lod_draw_commands(&spine, Point3::new(0.0, 0.0, 500.0), LodThresholds::new(1.0, -1.0));
        assert_eq!(commands, vec![DrawCommand::LineStrip { points: vec![0, 1, 2, 0] }]);
    }

    #[test]
    fn far_camera_skips_everything() {
        let spine = straight_spine(6);
        let commands = select_lod_draw_commands(&spine, Point3::new(0.0, 0.0, 1000.0), LodThresholds::new(10.0, 50.0));
        assert!(commands.is_empty());
    }
}
