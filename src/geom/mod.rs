mod cache;
mod core;
mod diagnostics;
mod extrusion;
mod frame;
mod lod;
mod metrics;
mod pick;
mod render;
mod spine;

pub use cache::{CachedMesh, MeshCache, MeshCacheStats};
pub use core::{BBox, Point3, Tolerance, Transform, Vec2, Vec3};
pub use diagnostics::ExtrusionDiagnostics;
pub use extrusion::{
    AxisRotation, ExtrusionMesh, ExtrusionOptions, MeshError, extrude, extrude_with_tolerance,
};
pub use frame::{FrameSet, FrameStats, SpineFrame, compute_spine_frames};
pub use lod::{
    DrawCommand, LodBatch, LodMode, LodThresholds, batches_to_draw_commands, select_lod_batches,
    select_lod_draw_commands,
};
pub use metrics::{GeomMetrics, GeomTimingReport, TimingBucket};
pub use pick::{PickHit, PickOptions, PickRay, pick_spine};
pub use render::{Color, DrawCounter, DrawTarget, LineVertex, StripVertex, replay_draw_commands};
pub use spine::{CrossSection, MAX_CIRCLE_SEGMENTS, MIN_CIRCLE_SEGMENTS, Spine, circle_points};

#[cfg(test)]
mod tests;
