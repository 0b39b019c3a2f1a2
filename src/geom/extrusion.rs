//! Swept-surface mesh generation.
//!
//! A cross-section polygon is placed on every spine frame and consecutive
//! rings are stitched into one triangle strip per spine segment. Strips are
//! kept separate (with recorded offsets) so the LOD selector can draw any
//! subset of segments without re-indexing.

use super::diagnostics::ExtrusionDiagnostics;
use super::frame::{FrameSet, SpineFrame, compute_spine_frames};
use super::metrics::{GeomMetrics, TimingBucket};
use super::spine::{CrossSection, Spine};
use super::{BBox, Point3, Tolerance, Transform, Vec3};

/// Rotation about an arbitrary axis, applied to the cross-section in frame
/// space before it is placed on the spine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisRotation {
    pub axis: Vec3,
    /// Radians, right-handed about `axis`.
    pub angle: f64,
}

impl AxisRotation {
    #[must_use]
    pub const fn new(axis: Vec3, angle: f64) -> Self {
        Self { axis, angle }
    }

    /// Rotation matrix, or `None` when the axis has no direction.
    #[must_use]
    pub fn transform(&self) -> Option<Transform> {
        Transform::rotate_axis(self.axis, self.angle)
    }
}

/// Inputs that shape the sweep besides spine and cross-section.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionOptions {
    /// Pins every frame's Z axis. Zero-length axes are ignored.
    pub lock_axis: Option<Vec3>,
    /// Per spine point `(sx, sz)` scale of the cross-section. The last value
    /// repeats for the remaining points; empty means no scaling.
    pub scale: Vec<[f64; 2]>,
    /// Per spine point rotation of the cross-section, clamped like `scale`.
    pub orientation: Vec<AxisRotation>,
    /// Flips the final strip winding.
    pub ccw: bool,
}

impl ExtrusionOptions {
    /// Local cross-section transform at spine point `i`: scale, then rotation.
    fn local_transform(&self, i: usize) -> Transform {
        let scale = clamped(&self.scale, i)
            .map_or_else(Transform::identity, |[sx, sz]| Transform::scale(*sx, 1.0, *sz));
        let rotation = clamped(&self.orientation, i)
            .and_then(AxisRotation::transform)
            .unwrap_or_else(Transform::identity);
        rotation * scale
    }
}

fn clamped<T>(values: &[T], index: usize) -> Option<&T> {
    values.get(index).or_else(|| values.last())
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    #[error("vertex {index} has non-finite data")]
    NonFiniteVertex { index: usize },
    #[error("strip index {value} at position {position} exceeds vertex count {vertex_count}")]
    IndexOutOfRange {
        position: usize,
        value: u32,
        vertex_count: usize,
    },
    #[error("{attribute} buffer has {actual} entries, expected {expected}")]
    AttributeLength {
        attribute: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("segment offsets do not partition the index stream")]
    InconsistentOffsets,
}

/// Triangle-strip tube produced by [`extrude`].
///
/// Vertex `j` of ring `i` lives at `i * ring_size + j`. Strip `s` occupies
/// `indices[segment_offsets[s]..segment_offsets[s + 1]]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtrusionMesh {
    pub positions: Vec<[f64; 3]>,
    pub normals: Vec<[f64; 3]>,
    pub uvs: Vec<[f64; 2]>,
    /// Spine point (ring) each vertex belongs to.
    pub spine_indices: Vec<u32>,
    pub indices: Vec<u32>,
    /// `segment_count + 1` entries; the last equals `indices.len()`.
    pub segment_offsets: Vec<usize>,
    pub ring_size: usize,
    pub ring_count: usize,
    pub spine_closed: bool,
    pub cross_section_closed: bool,
    /// Final winding after parity and the `ccw` flag.
    pub reversed: bool,
}

impl ExtrusionMesh {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segment_offsets.len().saturating_sub(1)
    }

    /// Index stream of one segment's triangle strip.
    #[must_use]
    pub fn strip(&self, segment: usize) -> Option<&[u32]> {
        let start = *self.segment_offsets.get(segment)?;
        let end = *self.segment_offsets.get(segment + 1)?;
        self.indices.get(start..end)
    }

    #[must_use]
    pub fn strip_len(&self, segment: usize) -> usize {
        self.strip(segment).map_or(0, <[u32]>::len)
    }

    pub fn strips(&self) -> impl Iterator<Item = &[u32]> + '_ {
        (0..self.segment_count()).filter_map(move |s| self.strip(s))
    }

    /// Triangles implied by the strips: `Σ max(len − 2, 0)`.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.strips().map(|strip| strip.len().saturating_sub(2)).sum()
    }

    /// Expands all strips into an indexed triangle list. Odd triangles are
    /// flipped so every triangle keeps the strip's facing.
    #[must_use]
    pub fn to_triangle_list(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.triangle_count() * 3);
        for strip in self.strips() {
            for (k, tri) in strip.windows(3).enumerate() {
                if k % 2 == 0 {
                    out.extend_from_slice(&[tri[0], tri[1], tri[2]]);
                } else {
                    out.extend_from_slice(&[tri[1], tri[0], tri[2]]);
                }
            }
        }
        out
    }

    /// Bounds of the generated vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Option<BBox> {
        BBox::from_points(self.positions.iter().copied().map(Point3::from))
    }

    pub fn validate(&self) -> Result<(), MeshError> {
        let n = self.positions.len();
        for (attribute, actual) in [
            ("normal", self.normals.len()),
            ("uv", self.uvs.len()),
            ("spine index", self.spine_indices.len()),
        ] {
            if actual != n {
                return Err(MeshError::AttributeLength {
                    attribute,
                    expected: n,
                    actual,
                });
            }
        }

        for index in 0..n {
            if !all_finite(&self.positions[index])
                || !all_finite(&self.normals[index])
                || !all_finite(&self.uvs[index])
            {
                return Err(MeshError::NonFiniteVertex { index });
            }
        }

        if let Some((position, &value)) = self
            .indices
            .iter()
            .enumerate()
            .find(|&(_, &value)| value as usize >= n)
        {
            return Err(MeshError::IndexOutOfRange {
                position,
                value,
                vertex_count: n,
            });
        }

        let offsets_ok = match (self.segment_offsets.first(), self.segment_offsets.last()) {
            (Some(&0), Some(&last)) => {
                last == self.indices.len() && self.segment_offsets.windows(2).all(|w| w[0] <= w[1])
            }
            (None, None) => self.indices.is_empty(),
            _ => false,
        };
        if !offsets_ok {
            return Err(MeshError::InconsistentOffsets);
        }
        Ok(())
    }

    /// Position buffer as `[x0, y0, z0, x1, ...]`.
    #[must_use]
    pub fn positions_flat(&self) -> &[f64] {
        self.positions.as_flattened()
    }

    #[must_use]
    pub fn normals_flat(&self) -> &[f64] {
        self.normals.as_flattened()
    }

    #[must_use]
    pub fn uvs_flat(&self) -> &[f64] {
        self.uvs.as_flattened()
    }
}

fn all_finite(values: &[f64]) -> bool {
    values.iter().all(|c| c.is_finite())
}

/// Sweeps `cross_section` along `spine` with the frame tolerance.
#[must_use]
pub fn extrude(
    spine: &Spine,
    cross_section: &CrossSection,
    options: &ExtrusionOptions,
) -> (ExtrusionMesh, ExtrusionDiagnostics) {
    extrude_with_tolerance(spine, cross_section, options, Tolerance::FRAME)
}

#[must_use]
pub fn extrude_with_tolerance(
    spine: &Spine,
    cross_section: &CrossSection,
    options: &ExtrusionOptions,
    tol: Tolerance,
) -> (ExtrusionMesh, ExtrusionDiagnostics) {
    let mut diagnostics = ExtrusionDiagnostics::new();
    let mut mesh = ExtrusionMesh {
        spine_closed: spine.is_closed(),
        cross_section_closed: cross_section.is_closed(),
        ..ExtrusionMesh::default()
    };

    if !spine.is_sweepable() {
        diagnostics.add_warning(format!(
            "spine has {} unique points; at least 2 are required",
            spine.len()
        ));
        return (mesh, diagnostics);
    }
    if cross_section.is_empty() {
        diagnostics.add_warning("cross-section has no points");
        return (mesh, diagnostics);
    }

    let mut metrics = GeomMetrics::default();
    metrics.begin();

    let frames = metrics.time(TimingBucket::Frames, || {
        compute_spine_frames(spine, options.lock_axis, tol)
    });
    diagnostics.record_frames(&frames.stats);

    metrics.time(TimingBucket::Vertices, || {
        place_rings(&mut mesh, &frames, spine, cross_section, options, tol);
    });

    mesh.reversed = frames.is_reversed() ^ options.ccw;
    metrics.time(TimingBucket::Strips, || build_strips(&mut mesh, spine));

    diagnostics.vertex_count = mesh.vertex_count();
    diagnostics.triangle_count = mesh.triangle_count();
    diagnostics.strip_count = mesh.segment_count();
    diagnostics.winding_reversed = mesh.reversed;
    diagnostics.timing = metrics.end();

    log::debug!("extrusion mesh: {}", diagnostics.summary());
    (mesh, diagnostics)
}

fn place_rings(
    mesh: &mut ExtrusionMesh,
    frames: &FrameSet,
    spine: &Spine,
    cross_section: &CrossSection,
    options: &ExtrusionOptions,
    tol: Tolerance,
) {
    let ring_size = cross_section.len();
    let ring_count = frames.frames.len();
    let total = ring_size * ring_count;

    mesh.ring_size = ring_size;
    mesh.ring_count = ring_count;
    mesh.positions.reserve(total);
    mesh.normals.reserve(total);
    mesh.uvs.reserve(total);
    mesh.spine_indices.reserve(total);

    let u_denominator = ring_size.saturating_sub(1);
    let v_denominator = if spine.is_closed() { ring_count } else { ring_count - 1 };

    for (i, frame) in frames.frames.iter().enumerate() {
        let placement = frame.transform() * options.local_transform(i);
        let v = ratio(i, v_denominator);

        for (j, point) in cross_section.points().iter().enumerate() {
            let position = placement.apply_point(Point3::new(point.x, 0.0, point.y));
            let normal = ring_normal(frame, position, point.length(), tol);

            mesh.positions.push(position.to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([ratio(j, u_denominator), v]);
            mesh.spine_indices.push(i as u32);
        }
    }
}

/// Radial direction from the spine point, or the frame Z for a section
/// point sitting on the spine.
fn ring_normal(frame: &SpineFrame, position: Point3, section_radius: f64, tol: Tolerance) -> Vec3 {
    if section_radius <= tol.eps {
        return frame.z;
    }
    let mut normal = position - frame.origin;
    if normal.normalize_checked(tol) <= tol.eps {
        return frame.z;
    }
    normal
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn build_strips(mesh: &mut ExtrusionMesh, spine: &Spine) {
    let ring_size = mesh.ring_size;
    let segments = spine.segment_count();
    let strip_len = 2 * ring_size + if mesh.cross_section_closed { 2 } else { 0 };

    mesh.indices.reserve(segments * strip_len);
    mesh.segment_offsets.reserve(segments + 1);
    mesh.segment_offsets.push(0);

    for segment in 0..segments {
        let start = (segment * ring_size) as u32;
        let end = (spine.next_index(segment) * ring_size) as u32;
        let columns = (0..ring_size as u32).chain(mesh.cross_section_closed.then_some(0));
        for j in columns {
            let (a, b) = (start + j, end + j);
            debug_assert!((b as usize) < mesh.positions.len());
            if mesh.reversed {
                mesh.indices.extend_from_slice(&[b, a]);
            } else {
                mesh.indices.extend_from_slice(&[a, b]);
            }
        }
        mesh.segment_offsets.push(mesh.indices.len());
    }
}
