//! Diagnostics for extrusion mesh generation.
//!
//! Generation never fails; every degenerate input is resolved by a geometric
//! fallback. This module records which fallbacks were taken so callers (and
//! the CLI snapshots) can see why a tube looks the way it does.
//!
//! # Example
//!
//! ```ignore
//! use lod_extrusion::geom::{extrude, ExtrusionOptions};
//!
//! let (mesh, diagnostics) = extrude(&spine, &section, &ExtrusionOptions::default());
//! if !diagnostics.is_clean() {
//!     for warning in &diagnostics.warnings {
//!         eprintln!("Warning: {warning}");
//!     }
//! }
//! ```

use std::fmt;

use super::frame::FrameStats;

/// Summary of one mesh generation pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExtrusionDiagnostics {
    /// Total number of vertices in the mesh.
    pub vertex_count: usize,

    /// Triangles implied by the strips.
    pub triangle_count: usize,

    /// Number of triangle strips (one per spine segment).
    pub strip_count: usize,

    /// Spine points whose tangent had zero length.
    pub degenerate_tangent_count: usize,

    /// Spine points where the previous frame's Z axis was reused because the
    /// neighboring segments were anti-parallel.
    pub antiparallel_fallback_count: usize,

    /// Spine points where Z was synthesized from the tangent's dominant
    /// component.
    pub synthesized_axis_count: usize,

    /// Spine points where twist minimization selected a different axis.
    pub twist_correction_count: usize,

    /// Whether the final strip winding was reversed.
    pub winding_reversed: bool,

    /// Optional timing breakdown.
    ///
    /// Only populated when the `extrusion_metrics` feature is enabled and the
    /// target is not WASM.
    pub timing: Option<super::metrics::GeomTimingReport>,

    /// Human-readable notes about the fallbacks above and about inputs that
    /// produced an empty mesh.
    pub warnings: Vec<String>,
}

impl ExtrusionDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies frame fallback counters into the diagnostics.
    pub fn record_frames(&mut self, stats: &FrameStats) {
        self.degenerate_tangent_count = stats.degenerate_tangents;
        self.antiparallel_fallback_count = stats.antiparallel_fallbacks;
        self.synthesized_axis_count = stats.synthesized_axes;
        self.twist_correction_count = stats.twist_corrections;

        if stats.degenerate_tangents > 0 {
            self.add_warning(format!(
                "{} spine points have a zero-length tangent",
                stats.degenerate_tangents
            ));
        }
        if stats.synthesized_axes > 0 {
            self.add_warning(format!(
                "{} frames use a synthesized axis",
                stats.synthesized_axes
            ));
        }
    }

    /// Total number of frame fallbacks of any kind. Anti-parallel reuse is
    /// excluded since it is the normal path for straight spine runs.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.degenerate_tangent_count + self.synthesized_axis_count + self.twist_correction_count
    }

    /// Returns `true` if no fallbacks were needed and no warnings recorded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fallback_count() == 0 && self.warnings.is_empty()
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Short summary suitable for logging: `"V:{vertices} T:{triangles} S:{strips} [notes...]"`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!(
            "V:{} T:{} S:{}",
            self.vertex_count, self.triangle_count, self.strip_count
        )];

        if self.degenerate_tangent_count > 0 {
            parts.push(format!("degenerate-tangent:{}", self.degenerate_tangent_count));
        }
        if self.antiparallel_fallback_count > 0 {
            parts.push(format!("antiparallel:{}", self.antiparallel_fallback_count));
        }
        if self.synthesized_axis_count > 0 {
            parts.push(format!("synthesized:{}", self.synthesized_axis_count));
        }
        if self.twist_correction_count > 0 {
            parts.push(format!("twist:{}", self.twist_correction_count));
        }
        if self.winding_reversed {
            parts.push("reversed".to_string());
        }

        parts.join(" ")
    }
}

impl fmt::Display for ExtrusionDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extrusion Diagnostics:")?;
        writeln!(f, "  Vertices: {}", self.vertex_count)?;
        writeln!(f, "  Triangles: {}", self.triangle_count)?;
        writeln!(f, "  Strips: {}", self.strip_count)?;

        if self.fallback_count() > 0 || self.antiparallel_fallback_count > 0 {
            writeln!(f, "  Frame fallbacks:")?;
            if self.degenerate_tangent_count > 0 {
                writeln!(f, "    - Degenerate tangents: {}", self.degenerate_tangent_count)?;
            }
            if self.antiparallel_fallback_count > 0 {
                writeln!(f, "    - Anti-parallel reuse: {}", self.antiparallel_fallback_count)?;
            }
            if self.synthesized_axis_count > 0 {
                writeln!(f, "    - Synthesized axes: {}", self.synthesized_axis_count)?;
            }
            if self.twist_correction_count > 0 {
                writeln!(f, "    - Twist corrections: {}", self.twist_correction_count)?;
            }
        }

        writeln!(f, "  Winding: {}", if self.winding_reversed { "reversed" } else { "default" })?;

        if !self.warnings.is_empty() {
            writeln!(f, "  Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "    - {warning}")?;
            }
        }

        if let Some(ref timing) = self.timing {
            writeln!(f, "  Timing: {} ms total", timing.total_ms())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_clean() {
        let diag = ExtrusionDiagnostics::default();
        assert!(diag.is_clean());
        assert_eq!(diag.fallback_count(), 0);
    }

    #[test]
    fn test_antiparallel_alone_is_clean() {
        let diag = ExtrusionDiagnostics {
            antiparallel_fallback_count: 4,
            ..Default::default()
        };
        assert!(diag.is_clean());
        assert!(diag.summary().contains("antiparallel:4"));
    }

    #[test]
    fn test_record_frames_adds_warnings() {
        let mut diag = ExtrusionDiagnostics::default();
        diag.record_frames(&FrameStats {
            degenerate_tangents: 2,
            synthesized_axes: 1,
            ..Default::default()
        });
        assert_eq!(diag.fallback_count(), 3);
        assert_eq!(diag.warnings.len(), 2);
        assert!(!diag.is_clean());
    }

    #[test]
    fn test_summary_and_display() {
        let diag = ExtrusionDiagnostics {
            vertex_count: 40,
            triangle_count: 64,
            strip_count: 4,
            twist_correction_count: 1,
            winding_reversed: true,
            warnings: vec!["test warning".to_string()],
            ..Default::default()
        };

        let summary = diag.summary();
        assert!(summary.contains("V:40"));
        assert!(summary.contains("T:64"));
        assert!(summary.contains("twist:1"));
        assert!(summary.contains("reversed"));

        let output = format!("{diag}");
        assert!(output.contains("Strips: 4"));
        assert!(output.contains("Twist corrections: 1"));
        assert!(output.contains("test warning"));
    }
}
