//! Replaying LOD draw commands into a rendering backend.
//!
//! Selection ([`super::lod`]) is pure; this module turns its commands into
//! vertex runs handed to a [`DrawTarget`]. Strip vertices come from the mesh,
//! line vertices from the spine.

use super::extrusion::ExtrusionMesh;
use super::lod::DrawCommand;
use super::spine::Spine;

/// RGB colour with components in `[0, 1]`.
pub type Color = [f64; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StripVertex {
    pub position: [f64; 3],
    pub normal: [f64; 3],
    pub uv: [f64; 2],
    pub color: Option<Color>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineVertex {
    pub position: [f64; 3],
    pub color: Option<Color>,
}

/// Backend receiving primitives.
pub trait DrawTarget {
    /// Lit triangle strip.
    fn triangle_strip(&mut self, vertices: &[StripVertex]);

    /// Unlit polyline.
    fn line_strip(&mut self, vertices: &[LineVertex]);
}

/// Emits every command into `target`. `colors` are per spine point and are
/// ignored unless they cover every point the mesh references.
pub fn replay_draw_commands(
    mesh: &ExtrusionMesh,
    spine: &Spine,
    colors: Option<&[Color]>,
    commands: &[DrawCommand],
    target: &mut dyn DrawTarget,
) {
    let colors = colors.filter(|c| c.len() >= spine.len());
    let color_at = |index: usize| colors.and_then(|c| c.get(index).copied());

    let mut strip = Vec::new();
    let mut line = Vec::new();
    for command in commands {
        match command {
            DrawCommand::TriangleStrip { segment } => {
                let Some(indices) = mesh.strip(*segment) else {
                    continue;
                };
                strip.clear();
                strip.extend(indices.iter().map(|&index| {
                    let v = index as usize;
                    StripVertex {
                        position: mesh.positions[v],
                        normal: mesh.normals[v],
                        uv: mesh.uvs[v],
                        color: color_at(mesh.spine_indices[v] as usize),
                    }
                }));
                target.triangle_strip(&strip);
            }
            DrawCommand::LineStrip { points } => {
                line.clear();
                line.extend(points.iter().filter_map(|&index| {
                    let point = spine.points().get(index)?;
                    Some(LineVertex {
                        position: point.to_array(),
                        color: color_at(index),
                    })
                }));
                if line.len() >= 2 {
                    target.line_strip(&line);
                }
            }
        }
    }
}

/// [`DrawTarget`] that only counts what it receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawCounter {
    pub triangle_strips: usize,
    pub strip_vertices: usize,
    pub triangles: usize,
    pub line_strips: usize,
    pub line_vertices: usize,
}

impl DrawTarget for DrawCounter {
    fn triangle_strip(&mut self, vertices: &[StripVertex]) {
        self.triangle_strips += 1;
        self.strip_vertices += vertices.len();
        self.triangles += vertices.len().saturating_sub(2);
    }

    fn line_strip(&mut self, vertices: &[LineVertex]) {
        self.line_strips += 1;
        self.line_vertices += vertices.len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::extrusion::{ExtrusionOptions, extrude};
    use crate::geom::spine::CrossSection;
    use crate::geom::Point3;

    #[derive(Default)]
    struct Recorder {
        strips: Vec<Vec<StripVertex>>,
        lines: Vec<Vec<LineVertex>>,
    }

    impl DrawTarget for Recorder {
        fn triangle_strip(&mut self, vertices: &[StripVertex]) {
            self.strips.push(vertices.to_vec());
        }

        fn line_strip(&mut self, vertices: &[LineVertex]) {
            self.lines.push(vertices.to_vec());
        }
    }

    fn fixture() -> (Spine, ExtrusionMesh) {
        let spine = Spine::new(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ]);
        let (mesh, _) = extrude(&spine, &CrossSection::unit_square(), &ExtrusionOptions::default());
        (spine, mesh)
    }

    #[test]
    fn strip_vertices_carry_spine_colors() {
        let (spine, mesh) = fixture();
        let colors = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        let mut recorder = Recorder::default();
        replay_draw_commands(
            &mesh,
            &spine,
            Some(colors.as_slice()),
            &[DrawCommand::TriangleStrip { segment: 1 }],
            &mut recorder,
        );

        assert_eq!(recorder.strips.len(), 1);
        let strip = &recorder.strips[0];
        assert_eq!(strip.len(), mesh.strip_len(1));
        assert!(strip.iter().all(|v| v.color == Some([0.0, 1.0, 0.0]) || v.color == Some([0.0, 0.0, 1.0])));
    }

    #[test]
    fn short_color_list_is_ignored() {
        let (spine, mesh) = fixture();
        let colors = [[1.0, 0.0, 0.0]];
        let mut recorder = Recorder::default();
        replay_draw_commands(
            &mesh,
            &spine,
            Some(colors.as_slice()),
            &[DrawCommand::LineStrip { points: vec![0, 1, 2] }],
            &mut recorder,
        );
        assert_eq!(recorder.lines.len(), 1);
        assert!(recorder.lines[0].iter().all(|v| v.color.is_none()));
    }

    #[test]
    fn counter_tallies_triangles() {
        let (spine, mesh) = fixture();
        let mut counter = DrawCounter::default();
        let commands = [
            DrawCommand::TriangleStrip { segment: 0 },
            DrawCommand::TriangleStrip { segment: 1 },
        ];
        replay_draw_commands(&mesh, &spine, None, &commands, &mut counter);
        assert_eq!(counter.triangle_strips, 2);
        assert_eq!(counter.triangles, mesh.triangle_count());
    }
}
