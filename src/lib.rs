#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod parse;
pub mod shape;

pub use shape::LodExtrusion;

use std::fmt;

use geom::{DrawCommand, LodThresholds, PickRay, Point3, Vec2, Vec3};
use serde::Serialize;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
enum DrawCommandExport {
    TriangleStrip { segment: usize },
    LineStrip { points: Vec<usize> },
}

impl From<DrawCommand> for DrawCommandExport {
    fn from(command: DrawCommand) -> Self {
        match command {
            DrawCommand::TriangleStrip { segment } => Self::TriangleStrip { segment },
            DrawCommand::LineStrip { points } => Self::LineStrip { points },
        }
    }
}

#[derive(Debug, Serialize)]
struct MeshStats {
    vertex_count: usize,
    triangle_count: usize,
    segment_count: usize,
    ring_size: usize,
    reversed: bool,
    spine_closed: bool,
    cross_section_closed: bool,
    summary: String,
    warnings: Vec<String>,
    cache_hits: usize,
    cache_misses: usize,
}

#[derive(Debug, Serialize)]
struct PickExport {
    point: [f64; 3],
    spine_point: [f64; 3],
    segment: usize,
    distance: f64,
    ray_parameter: f64,
}

/// Public entry point for JavaScript consumers.
#[wasm_bindgen]
pub struct ExtrusionEngine {
    shape: LodExtrusion,
}

#[wasm_bindgen]
impl ExtrusionEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> ExtrusionEngine {
        ExtrusionEngine {
            shape: LodExtrusion::new(),
        }
    }

    /// Replaces the shape with one read from an XML description.
    #[wasm_bindgen]
    pub fn load_xml(&mut self, xml: &str) -> Result<(), JsValue> {
        self.shape = parse::extrusion_xml::parse_str(xml).map_err(to_js_error)?;
        debug_log!("loaded extrusion with {} spine points", self.shape.spine().source_len());
        Ok(())
    }

    /// Sets the spine from packed `[x0, y0, z0, x1, ...]` coordinates.
    #[wasm_bindgen]
    pub fn set_spine(&mut self, coords: Vec<f64>) -> Result<(), JsValue> {
        let points = unpack::<3>(&coords, "spine")?
            .into_iter()
            .map(Point3::from_array)
            .collect();
        self.shape.set_spine(points);
        Ok(())
    }

    /// Sets the cross-section from packed `[x0, y0, x1, y1, ...]` coordinates.
    #[wasm_bindgen]
    pub fn set_cross_section(&mut self, coords: Vec<f64>) -> Result<(), JsValue> {
        let points = unpack::<2>(&coords, "cross-section")?
            .into_iter()
            .map(Vec2::from)
            .collect();
        self.shape.set_cross_section(points);
        Ok(())
    }

    /// Sets per spine point colours from packed `[r0, g0, b0, ...]` values.
    #[wasm_bindgen]
    pub fn set_colors(&mut self, rgb: Vec<f64>) -> Result<(), JsValue> {
        let colors = unpack::<3>(&rgb, "color")?;
        self.shape.set_color(colors);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_radius(&mut self, radius: f64) -> Result<(), JsValue> {
        if !radius.is_finite() {
            return Err(js_error("radius must be a finite number"));
        }
        self.shape.set_radius(radius);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_circle_segments(&mut self, segments: u32) {
        self.shape.set_circle_segments(segments as usize);
    }

    #[wasm_bindgen]
    pub fn set_lod_distances(&mut self, near: f64, far: f64) -> Result<(), JsValue> {
        if !near.is_finite() || !far.is_finite() {
            return Err(js_error("LOD distances must be finite numbers"));
        }
        self.shape.set_thresholds(LodThresholds::new(near, far));
        Ok(())
    }

    /// Locks the frame Z axis; `(0, 0, 0)` unlocks it.
    #[wasm_bindgen]
    pub fn set_z_axis(&mut self, x: f64, y: f64, z: f64) {
        self.shape.set_z_axis(Vec3::new(x, y, z));
    }

    #[wasm_bindgen]
    pub fn set_ccw(&mut self, ccw: bool) {
        self.shape.set_ccw(ccw);
    }

    #[wasm_bindgen]
    pub fn set_pick_lines(&mut self, pick_lines: bool) {
        self.shape.set_pick_lines(pick_lines);
    }

    #[wasm_bindgen]
    pub fn positions(&mut self) -> Vec<f64> {
        self.shape.mesh().positions_flat().to_vec()
    }

    #[wasm_bindgen]
    pub fn normals(&mut self) -> Vec<f64> {
        self.shape.mesh().normals_flat().to_vec()
    }

    #[wasm_bindgen]
    pub fn uvs(&mut self) -> Vec<f64> {
        self.shape.mesh().uvs_flat().to_vec()
    }

    /// Concatenated triangle-strip indices; see [`Self::segment_offsets`].
    #[wasm_bindgen]
    pub fn strip_indices(&mut self) -> Vec<u32> {
        self.shape.mesh().indices.clone()
    }

    #[wasm_bindgen]
    pub fn segment_offsets(&mut self) -> Vec<u32> {
        self.shape
            .mesh()
            .segment_offsets
            .iter()
            .map(|&offset| u32::try_from(offset).unwrap_or(u32::MAX))
            .collect()
    }

    /// Strips expanded into a plain triangle list.
    #[wasm_bindgen]
    pub fn triangle_indices(&mut self) -> Vec<u32> {
        self.shape.mesh().to_triangle_list()
    }

    /// LOD draw commands for a camera position.
    #[wasm_bindgen]
    pub fn draw_commands(&self, x: f64, y: f64, z: f64) -> Result<JsValue, JsValue> {
        let commands: Vec<DrawCommandExport> = self
            .shape
            .draw_commands(Point3::new(x, y, z))
            .into_iter()
            .map(DrawCommandExport::from)
            .collect();
        serde_wasm_bindgen::to_value(&commands).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn stats(&mut self) -> Result<JsValue, JsValue> {
        let mesh = self.shape.mesh();
        let diagnostics = self.shape.diagnostics();
        let cache = self.shape.cache_stats();
        let stats = MeshStats {
            vertex_count: mesh.vertex_count(),
            triangle_count: mesh.triangle_count(),
            segment_count: mesh.segment_count(),
            ring_size: mesh.ring_size,
            reversed: mesh.reversed,
            spine_closed: mesh.spine_closed,
            cross_section_closed: mesh.cross_section_closed,
            summary: diagnostics.summary(),
            warnings: diagnostics.warnings,
            cache_hits: cache.hits,
            cache_misses: cache.misses,
        };
        serde_wasm_bindgen::to_value(&stats).map_err(to_js_error)
    }

    /// Picks along a ray; hits are ordered nearest first.
    #[wasm_bindgen]
    #[allow(clippy::too_many_arguments)]
    pub fn pick(
        &self,
        origin_x: f64,
        origin_y: f64,
        origin_z: f64,
        dir_x: f64,
        dir_y: f64,
        dir_z: f64,
        camera_x: f64,
        camera_y: f64,
        camera_z: f64,
    ) -> Result<JsValue, JsValue> {
        let ray = PickRay::new(
            Point3::new(origin_x, origin_y, origin_z),
            Vec3::new(dir_x, dir_y, dir_z),
        )
        .ok_or_else(|| js_error("pick direction must be non-zero"))?;
        let hits: Vec<PickExport> = self
            .shape
            .pick(&ray, Point3::new(camera_x, camera_y, camera_z), |_| true)
            .into_iter()
            .map(|hit| PickExport {
                point: hit.point.to_array(),
                spine_point: hit.spine_point.to_array(),
                segment: hit.segment,
                distance: hit.distance,
                ray_parameter: hit.ray_parameter,
            })
            .collect();
        serde_wasm_bindgen::to_value(&hits).map_err(to_js_error)
    }
}

impl Default for ExtrusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn unpack<const N: usize>(values: &[f64], what: &str) -> Result<Vec<[f64; N]>, JsValue> {
    if values.len() % N != 0 {
        return Err(js_error(&format!(
            "{what} needs a multiple of {N} values, got {}",
            values.len()
        )));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(js_error(&format!("{what} contains non-finite values")));
    }
    Ok(values
        .chunks_exact(N)
        .map(|chunk| {
            let mut out = [0.0; N];
            out.copy_from_slice(chunk);
            out
        })
        .collect())
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen::JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
