//! Parser for XML extrusion descriptions.
//!
//! ```xml
//! <extrusion radius="-1" circleSegments="10" lodDistance1="1000" lodDistance2="-1">
//!   <spine><point x="0" y="0" z="0"/><point x="0" y="1" z="0"/></spine>
//!   <crossSection><point x="1" y="1"/>...</crossSection>
//!   <color><rgb r="1" g="0" b="0"/></color>
//!   <zAxis x="0" y="0" z="1"/>
//! </extrusion>
//! ```
//!
//! Missing attributes and elements keep the [`LodExtrusion`] defaults.

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::geom::{AxisRotation, MAX_CIRCLE_SEGMENTS, Point3, Vec2, Vec3};
use crate::shape::LodExtrusion;

/// Result type for parsing extrusion descriptions.
pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug, Error)]
pub enum ParseError {
    /// The document could not be deserialized.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// A number was NaN or infinite.
    #[error("non-finite value in {field}")]
    NonFinite { field: &'static str },
    /// The circle segment count was negative.
    #[error("circleSegments must not be negative, got {0}")]
    NegativeSegments(i64),
    /// The circle segment count exceeded the supported maximum.
    #[error("circleSegments must be at most {max}, got {value}")]
    TooManySegments { value: i64, max: usize },
}

/// Reads a description and builds the shape it describes.
pub fn parse_str(input: &str) -> ParseResult<LodExtrusion> {
    log::debug!("parsing extrusion description ({} bytes)", input.len());
    let document: ExtrusionDocument = from_str(input)?;
    document.into_shape()
}

#[derive(Debug, Deserialize)]
struct ExtrusionDocument {
    #[serde(default, rename = "@radius")]
    radius: Option<f64>,
    #[serde(default, rename = "@circleSegments")]
    circle_segments: Option<i64>,
    #[serde(default, rename = "@lodDistance1")]
    lod_distance1: Option<f64>,
    #[serde(default, rename = "@lodDistance2")]
    lod_distance2: Option<f64>,
    #[serde(default, rename = "@ccw")]
    ccw: Option<bool>,
    #[serde(default, rename = "@pickLines")]
    pick_lines: Option<bool>,
    #[serde(default)]
    spine: Option<XmlPoints3>,
    #[serde(default, rename = "crossSection")]
    cross_section: Option<XmlPoints2>,
    #[serde(default)]
    color: Option<XmlColors>,
    #[serde(default, rename = "zAxis")]
    z_axis: Option<XmlPoint3>,
    #[serde(default)]
    scale: Option<XmlPoints2>,
    #[serde(default)]
    orientation: Option<XmlRotations>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlPoints3 {
    #[serde(default, rename = "point")]
    points: Vec<XmlPoint3>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlPoints2 {
    #[serde(default, rename = "point")]
    points: Vec<XmlPoint2>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlColors {
    #[serde(default, rename = "rgb")]
    colors: Vec<XmlRgb>,
}

#[derive(Debug, Default, Deserialize)]
struct XmlRotations {
    #[serde(default, rename = "rotation")]
    rotations: Vec<XmlRotation>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct XmlPoint3 {
    #[serde(default, rename = "@x")]
    x: f64,
    #[serde(default, rename = "@y")]
    y: f64,
    #[serde(default, rename = "@z")]
    z: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct XmlPoint2 {
    #[serde(default, rename = "@x")]
    x: f64,
    #[serde(default, rename = "@y")]
    y: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct XmlRgb {
    #[serde(default, rename = "@r")]
    r: f64,
    #[serde(default, rename = "@g")]
    g: f64,
    #[serde(default, rename = "@b")]
    b: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct XmlRotation {
    #[serde(default, rename = "@x")]
    x: f64,
    #[serde(default, rename = "@y")]
    y: f64,
    #[serde(default, rename = "@z")]
    z: f64,
    #[serde(default, rename = "@angle")]
    angle: f64,
}

fn finite(field: &'static str, values: &[f64]) -> ParseResult<()> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(ParseError::NonFinite { field })
    }
}

impl ExtrusionDocument {
    fn into_shape(self) -> ParseResult<LodExtrusion> {
        let mut shape = LodExtrusion::new();
        let mut thresholds = shape.thresholds();

        if let Some(radius) = self.radius {
            finite("radius", &[radius])?;
            shape.set_radius(radius);
        }
        if let Some(segments) = self.circle_segments {
            let count = usize::try_from(segments).map_err(|_| ParseError::NegativeSegments(segments))?;
            if count > MAX_CIRCLE_SEGMENTS {
                return Err(ParseError::TooManySegments {
                    value: segments,
                    max: MAX_CIRCLE_SEGMENTS,
                });
            }
            shape.set_circle_segments(count);
        }
        if let Some(near) = self.lod_distance1 {
            finite("lodDistance1", &[near])?;
            thresholds.near = near;
        }
        if let Some(far) = self.lod_distance2 {
            finite("lodDistance2", &[far])?;
            thresholds.far = far;
        }
        shape.set_thresholds(thresholds);
        if let Some(ccw) = self.ccw {
            shape.set_ccw(ccw);
        }
        if let Some(pick_lines) = self.pick_lines {
            shape.set_pick_lines(pick_lines);
        }

        if let Some(spine) = self.spine {
            let points = spine
                .points
                .iter()
                .map(|p| finite("spine", &[p.x, p.y, p.z]).map(|()| Point3::new(p.x, p.y, p.z)))
                .collect::<ParseResult<Vec<_>>>()?;
            if points.len() < 2 {
                log::warn!("spine has {} points; the extrusion will be empty", points.len());
            }
            shape.set_spine(points);
        }
        if let Some(section) = self.cross_section {
            let points = collect_points2("crossSection", &section)?;
            if points.is_empty() {
                log::warn!("cross-section has no points; the extrusion will be empty");
            }
            shape.set_cross_section(points);
        }
        if let Some(color) = self.color {
            let colors = color
                .colors
                .iter()
                .map(|c| finite("color", &[c.r, c.g, c.b]).map(|()| [c.r, c.g, c.b]))
                .collect::<ParseResult<Vec<_>>>()?;
            shape.set_color(colors);
        }
        if let Some(axis) = self.z_axis {
            finite("zAxis", &[axis.x, axis.y, axis.z])?;
            shape.set_z_axis(Vec3::new(axis.x, axis.y, axis.z));
        }
        if let Some(scale) = self.scale {
            let values = collect_points2("scale", &scale)?;
            shape.set_scale(values.into_iter().map(Vec2::to_array).collect());
        }
        if let Some(orientation) = self.orientation {
            let rotations = orientation
                .rotations
                .iter()
                .map(|r| {
                    finite("orientation", &[r.x, r.y, r.z, r.angle])
                        .map(|()| AxisRotation::new(Vec3::new(r.x, r.y, r.z), r.angle))
                })
                .collect::<ParseResult<Vec<_>>>()?;
            shape.set_orientation(rotations);
        }

        log::debug!(
            "parsed extrusion: {} spine points, {} section points, radius {}",
            shape.spine().source_len(),
            shape.cross_section().len(),
            shape.radius()
        );
        Ok(shape)
    }
}

fn collect_points2(field: &'static str, list: &XmlPoints2) -> ParseResult<Vec<Vec2>> {
    list.points
        .iter()
        .map(|p| finite(field, &[p.x, p.y]).map(|()| Vec2::new(p.x, p.y)))
        .collect()
}
