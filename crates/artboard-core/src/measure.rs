//! Distance measurements and unit conversion.

use crate::shapes::ShapeId;
use crate::store::EditorState;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// CSS reference resolution.
pub const DEFAULT_DPI: f64 = 96.0;

const MM_PER_INCH: f64 = 25.4;

/// Display unit for measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Px,
    In,
    Cm,
    Mm,
}

impl Unit {
    pub const ALL: [Unit; 4] = [Unit::Px, Unit::In, Unit::Cm, Unit::Mm];

    /// Short suffix such as `mm`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Unit::Px => "px",
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
        }
    }

    /// Parse a suffix, ignoring case.
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|u| u.suffix().eq_ignore_ascii_case(suffix.trim()))
    }

    /// Pixels per one of this unit at `dpi`.
    fn px_per_unit(&self, dpi: f64) -> f64 {
        match self {
            Unit::Px => 1.0,
            Unit::In => dpi,
            Unit::Cm => dpi / MM_PER_INCH * 10.0,
            Unit::Mm => dpi / MM_PER_INCH,
        }
    }

    /// Convert pixels to this unit.
    pub fn from_px(&self, px: f64, dpi: f64) -> f64 {
        px / self.px_per_unit(dpi)
    }

    /// Convert a value in this unit to pixels.
    pub fn to_px(&self, value: f64, dpi: f64) -> f64 {
        value * self.px_per_unit(dpi)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Point-to-point measurement, in world pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub from: Point,
    pub to: Point,
    pub distance: f64,
    pub dx: f64,
    pub dy: f64,
    /// Degrees, clockwise from the positive x axis (y points down).
    pub angle: f64,
}

impl Measurement {
    /// Straight-line measurement from `from` to `to`.
    pub fn between(from: Point, to: Point) -> Self {
        let delta = to - from;
        Self {
            from,
            to,
            distance: delta.hypot(),
            dx: delta.x,
            dy: delta.y,
            angle: delta.y.atan2(delta.x).to_degrees(),
        }
    }
}

/// Measurement between two shapes' bounding boxes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeMeasurement {
    pub from: ShapeId,
    pub to: ShapeId,
    pub center_distance: f64,
    /// Horizontal edge gap; negative when the boxes overlap horizontally.
    pub horizontal_gap: f64,
    /// Vertical edge gap; negative when the boxes overlap vertically.
    pub vertical_gap: f64,
    pub angle: f64,
}

impl ShapeMeasurement {
    /// Center-to-center distance and edge gaps between two shapes.
    /// `None` if either id is missing.
    pub fn between(state: &EditorState, from: &ShapeId, to: &ShapeId) -> Option<Self> {
        let a = state.shape(from)?.bounds();
        let b = state.shape(to)?.bounds();
        let centers = Measurement::between(a.center(), b.center());
        Some(Self {
            from: from.clone(),
            to: to.clone(),
            center_distance: centers.distance,
            horizontal_gap: edge_gap(a.x0, a.x1, b.x0, b.x1),
            vertical_gap: edge_gap(a.y0, a.y1, b.y0, b.y1),
            angle: centers.angle,
        })
    }

    /// Measure between the first two selected shapes.
    pub fn for_selection(state: &EditorState) -> Option<Self> {
        match state.selected_ids() {
            [a, b, ..] => Self::between(state, a, b),
            _ => None,
        }
    }
}

fn edge_gap(a0: f64, a1: f64, b0: f64, b1: f64) -> f64 {
    (b0 - a1).max(a0 - b1)
}

/// Measurement tool state and export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSet {
    pub unit: Unit,
    pub dpi: f64,
    pub points: Vec<Measurement>,
    pub shapes: Vec<ShapeMeasurement>,
}

impl Default for MeasurementSet {
    fn default() -> Self {
        Self {
            unit: Unit::Px,
            dpi: DEFAULT_DPI,
            points: Vec::new(),
            shapes: Vec::new(),
        }
    }
}

impl MeasurementSet {
    /// Empty set reporting in `unit` at `dpi`.
    pub fn new(unit: Unit, dpi: f64) -> Self {
        Self {
            unit,
            dpi,
            ..Self::default()
        }
    }

    /// Measure between two points and keep the result.
    pub fn measure_points(&mut self, from: Point, to: Point) -> &Measurement {
        self.points.push(Measurement::between(from, to));
        &self.points[self.points.len() - 1]
    }

    /// Returns `None` if either shape is missing.
    pub fn measure_shapes(
        &mut self,
        state: &EditorState,
        from: &ShapeId,
        to: &ShapeId,
    ) -> Option<&ShapeMeasurement> {
        let m = ShapeMeasurement::between(state, from, to)?;
        self.shapes.push(m);
        self.shapes.last()
    }

    /// Number of stored measurements.
    pub fn len(&self) -> usize {
        self.points.len() + self.shapes.len()
    }

    /// True when nothing has been measured.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all measurements.
    pub fn clear(&mut self) {
        self.points.clear();
        self.shapes.clear();
    }

    /// Convert a world pixel length to the display unit.
    pub fn convert(&self, px: f64) -> f64 {
        self.unit.from_px(px, self.dpi)
    }

    /// `"12.70 mm"`; pixels get one decimal, physical units two.
    pub fn format(&self, px: f64) -> String {
        let value = self.convert(px);
        match self.unit {
            Unit::Px => format!("{:.1} {}", value, self.unit),
            _ => format!("{:.2} {}", value, self.unit),
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a set exported by [`MeasurementSet::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Width and height of `rect` formatted in `set`'s unit.
pub fn format_size(set: &MeasurementSet, rect: Rect) -> String {
    format!("{} x {}", set.format(rect.width()), set.format(rect.height()))
}
