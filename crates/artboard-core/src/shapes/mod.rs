//! Shape records: the drawable elements of a document.

mod image;
mod patch;
mod style;
mod text;

pub use image::{ImageError, ImageFormat, ImageSource};
pub use patch::ShapePatch;
pub use style::{
    Gradient, GradientKind, GradientStop, NAMED_COLORS, SerializableColor, Shadow, ShapeStyle,
};
pub use text::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, FontWeight, TextAlign, TextBlock};

use kurbo::{Affine, BezPath, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Path flattening tolerance used for outlines.
const PATH_TOLERANCE: f64 = 0.1;

/// Discriminant of a shape record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Rect,
    Circle,
    Line,
    Text,
    Image,
    Group,
    Icon,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::Rect,
        ShapeKind::Circle,
        ShapeKind::Line,
        ShapeKind::Text,
        ShapeKind::Image,
        ShapeKind::Group,
        ShapeKind::Icon,
    ];

    /// Lowercase name as used in saved documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::Rect => "rect",
            ShapeKind::Circle => "circle",
            ShapeKind::Line => "line",
            ShapeKind::Text => "text",
            ShapeKind::Image => "image",
            ShapeKind::Group => "group",
            ShapeKind::Icon => "icon",
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier for shapes, formatted `kind-timestamp-random`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(String);

impl ShapeId {
    /// Wrap an id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The kind prefix encoded in the id, if it has one.
    pub fn kind_prefix(&self) -> &str {
        self.0.split('-').next().unwrap_or_default()
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Source of fresh shape ids.
pub trait IdGenerator {
    fn generate(&mut self, kind: ShapeKind) -> ShapeId;
}

/// Ids built from the wall clock (milliseconds) and a random suffix.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampIds;

impl IdGenerator for TimestampIds {
    fn generate(&mut self, kind: ShapeKind) -> ShapeId {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let random = Uuid::new_v4().simple().to_string();
        ShapeId(format!("{}-{}-{}", kind, millis, &random[..9]))
    }
}

/// Deterministic ids (`kind-n-seq`) for reproducible documents and tests.
#[derive(Debug, Default, Clone)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Generator starting at 1.
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&mut self, kind: ShapeKind) -> ShapeId {
        self.next += 1;
        ShapeId(format!("{}-{}-seq", kind, self.next))
    }
}

/// One drawable element: geometry, paint and type-specific fields.
///
/// `x`/`y` is the top-left corner of the unrotated box. Rotation (degrees)
/// is applied around the box center after scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    pub id: ShapeId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "unit_scale")]
    pub scale_x: f64,
    #[serde(default = "unit_scale")]
    pub scale_y: f64,
    #[serde(flatten)]
    pub style: ShapeStyle,
    #[serde(default)]
    pub corner_radius: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Polyline points relative to `x`/`y` (lines only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<TextBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<ShapeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    /// Derived from the tool selection; never set directly.
    #[serde(default)]
    pub is_selected: bool,
}

fn unit_scale() -> f64 {
    1.0
}

fn default_visible() -> bool {
    true
}

impl ShapeRecord {
    /// Create a record of `kind` with the given box and default style.
    /// The id is a placeholder until the store assigns one.
    pub fn new(kind: ShapeKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: ShapeId::new(""),
            kind,
            x,
            y,
            width,
            height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            style: ShapeStyle::default(),
            corner_radius: 0.0,
            radius: None,
            points: Vec::new(),
            text: None,
            image: None,
            icon: None,
            group_id: None,
            name: None,
            visible: true,
            locked: false,
            is_selected: false,
        }
    }

    /// Rectangle with its top-left corner at `(x, y)`.
    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(ShapeKind::Rect, x, y, width, height)
    }

    /// Circle centered at `center`.
    pub fn circle(center: Point, radius: f64) -> Self {
        let mut shape = Self::new(
            ShapeKind::Circle,
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        shape.radius = Some(radius);
        shape
    }

    /// Polyline through absolute `points`.
    pub fn line(points: &[Point]) -> Self {
        let bounds = points_bounds(points);
        let mut shape = Self::new(
            ShapeKind::Line,
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
        );
        shape.points = points
            .iter()
            .map(|p| Point::new(p.x - bounds.x0, p.y - bounds.y0))
            .collect();
        shape.style.fill = None;
        shape
    }

    /// Text box at `position`, sized from the content.
    pub fn text(position: Point, content: impl Into<String>) -> Self {
        let block = TextBlock::new(content);
        let (width, height) = block.estimated_size();
        let mut shape = Self::new(ShapeKind::Text, position.x, position.y, width, height);
        shape.style.fill = Some(SerializableColor::black());
        shape.style.stroke = None;
        shape.text = Some(block);
        shape
    }

    /// Image at `position`, displayed at most `max_size` on either axis.
    pub fn image(position: Point, source: ImageSource, max_size: f64) -> Self {
        let (width, height) = source.fitted_size(max_size);
        let mut shape = Self::new(ShapeKind::Image, position.x, position.y, width, height);
        shape.style.fill = None;
        shape.style.stroke = None;
        shape.image = Some(source);
        shape
    }

    /// Named icon from the icon set.
    pub fn icon(position: Point, name: impl Into<String>, size: f64) -> Self {
        let mut shape = Self::new(ShapeKind::Icon, position.x, position.y, size, size);
        shape.style.stroke = None;
        shape.icon = Some(name.into());
        shape
    }

    /// Group record spanning `bounds`.
    pub fn group(bounds: Rect) -> Self {
        let mut shape = Self::new(
            ShapeKind::Group,
            bounds.x0,
            bounds.y0,
            bounds.width(),
            bounds.height(),
        );
        shape.style.fill = None;
        shape.style.stroke = None;
        shape
    }

    /// Builder-style id assignment.
    pub fn with_id(mut self, id: impl Into<ShapeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Replace the style.
    pub fn with_style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }

    /// Size after scaling.
    pub fn scaled_size(&self) -> (f64, f64) {
        (self.width * self.scale_x, self.height * self.scale_y)
    }

    /// Local-to-world transform.
    pub fn transform(&self) -> Affine {
        let (w, h) = self.scaled_size();
        Affine::translate((self.x, self.y))
            * Affine::rotate_about(self.rotation.to_radians(), Point::new(w / 2.0, h / 2.0))
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
    }

    /// Outline in local (unscaled, unrotated) coordinates.
    pub fn local_path(&self) -> BezPath {
        let local = Rect::new(0.0, 0.0, self.width, self.height);
        match self.kind {
            ShapeKind::Rect => {
                let radius = self
                    .corner_radius
                    .min(self.width / 2.0)
                    .min(self.height / 2.0)
                    .max(0.0);
                RoundedRect::from_rect(local, radius).to_path(PATH_TOLERANCE)
            }
            ShapeKind::Circle => kurbo::Ellipse::from_rect(local).to_path(PATH_TOLERANCE),
            ShapeKind::Line => {
                let mut path = BezPath::new();
                let mut iter = self.points.iter();
                if let Some(first) = iter.next() {
                    path.move_to(*first);
                    for p in iter {
                        path.line_to(*p);
                    }
                }
                path
            }
            ShapeKind::Text | ShapeKind::Image | ShapeKind::Group | ShapeKind::Icon => {
                local.to_path(PATH_TOLERANCE)
            }
        }
    }

    /// Outline in world coordinates.
    pub fn to_path(&self) -> BezPath {
        self.transform() * self.local_path()
    }

    /// Axis-aligned bounding box in world coordinates.
    pub fn bounds(&self) -> Rect {
        if self.kind == ShapeKind::Line && self.points.is_empty() {
            return Rect::new(self.x, self.y, self.x, self.y);
        }
        let local = match self.kind {
            ShapeKind::Line => points_bounds(&self.points),
            _ => Rect::new(0.0, 0.0, self.width, self.height),
        };
        (self.transform() * local.to_path(PATH_TOLERANCE)).bounding_box()
    }

    /// Center of the bounding box.
    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Check if a world point hits this shape.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        if !self.visible {
            return false;
        }
        let scale = self.scale_x.abs().max(self.scale_y.abs()).max(f64::EPSILON);
        let tol = tolerance / scale;
        let local = self.transform().inverse() * point;
        match self.kind {
            ShapeKind::Circle => {
                let rx = self.width / 2.0 + tol;
                let ry = self.height / 2.0 + tol;
                if rx <= 0.0 || ry <= 0.0 {
                    return false;
                }
                let dx = (local.x - self.width / 2.0) / rx;
                let dy = (local.y - self.height / 2.0) / ry;
                dx * dx + dy * dy <= 1.0
            }
            ShapeKind::Line => {
                let reach = tol + self.style.stroke_width / 2.0;
                point_to_polyline_dist(local, &self.points) <= reach
            }
            _ => Rect::new(0.0, 0.0, self.width, self.height)
                .inflate(tol, tol)
                .contains(local),
        }
    }

    /// Translate the shape by a world-space delta.
    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Approximate in-memory size: serialized JSON length.
    pub fn estimated_bytes(&self) -> usize {
        serde_json::to_vec(self).map(|v| v.len()).unwrap_or(0)
    }
}

/// Bounding box of a point list (zero rect at origin when empty).
pub fn points_bounds(points: &[Point]) -> Rect {
    let mut iter = points.iter();
    let Some(first) = iter.next() else {
        return Rect::ZERO;
    };
    iter.fold(Rect::from_points(*first, *first), |acc, p| {
        acc.union_pt(*p)
    })
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    point.distance(proj)
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_id_format() {
        let id = TimestampIds.generate(ShapeKind::Rect);
        let parts: Vec<_> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "rect");
        assert!(parts[1].parse::<u128>().is_ok());
        assert_eq!(parts[2].len(), 9);
        assert_eq!(id.kind_prefix(), "rect");
    }

    #[test]
    fn test_sequential_ids_are_distinct() {
        let mut ids = SequentialIds::new();
        let a = ids.generate(ShapeKind::Circle);
        let b = ids.generate(ShapeKind::Circle);
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "circle-1-seq");
    }

    #[test]
    fn test_rect_bounds_and_hit() {
        let rect = ShapeRecord::rect(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.bounds(), Rect::new(10.0, 20.0, 110.0, 70.0));
        assert!(rect.hit_test(Point::new(50.0, 40.0), 0.0));
        assert!(!rect.hit_test(Point::new(5.0, 40.0), 0.0));
        assert!(rect.hit_test(Point::new(5.0, 40.0), 6.0));
    }

    #[test]
    fn test_rotated_bounds_grow() {
        let mut rect = ShapeRecord::rect(0.0, 0.0, 100.0, 100.0);
        rect.rotation = 45.0;
        let bounds = rect.bounds();
        let diag = 100.0 * std::f64::consts::SQRT_2;
        assert!((bounds.width() - diag).abs() < 0.5);
        assert!((bounds.center().x - 50.0).abs() < 1e-6);
    }

    #[test]
    fn test_scaled_bounds() {
        let mut rect = ShapeRecord::rect(0.0, 0.0, 10.0, 10.0);
        rect.scale_x = 2.0;
        rect.scale_y = 3.0;
        let bounds = rect.bounds();
        assert!((bounds.width() - 20.0).abs() < 1e-9);
        assert!((bounds.height() - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_circle_hit() {
        let circle = ShapeRecord::circle(Point::new(50.0, 50.0), 10.0);
        assert!(circle.hit_test(Point::new(55.0, 55.0), 0.0));
        // Corner of the box is outside the circle.
        assert!(!circle.hit_test(Point::new(41.0, 41.0), 0.0));
    }

    #[test]
    fn test_line_geometry() {
        let line = ShapeRecord::line(&[Point::new(10.0, 10.0), Point::new(110.0, 10.0)]);
        assert_eq!((line.x, line.y), (10.0, 10.0));
        assert_eq!(line.points[0], Point::ZERO);
        assert!(line.hit_test(Point::new(60.0, 11.0), 0.5));
        assert!(!line.hit_test(Point::new(60.0, 20.0), 0.5));
    }

    #[test]
    fn test_invisible_shapes_are_not_hit() {
        let mut rect = ShapeRecord::rect(0.0, 0.0, 10.0, 10.0);
        rect.visible = false;
        assert!(!rect.hit_test(Point::new(5.0, 5.0), 0.0));
    }

    #[test]
    fn test_serialized_field_names() {
        let rect = ShapeRecord::rect(1.0, 2.0, 3.0, 4.0).with_id("rect-1-a");
        let value = serde_json::to_value(&rect).unwrap();
        assert_eq!(value["type"], "rect");
        assert_eq!(value["strokeWidth"], 2.0);
        assert_eq!(value["scaleX"], 1.0);
        assert_eq!(value["isSelected"], false);
        let back: ShapeRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, rect);
    }

    #[test]
    fn test_point_to_segment() {
        let d = point_to_segment_dist(
            Point::new(5.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert!((d - 5.0).abs() < 1e-9);
    }
}
