//! Partial shape updates.

use super::{Gradient, ImageSource, SerializableColor, Shadow, ShapeId, ShapeKind, ShapeRecord, TextBlock};
use kurbo::Point;

/// A partial [`ShapeRecord`]. Only fields that are `Some` are merged.
///
/// Nullable record fields use `Option<Option<_>>`: `Some(None)` clears the
/// field, `None` leaves it alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub rotation: Option<f64>,
    pub scale_x: Option<f64>,
    pub scale_y: Option<f64>,
    pub fill: Option<Option<SerializableColor>>,
    pub stroke: Option<Option<SerializableColor>>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub gradient: Option<Option<Gradient>>,
    pub shadow: Option<Option<Shadow>>,
    pub corner_radius: Option<f64>,
    pub radius: Option<f64>,
    pub points: Option<Vec<Point>>,
    pub text: Option<TextBlock>,
    pub image: Option<ImageSource>,
    pub icon: Option<String>,
    pub group_id: Option<Option<ShapeId>>,
    pub name: Option<Option<String>>,
    pub visible: Option<bool>,
    pub locked: Option<bool>,
}

impl ShapePatch {
    /// Patch that changes nothing.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn rotation(mut self, degrees: f64) -> Self {
        self.rotation = Some(degrees);
        self
    }

    pub fn scale(mut self, x: f64, y: f64) -> Self {
        self.scale_x = Some(x);
        self.scale_y = Some(y);
        self
    }

    /// Set the fill; `None` clears it.
    pub fn fill(mut self, color: Option<SerializableColor>) -> Self {
        self.fill = Some(color);
        self
    }

    /// Set the stroke; `None` clears it.
    pub fn stroke(mut self, color: Option<SerializableColor>) -> Self {
        self.stroke = Some(color);
        self
    }

    pub fn stroke_width(mut self, width: f64) -> Self {
        self.stroke_width = Some(width);
        self
    }

    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn gradient(mut self, gradient: Option<Gradient>) -> Self {
        self.gradient = Some(gradient);
        self
    }

    pub fn shadow(mut self, shadow: Option<Shadow>) -> Self {
        self.shadow = Some(shadow);
        self
    }

    pub fn corner_radius(mut self, radius: f64) -> Self {
        self.corner_radius = Some(radius);
        self
    }

    pub fn text(mut self, text: TextBlock) -> Self {
        self.text = Some(text);
        self
    }

    /// Move into a group, or out of any with `None`.
    pub fn group_id(mut self, group: Option<ShapeId>) -> Self {
        self.group_id = Some(group);
        self
    }

    pub fn name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = Some(locked);
        self
    }

    /// True when the patch sets no field.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Shallow-merge the set fields into `shape`.
    ///
    /// A circle radius resizes around the current center before the other
    /// fields merge, so an explicit position in the same patch wins.
    pub fn apply(&self, shape: &mut ShapeRecord) {
        if let Some(radius) = self.radius {
            shape.radius = Some(radius);
            if shape.kind == ShapeKind::Circle {
                let center = (shape.x + shape.width / 2.0, shape.y + shape.height / 2.0);
                shape.x = center.0 - radius;
                shape.y = center.1 - radius;
                shape.width = radius * 2.0;
                shape.height = radius * 2.0;
            }
        }
        macro_rules! merge {
            ($($field:ident => $target:expr),* $(,)?) => {
                $(if let Some(value) = &self.$field {
                    $target = value.clone();
                })*
            };
        }
        merge! {
            x => shape.x,
            y => shape.y,
            width => shape.width,
            height => shape.height,
            rotation => shape.rotation,
            scale_x => shape.scale_x,
            scale_y => shape.scale_y,
            fill => shape.style.fill,
            stroke => shape.style.stroke,
            stroke_width => shape.style.stroke_width,
            opacity => shape.style.opacity,
            gradient => shape.style.gradient,
            shadow => shape.style.shadow,
            corner_radius => shape.corner_radius,
            points => shape.points,
            group_id => shape.group_id,
            name => shape.name,
            visible => shape.visible,
            locked => shape.locked,
        }
        if let Some(text) = &self.text {
            shape.text = Some(text.clone());
        }
        if let Some(image) = &self.image {
            shape.image = Some(image.clone());
        }
        if let Some(icon) = &self.icon {
            shape.icon = Some(icon.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_is_noop() {
        let rect = ShapeRecord::rect(1.0, 2.0, 3.0, 4.0);
        let mut patched = rect.clone();
        let patch = ShapePatch::new();
        assert!(patch.is_empty());
        patch.apply(&mut patched);
        assert_eq!(patched, rect);
    }

    #[test]
    fn test_clear_fill() {
        let mut rect = ShapeRecord::rect(0.0, 0.0, 1.0, 1.0);
        ShapePatch::new().fill(None).apply(&mut rect);
        assert!(rect.style.fill.is_none());
        assert!(rect.style.stroke.is_some());
    }

    #[test]
    fn test_circle_radius_keeps_center() {
        let mut circle = ShapeRecord::circle(Point::new(50.0, 50.0), 10.0);
        ShapePatch { radius: Some(20.0), ..Default::default() }.apply(&mut circle);
        assert_eq!((circle.x, circle.y, circle.width), (30.0, 30.0, 40.0));
        assert_eq!(circle.radius, Some(20.0));
    }

    #[test]
    fn test_position_wins_over_radius() {
        let mut circle = ShapeRecord::circle(Point::new(50.0, 50.0), 10.0);
        ShapePatch {
            radius: Some(20.0),
            ..ShapePatch::new().position(100.0, 5.0)
        }
        .apply(&mut circle);
        assert_eq!((circle.x, circle.y), (100.0, 5.0));
        assert_eq!((circle.width, circle.height), (40.0, 40.0));
        assert_eq!(circle.radius, Some(20.0));
    }
}
