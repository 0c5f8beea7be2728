//! Canvas transform: pan/zoom, artboard size, grid.

use crate::shapes::SerializableColor;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default artboard width.
pub const DEFAULT_ARTBOARD_WIDTH: f64 = 1200.0;
/// Default artboard height.
pub const DEFAULT_ARTBOARD_HEIGHT: f64 = 800.0;
/// Default grid spacing in world units.
pub const DEFAULT_GRID_SIZE: f64 = 20.0;

/// View transform and artboard settings.
///
/// Converts between screen coordinates and world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasView {
    /// Current translation offset (pan), in screen units.
    pub offset: Vec2,
    /// Current zoom level (1.0 = 100%).
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Artboard size in world units.
    pub width: f64,
    pub height: f64,
    pub background: SerializableColor,
    pub show_grid: bool,
    pub grid_size: f64,
    pub snap_to_grid: bool,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            offset: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 10.0,
            width: DEFAULT_ARTBOARD_WIDTH,
            height: DEFAULT_ARTBOARD_HEIGHT,
            background: SerializableColor::white(),
            show_grid: false,
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: false,
        }
    }
}

impl CanvasView {
    /// Default artboard at 100% zoom, no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// World-to-screen transform.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset) * Affine::scale(self.zoom)
    }

    /// Screen-to-world transform.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.zoom) * Affine::translate(-self.offset)
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen_point: Point) -> Point {
        self.inverse_transform() * screen_point
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world_point: Point) -> Point {
        self.transform() * world_point
    }

    /// Artboard rectangle in world coordinates.
    pub fn artboard(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// Pan by a delta in screen coordinates.
    pub fn pan(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom by `factor`, keeping `screen_point` fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        let new_zoom = self.clamp_zoom(self.zoom * factor);
        if (new_zoom - self.zoom).abs() < f64::EPSILON {
            return;
        }

        let world_point = self.screen_to_world(screen_point);
        self.zoom = new_zoom;

        // Keep world_point under screen_point.
        let new_screen = self.world_to_screen(world_point);
        self.offset += screen_point - new_screen;
    }

    /// Clamp a zoom value to this view's limits.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Reset pan and zoom.
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
        self.zoom = 1.0;
    }

    /// Fit `bounds` into a viewport of `viewport` size with `padding` on each side.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.width() <= 0.0 || bounds.height() <= 0.0 {
            self.reset();
            return;
        }

        let padded = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );
        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        self.zoom = self.clamp_zoom(scale_x.min(scale_y));

        let bounds_center = bounds.center();
        self.offset = Vec2::new(
            viewport.width / 2.0 - bounds_center.x * self.zoom,
            viewport.height / 2.0 - bounds_center.y * self.zoom,
        );
    }

    /// Snap a world point to the grid (identity when snapping is off).
    pub fn snap(&self, point: Point) -> Point {
        if !self.snap_to_grid || self.grid_size <= 0.0 {
            return point;
        }
        let g = self.grid_size;
        Point::new((point.x / g).round() * g, (point.y / g).round() * g)
    }

    /// Apply a partial update; zoom is clamped to the resulting limits.
    pub fn apply(&mut self, patch: &CanvasPatch) {
        if let Some(offset) = patch.offset {
            self.offset = offset;
        }
        if let Some(width) = patch.width {
            self.width = width;
        }
        if let Some(height) = patch.height {
            self.height = height;
        }
        if let Some(background) = patch.background {
            self.background = background;
        }
        if let Some(show_grid) = patch.show_grid {
            self.show_grid = show_grid;
        }
        if let Some(grid_size) = patch.grid_size {
            self.grid_size = grid_size;
        }
        if let Some(snap) = patch.snap_to_grid {
            self.snap_to_grid = snap;
        }
        if let Some(zoom) = patch.zoom {
            self.zoom = self.clamp_zoom(zoom);
        }
    }
}

/// Partial [`CanvasView`] update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasPatch {
    pub offset: Option<Vec2>,
    pub zoom: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub background: Option<SerializableColor>,
    pub show_grid: Option<bool>,
    pub grid_size: Option<f64>,
    pub snap_to_grid: Option<bool>,
}

impl CanvasPatch {
    /// Set only the zoom.
    pub fn zoom(zoom: f64) -> Self {
        Self { zoom: Some(zoom), ..Self::default() }
    }

    /// Set only the pan offset.
    pub fn offset(offset: Vec2) -> Self {
        Self { offset: Some(offset), ..Self::default() }
    }

    /// True when only pan/zoom are set.
    pub fn is_view_only(&self) -> bool {
        self.width.is_none()
            && self.height.is_none()
            && self.background.is_none()
            && self.show_grid.is_none()
            && self.grid_size.is_none()
            && self.snap_to_grid.is_none()
    }

    /// Set the artboard size and background.
    pub fn artboard(width: f64, height: f64, background: SerializableColor) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            background: Some(background),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_to_world_with_offset_and_zoom() {
        let mut view = CanvasView::new();
        view.offset = Vec2::new(50.0, 100.0);
        view.zoom = 2.0;
        let world = view.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < 1e-10);
        assert!((world.y - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut view = CanvasView::new();
        view.offset = Vec2::new(30.0, -20.0);
        view.zoom = 1.5;
        let original = Point::new(123.0, 456.0);
        let back = view.world_to_screen(view.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut view = CanvasView::new();
        let anchor = Point::new(200.0, 100.0);
        let world_before = view.screen_to_world(anchor);
        view.zoom_at(anchor, 2.0);
        let world_after = view.screen_to_world(anchor);
        assert!((world_before - world_after).hypot() < 1e-9);
        assert!((view.zoom - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut view = CanvasView::new();
        view.zoom_at(Point::ZERO, 0.001);
        assert!((view.zoom - view.min_zoom).abs() < f64::EPSILON);
        view.apply(&CanvasPatch::zoom(500.0));
        assert!((view.zoom - view.max_zoom).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers() {
        let mut view = CanvasView::new();
        let viewport = Size::new(800.0, 600.0);
        view.fit_to_bounds(Rect::new(0.0, 0.0, 100.0, 100.0), viewport, 50.0);
        assert!((view.zoom - 5.0).abs() < 1e-9);
        let center = view.world_to_screen(Point::new(50.0, 50.0));
        assert!((center.x - 400.0).abs() < 1e-9);
        assert!((center.y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_snap() {
        let mut view = CanvasView::new();
        let p = Point::new(29.0, 11.0);
        assert_eq!(view.snap(p), p);
        view.snap_to_grid = true;
        assert_eq!(view.snap(p), Point::new(20.0, 20.0));
    }
}
