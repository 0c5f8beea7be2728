//! Renderer trait abstraction.

use artboard_core::shapes::ShapeId;
use artboard_core::{EditorState, Theme};
use kurbo::{Affine, Rect, Size};
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Render failed: {0}")]
    RenderFailed(String),
    #[error("Invalid geometry in shape {0}")]
    InvalidGeometry(ShapeId),
    #[error("Output error: {0}")]
    Output(#[from] std::fmt::Error),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Grid display style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridStyle {
    /// No grid.
    #[default]
    None,
    /// Full grid lines.
    Lines,
    /// Only corner dots (.).
    Dots,
}

impl GridStyle {
    /// Cycle to the next grid style.
    pub fn next(self) -> Self {
        match self {
            GridStyle::None => GridStyle::Lines,
            GridStyle::Lines => GridStyle::Dots,
            GridStyle::Dots => GridStyle::None,
        }
    }

    /// Get display name for this grid style.
    pub fn name(self) -> &'static str {
        match self {
            GridStyle::None => "None",
            GridStyle::Lines => "Lines",
            GridStyle::Dots => "Dots",
        }
    }
}

/// Context for a single render.
pub struct RenderContext<'a> {
    /// The document to render.
    pub state: &'a EditorState,
    /// Output size. Defaults to the artboard size.
    pub viewport_size: Size,
    /// World-to-output transform. Identity renders the artboard as-is.
    pub view_transform: Affine,
    pub background_color: Color,
    pub grid_style: GridStyle,
    pub grid_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    /// Draw outlines and handles around selected shapes.
    pub show_selection: bool,
    /// Selection rectangle (marquee) in world coordinates.
    pub selection_rect: Option<Rect>,
    /// Shape currently being edited in place (not drawn).
    pub editing_shape_id: Option<ShapeId>,
}

impl<'a> RenderContext<'a> {
    /// Export-style context: artboard size, artboard background, no grid,
    /// no selection.
    pub fn new(state: &'a EditorState) -> Self {
        let canvas = &state.canvas;
        Self {
            state,
            viewport_size: Size::new(canvas.width, canvas.height),
            view_transform: Affine::IDENTITY,
            background_color: canvas.background.into(),
            grid_style: GridStyle::None,
            grid_color: Color::from_rgba8(0, 0, 0, 24),
            selection_color: Color::from_rgba8(59, 130, 246, 255), // Blue
            show_selection: false,
            selection_rect: None,
            editing_shape_id: None,
        }
    }

    /// Editor-style context: the canvas pan/zoom over a screen viewport.
    pub fn for_view(state: &'a EditorState, viewport_size: Size) -> Self {
        Self {
            viewport_size,
            view_transform: state.canvas.transform(),
            grid_style: if state.canvas.show_grid {
                GridStyle::Lines
            } else {
                GridStyle::None
            },
            show_selection: true,
            ..Self::new(state)
        }
    }

    /// Take grid and selection colors from a theme. The artboard keeps its
    /// own background.
    pub fn with_theme(mut self, theme: &Theme) -> Self {
        self.selection_color = theme.selection.into();
        self.grid_color = theme.border.into();
        self
    }

    /// Override the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Draw a grid.
    pub fn with_grid(mut self, style: GridStyle) -> Self {
        self.grid_style = style;
        self
    }

    /// Show or hide selection outlines.
    pub fn with_selection(mut self, show: bool) -> Self {
        self.show_selection = show;
        self
    }

    /// Rubber-band rectangle to draw.
    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    /// Set the shape being edited (will be skipped).
    pub fn with_editing_shape(mut self, shape_id: Option<ShapeId>) -> Self {
        self.editing_shape_id = shape_id;
        self
    }

    /// Uniform scale of the view transform, used to keep handles a
    /// constant size on screen.
    pub fn view_scale(&self) -> f64 {
        self.view_transform.determinant().abs().sqrt().max(f64::EPSILON)
    }

    /// World-space area covered by the viewport.
    pub fn visible_world_rect(&self) -> Rect {
        let viewport = Rect::from_origin_size((0.0, 0.0), self.viewport_size);
        self.view_transform.inverse().transform_rect_bbox(viewport)
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Rendered frame or file.
    type Output;

    /// Draw the document described by `ctx`.
    fn render(&mut self, ctx: &RenderContext) -> RenderResult<Self::Output>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
