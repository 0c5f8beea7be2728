//! Tool state: active tool, style defaults, selection, drawing gesture.

use crate::shapes::{
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, SerializableColor, ShapeId, ShapeKind, ShapeRecord,
    ShapeStyle, TextBlock,
};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Minimum drag distance before a gesture creates a shape.
pub const MIN_DRAG_DISTANCE: f64 = 2.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
    Rect,
    Circle,
    Line,
    Text,
    Image,
    Icon,
    Eraser,
    Measure,
}

impl ToolKind {
    pub const ALL: [ToolKind; 10] = [
        ToolKind::Select,
        ToolKind::Pan,
        ToolKind::Rect,
        ToolKind::Circle,
        ToolKind::Line,
        ToolKind::Text,
        ToolKind::Image,
        ToolKind::Icon,
        ToolKind::Eraser,
        ToolKind::Measure,
    ];

    /// Lowercase tool name.
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
            ToolKind::Rect => "rect",
            ToolKind::Circle => "circle",
            ToolKind::Line => "line",
            ToolKind::Text => "text",
            ToolKind::Image => "image",
            ToolKind::Icon => "icon",
            ToolKind::Eraser => "eraser",
            ToolKind::Measure => "measure",
        }
    }

    /// Parse a tool name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Shape kind this tool draws, if it draws one.
    pub fn shape_kind(&self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rect => Some(ShapeKind::Rect),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Line => Some(ShapeKind::Line),
            ToolKind::Text => Some(ShapeKind::Text),
            ToolKind::Icon => Some(ShapeKind::Icon),
            _ => None,
        }
    }
}

/// Style defaults applied to newly drawn shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolSettings {
    pub fill: Option<SerializableColor>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: f64,
    pub opacity: f64,
    pub font_family: String,
    pub font_size: f64,
    pub corner_radius: f64,
    /// Icon name used by the icon tool.
    pub icon: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        let style = ShapeStyle::default();
        Self {
            fill: style.fill,
            stroke: style.stroke,
            stroke_width: style.stroke_width,
            opacity: style.opacity,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            corner_radius: 0.0,
            icon: "star".to_string(),
        }
    }
}

impl ToolSettings {
    /// Shape style built from these defaults.
    pub fn style(&self) -> ShapeStyle {
        ShapeStyle {
            fill: self.fill,
            stroke: self.stroke,
            stroke_width: self.stroke_width,
            opacity: self.opacity,
            gradient: None,
            shadow: None,
        }
    }

    /// Merge the set fields.
    pub fn apply(&mut self, patch: &ToolSettingsPatch) {
        if let Some(fill) = patch.fill {
            self.fill = fill;
        }
        if let Some(stroke) = patch.stroke {
            self.stroke = stroke;
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
        if let Some(family) = &patch.font_family {
            self.font_family = family.clone();
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(radius) = patch.corner_radius {
            self.corner_radius = radius;
        }
        if let Some(icon) = &patch.icon {
            self.icon = icon.clone();
        }
    }
}

/// Partial [`ToolSettings`] update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSettingsPatch {
    pub fill: Option<Option<SerializableColor>>,
    pub stroke: Option<Option<SerializableColor>>,
    pub stroke_width: Option<f64>,
    pub opacity: Option<f64>,
    pub font_family: Option<String>,
    pub font_size: Option<f64>,
    pub corner_radius: Option<f64>,
    pub icon: Option<String>,
}

/// Drawing gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing { start: Point, current: Point },
}

impl DrawingState {
    /// True during a drag.
    pub fn is_drawing(&self) -> bool {
        matches!(self, DrawingState::Drawing { .. })
    }

    /// Rectangle spanned by the gesture.
    pub fn rect(&self) -> Option<Rect> {
        match self {
            DrawingState::Idle => None,
            DrawingState::Drawing { start, current } => Some(Rect::from_points(*start, *current)),
        }
    }
}

/// Tool slice of the editor state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolState {
    pub active: ToolKind,
    pub settings: ToolSettings,
    /// Selected ids in selection order, without duplicates.
    pub selected_ids: Vec<ShapeId>,
    pub drawing: DrawingState,
}

impl ToolState {
    /// True when `id` is selected.
    pub fn is_selected(&self, id: &ShapeId) -> bool {
        self.selected_ids.contains(id)
    }

    /// Build the shape a finished gesture describes, styled with the current
    /// defaults. Returns `None` when the tool draws nothing or the drag was
    /// too short.
    pub fn shape_from_gesture(&self, start: Point, end: Point) -> Option<ShapeRecord> {
        let kind = self.active.shape_kind()?;
        let rect = Rect::from_points(start, end);
        let dragged = start.distance(end) >= MIN_DRAG_DISTANCE;
        let style = self.settings.style();
        let shape = match kind {
            ShapeKind::Rect if dragged => {
                let mut shape = ShapeRecord::rect(rect.x0, rect.y0, rect.width(), rect.height());
                shape.corner_radius = self.settings.corner_radius;
                shape.with_style(style)
            }
            ShapeKind::Circle if dragged => {
                let radius = rect.width().min(rect.height()) / 2.0;
                ShapeRecord::circle(rect.center(), radius).with_style(style)
            }
            ShapeKind::Line if dragged => {
                let mut style = style;
                style.fill = None;
                ShapeRecord::line(&[start, end]).with_style(style)
            }
            ShapeKind::Text => {
                let mut block = TextBlock::new("Text");
                block.font_family = self.settings.font_family.clone();
                block.font_size = self.settings.font_size;
                let (width, height) = block.estimated_size();
                let mut shape = ShapeRecord::text(start, "");
                shape.width = width;
                shape.height = height;
                shape.text = Some(block);
                shape.style.fill = self.settings.fill.or(Some(SerializableColor::black()));
                shape.style.opacity = self.settings.opacity;
                shape
            }
            ShapeKind::Icon => {
                let size = if dragged { rect.width().max(rect.height()) } else { 48.0 };
                let mut shape = ShapeRecord::icon(start, self.settings.icon.clone(), size);
                shape.style.fill = self.settings.fill;
                shape.style.opacity = self.settings.opacity;
                shape
            }
            _ => return None,
        };
        Some(shape)
    }
}

/// Floating tool panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelKind {
    Shapes,
    Effects,
    Text,
    Layers,
    Measurements,
    Templates,
    StyleGuide,
    Themes,
    Voice,
    Performance,
    Offline,
    Deployment,
}

impl PanelKind {
    pub const ALL: [PanelKind; 12] = [
        PanelKind::Shapes,
        PanelKind::Effects,
        PanelKind::Text,
        PanelKind::Layers,
        PanelKind::Measurements,
        PanelKind::Templates,
        PanelKind::StyleGuide,
        PanelKind::Themes,
        PanelKind::Voice,
        PanelKind::Performance,
        PanelKind::Offline,
        PanelKind::Deployment,
    ];

    /// Title shown in the panel header.
    pub fn title(&self) -> &'static str {
        match self {
            PanelKind::Shapes => "Shapes",
            PanelKind::Effects => "Effects",
            PanelKind::Text => "Text",
            PanelKind::Layers => "Layers",
            PanelKind::Measurements => "Measurements",
            PanelKind::Templates => "Templates",
            PanelKind::StyleGuide => "Style Guide",
            PanelKind::Themes => "Themes",
            PanelKind::Voice => "Voice Commands",
            PanelKind::Performance => "Performance",
            PanelKind::Offline => "Offline",
            PanelKind::Deployment => "Deployment",
        }
    }

    /// Find a panel by (case-insensitive) title.
    pub fn from_title(title: &str) -> Option<Self> {
        let title = title.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.title().to_lowercase() == title)
    }
}

/// An open floating panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenPanel {
    pub kind: PanelKind,
    pub position: Point,
}

/// Open panels, back to front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanelState {
    pub open: Vec<OpenPanel>,
}

impl PanelState {
    /// True when `kind` is open.
    pub fn is_open(&self, kind: PanelKind) -> bool {
        self.open.iter().any(|p| p.kind == kind)
    }

    /// Front-most panel.
    pub fn front(&self) -> Option<PanelKind> {
        self.open.last().map(|p| p.kind)
    }
}
