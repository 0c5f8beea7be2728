//! Template export/import and the built-in template library.

use crate::canvas::CanvasPatch;
use crate::shapes::{
    FontWeight, Gradient, SerializableColor, ShapeId, ShapeRecord, ShapeStyle, TextAlign,
};
use crate::storage::now_millis;
use crate::store::{Action, EditorState};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Template errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Invalid template JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Template has no shapes")]
    Empty,
    #[error("Unknown template: {0}")]
    NotFound(String),
}

/// Result type for template operations.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A shape inside a template, with its paint position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateShape {
    pub z_index: usize,
    #[serde(flatten)]
    pub shape: ShapeRecord,
}

/// A reusable document: artboard settings plus shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub width: f64,
    pub height: f64,
    pub background: SerializableColor,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Unix time in milliseconds.
    #[serde(default)]
    pub created_at: u64,
    pub shapes: Vec<TemplateShape>,
}

impl Template {
    /// Capture the whole document.
    pub fn from_state(state: &EditorState, name: impl Into<String>) -> Self {
        Self::capture(state, name.into(), |_| true)
    }

    /// Capture only the selected shapes, with everything nested in selected
    /// groups. Selected members whose group is left out become top-level.
    pub fn from_selection(state: &EditorState, name: impl Into<String>) -> Self {
        let mut included: HashSet<ShapeId> = HashSet::new();
        for id in state.selected_ids().iter().filter(|id| state.contains(id)) {
            included.insert(id.clone());
            included.extend(state.descendants(id));
        }
        Self::capture(state, name.into(), |shape| included.contains(&shape.id))
    }

    fn capture(state: &EditorState, name: String, include: impl Fn(&ShapeRecord) -> bool) -> Self {
        let kept: Vec<&ShapeRecord> = state.iter().filter(|s| include(s)).collect();
        let ids: HashSet<&ShapeId> = kept.iter().map(|s| &s.id).collect();
        let shapes = kept
            .iter()
            .enumerate()
            .map(|(z_index, shape)| {
                let mut shape = (*shape).clone();
                shape.is_selected = false;
                if shape.group_id.as_ref().is_some_and(|g| !ids.contains(g)) {
                    shape.group_id = None;
                }
                TemplateShape { z_index, shape }
            })
            .collect();
        Self {
            name,
            description: String::new(),
            category: "custom".to_string(),
            width: state.canvas.width,
            height: state.canvas.height,
            background: state.canvas.background,
            tags: Vec::new(),
            created_at: now_millis(),
            shapes,
        }
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> TemplateResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a template exported by [`Template::to_json`].
    pub fn from_json(json: &str) -> TemplateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shapes in paint order.
    pub fn ordered_shapes(&self) -> Vec<ShapeRecord> {
        let mut shapes: Vec<&TemplateShape> = self.shapes.iter().collect();
        shapes.sort_by_key(|s| s.z_index);
        shapes.into_iter().map(|s| s.shape.clone()).collect()
    }

    /// Actions that replace the current document with this template.
    pub fn apply(&self) -> Vec<Action> {
        vec![
            Action::UpdateCanvas(CanvasPatch::artboard(self.width, self.height, self.background)),
            Action::LoadShapes(self.ordered_shapes()),
        ]
    }

    /// Actions that add this template's shapes on top of the current document.
    /// Fails for a template without shapes.
    ///
    /// Template ids already used in `state` are renamed, and group
    /// membership follows the rename, so inserting the same template twice
    /// gives two independent copies.
    pub fn insert(&self, state: &EditorState) -> TemplateResult<Vec<Action>> {
        if self.shapes.is_empty() {
            return Err(TemplateError::Empty);
        }
        let mut incoming = self.ordered_shapes();
        let own: HashSet<ShapeId> = incoming.iter().map(|s| s.id.clone()).collect();
        let existing: HashSet<ShapeId> = state.iter().map(|s| s.id.clone()).collect();
        let mut taken = existing.clone();
        let mut renamed: HashMap<ShapeId, ShapeId> = HashMap::new();
        for shape in &mut incoming {
            if shape.id.as_str().is_empty() || taken.contains(&shape.id) {
                let id = unused_id(&taken, &own, &shape.id);
                if existing.contains(&shape.id) {
                    renamed.entry(shape.id.clone()).or_insert_with(|| id.clone());
                }
                shape.id = id;
            }
            taken.insert(shape.id.clone());
        }
        for shape in &mut incoming {
            shape.group_id = match shape.group_id.take() {
                Some(group) => match renamed.get(&group) {
                    Some(id) => Some(id.clone()),
                    None if own.contains(&group) => Some(group),
                    // Never join a group of the host document.
                    None => None,
                },
                None => None,
            };
        }

        let mut shapes: Vec<ShapeRecord> = state.iter().cloned().collect();
        shapes.extend(incoming);
        Ok(vec![Action::LoadShapes(shapes)])
    }
}

/// `{base}-{n}` for the first `n` used neither in the document nor by
/// the template's own shapes.
fn unused_id(taken: &HashSet<ShapeId>, own: &HashSet<ShapeId>, base: &ShapeId) -> ShapeId {
    let base = match base.as_str() {
        "" => "shape",
        id => id,
    };
    let mut n = 1;
    loop {
        let id = ShapeId::new(format!("{base}-{n}"));
        if !taken.contains(&id) && !own.contains(&id) {
            return id;
        }
        n += 1;
    }
}

/// The templates shipped with the editor.
pub struct TemplateLibrary;

impl TemplateLibrary {
    /// Names of the built-in templates.
    pub fn names() -> Vec<&'static str> {
        vec!["blank", "social-post", "presentation-slide", "business-card"]
    }

    /// All built-in templates.
    pub fn builtin() -> Vec<Template> {
        Self::names()
            .into_iter()
            .filter_map(|name| Self::get(name).ok())
            .collect()
    }

    /// Built-in template by name.
    pub fn get(name: &str) -> TemplateResult<Template> {
        let template = match name {
            "blank" => blank(),
            "social-post" => social_post(),
            "presentation-slide" => presentation_slide(),
            "business-card" => business_card(),
            other => return Err(TemplateError::NotFound(other.to_string())),
        };
        Ok(template)
    }
}

fn base(name: &str, category: &str, width: f64, height: f64, background: SerializableColor) -> Template {
    Template {
        name: name.to_string(),
        description: String::new(),
        category: category.to_string(),
        width,
        height,
        background,
        tags: Vec::new(),
        created_at: 0,
        shapes: Vec::new(),
    }
}

fn push(template: &mut Template, id: &str, shape: ShapeRecord) {
    let z_index = template.shapes.len();
    template.shapes.push(TemplateShape {
        z_index,
        shape: shape.with_id(id),
    });
}

fn headline(position: Point, content: &str, size: f64, color: SerializableColor) -> ShapeRecord {
    let mut shape = ShapeRecord::text(position, content);
    if let Some(text) = shape.text.as_mut() {
        text.font_size = size;
        text.font_weight = FontWeight::Bold;
        let (w, h) = text.estimated_size();
        shape.width = w;
        shape.height = h;
    }
    shape.style.fill = Some(color);
    shape
}

fn blank() -> Template {
    let mut t = base("Blank", "basic", 1200.0, 800.0, SerializableColor::white());
    t.description = "Empty artboard".to_string();
    t
}

fn social_post() -> Template {
    let mut t = base("Social Post", "social", 1080.0, 1080.0, SerializableColor::rgb(15, 23, 42));
    t.description = "Square post with gradient backdrop and headline".to_string();
    t.tags = vec!["instagram".to_string(), "square".to_string()];

    let mut backdrop = ShapeRecord::rect(0.0, 0.0, 1080.0, 1080.0);
    backdrop.style = ShapeStyle {
        fill: None,
        stroke: None,
        gradient: Some(Gradient::linear(
            135.0,
            SerializableColor::rgb(99, 102, 241),
            SerializableColor::rgb(236, 72, 153),
        )),
        ..ShapeStyle::default()
    };
    push(&mut t, "rect-backdrop", backdrop);

    let mut title = headline(Point::new(90.0, 420.0), "Your headline here", 72.0, SerializableColor::white());
    if let Some(text) = title.text.as_mut() {
        text.align = TextAlign::Left;
    }
    push(&mut t, "text-title", title);

    let mut badge = ShapeRecord::circle(Point::new(940.0, 140.0), 60.0);
    badge.style.fill = Some(SerializableColor::rgb(234, 179, 8));
    badge.style.stroke = None;
    push(&mut t, "circle-badge", badge);
    t
}

fn presentation_slide() -> Template {
    let mut t = base("Presentation Slide", "presentation", 1920.0, 1080.0, SerializableColor::white());
    t.description = "16:9 title slide".to_string();

    let mut bar = ShapeRecord::rect(0.0, 0.0, 1920.0, 24.0);
    bar.style.fill = Some(SerializableColor::rgb(59, 130, 246));
    bar.style.stroke = None;
    push(&mut t, "rect-accent", bar);

    push(
        &mut t,
        "text-title",
        headline(Point::new(160.0, 420.0), "Presentation title", 96.0, SerializableColor::rgb(15, 23, 42)),
    );

    let mut subtitle = ShapeRecord::text(Point::new(160.0, 560.0), "Subtitle or presenter name");
    if let Some(text) = subtitle.text.as_mut() {
        text.font_size = 40.0;
        let (w, h) = text.estimated_size();
        subtitle.width = w;
        subtitle.height = h;
    }
    subtitle.style.fill = Some(SerializableColor::rgb(100, 116, 139));
    push(&mut t, "text-subtitle", subtitle);

    let mut rule = ShapeRecord::line(&[Point::new(160.0, 530.0), Point::new(760.0, 530.0)]);
    rule.style.stroke = Some(SerializableColor::rgb(59, 130, 246));
    rule.style.stroke_width = 4.0;
    push(&mut t, "line-rule", rule);
    t
}

fn business_card() -> Template {
    let mut t = base("Business Card", "print", 1050.0, 600.0, SerializableColor::rgb(250, 250, 249));
    t.description = "3.5 x 2 in at 300 dpi".to_string();

    let mut frame = ShapeRecord::rect(30.0, 30.0, 990.0, 540.0);
    frame.corner_radius = 24.0;
    frame.style.fill = None;
    frame.style.stroke = Some(SerializableColor::rgb(28, 25, 23));
    push(&mut t, "rect-frame", frame);

    push(
        &mut t,
        "text-name",
        headline(Point::new(90.0, 200.0), "Jordan Example", 56.0, SerializableColor::rgb(28, 25, 23)),
    );

    let mut details = ShapeRecord::text(Point::new(90.0, 300.0), "Designer\nhello@example.com");
    details.style.fill = Some(SerializableColor::rgb(87, 83, 78));
    push(&mut t, "text-details", details);

    let mut logo = ShapeRecord::icon(Point::new(840.0, 90.0), "star", 120.0);
    logo.style.fill = Some(SerializableColor::rgb(234, 88, 12));
    push(&mut t, "icon-logo", logo);
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{SequentialIds, ShapeKind};
    use crate::store::EditorStore;

    #[test]
    fn test_builtin_templates_parse_back() {
        for template in TemplateLibrary::builtin() {
            let json = template.to_json().unwrap();
            let back = Template::from_json(&json).unwrap();
            assert_eq!(back, template, "{} did not round-trip", template.name);
        }
    }

    #[test]
    fn test_unknown_template() {
        assert!(matches!(
            TemplateLibrary::get("poster"),
            Err(TemplateError::NotFound(_))
        ));
    }

    #[test]
    fn test_export_import_roundtrip_preserves_fields() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        let mut rect = ShapeRecord::rect(12.5, 7.25, 100.0, 40.0);
        rect.rotation = 33.0;
        rect.name = Some("Header".to_string());
        store.dispatch(Action::AddShape(rect));
        store.dispatch(Action::AddShape(ShapeRecord::text(Point::new(1.0, 2.0), "Hello")));

        let template = Template::from_state(store.state(), "Mine");
        let json = template.to_json().unwrap();
        let parsed = Template::from_json(&json).unwrap();
        assert_eq!(parsed, template);

        let shapes = parsed.ordered_shapes();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].x, 12.5);
        assert_eq!(shapes[0].rotation, 33.0);
        assert_eq!(shapes[0].name.as_deref(), Some("Header"));
        assert_eq!(shapes[1].text.as_ref().unwrap().content, "Hello");
        assert!(shapes.iter().all(|s| !s.is_selected));
    }

    #[test]
    fn test_apply_replaces_document() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        let template = TemplateLibrary::get("social-post").unwrap();
        store.dispatch_all(template.apply());

        let state = store.state();
        assert_eq!(state.len(), 3);
        assert_eq!(state.canvas.width, 1080.0);
        assert!(state.selected_ids().is_empty());
        assert!(state.is_consistent());
    }

    #[test]
    fn test_from_selection() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 1.0, 1.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(5.0, 5.0, 1.0, 1.0)));
        let template = Template::from_selection(store.state(), "sel");
        assert_eq!(template.shapes.len(), 1);
        assert_eq!(template.shapes[0].shape.x, 5.0);
        assert_eq!(template.shapes[0].z_index, 0);
    }

    #[test]
    fn test_from_selection_takes_nested_groups() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(40.0, 0.0, 10.0, 10.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(90.0, 90.0, 10.0, 10.0)));
        let ids: Vec<ShapeId> = store.state().iter().map(|s| s.id.clone()).collect();
        store.dispatch(Action::GroupShapes(vec![ids[0].clone(), ids[1].clone()]));
        let inner = store.state().selected_ids()[0].clone();
        store.dispatch(Action::GroupShapes(vec![inner.clone(), ids[2].clone()]));
        let outer = store.state().selected_ids()[0].clone();
        assert_eq!(store.state().descendants(&outer).len(), 4);

        let template = Template::from_selection(store.state(), "nested");
        // Outer group, inner group and three rectangles; the loose one stays out.
        assert_eq!(template.shapes.len(), 5);
        let shapes = template.ordered_shapes();
        assert!(shapes.iter().all(|s| s.id != ids[3]));
        let top: Vec<_> = shapes.iter().filter(|s| s.group_id.is_none()).collect();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].id, outer);

        // A member picked without its group is exported top-level.
        store.dispatch(Action::SelectShapes(vec![ids[0].clone()]));
        let template = Template::from_selection(store.state(), "member");
        assert_eq!(template.shapes.len(), 1);
        assert_eq!(template.shapes[0].shape.group_id, None);
    }

    #[test]
    fn test_insert_twice_keeps_groups_apart() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
        let ids: Vec<ShapeId> = store.state().iter().map(|s| s.id.clone()).collect();
        store.dispatch(Action::GroupShapes(ids));
        let template = Template::from_state(store.state(), "pair");

        for _ in 0..2 {
            let actions = template.insert(store.state()).unwrap();
            store.dispatch_all(actions);
        }

        let state = store.state();
        assert_eq!(state.len(), 9);
        assert!(state.is_consistent());
        let groups: Vec<_> = state.iter().filter(|s| s.kind == ShapeKind::Group).collect();
        assert_eq!(groups.len(), 3);
        for group in groups {
            assert_eq!(state.group_members(&group.id).len(), 2, "{}", group.id);
        }
    }

    #[test]
    fn test_insert_never_joins_host_groups() {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::AddShape(ShapeRecord::rect(0.0, 0.0, 10.0, 10.0)));
        store.dispatch(Action::AddShape(ShapeRecord::rect(20.0, 0.0, 10.0, 10.0)));
        let ids: Vec<ShapeId> = store.state().iter().map(|s| s.id.clone()).collect();
        store.dispatch(Action::GroupShapes(ids));
        let group = store.state().selected_ids()[0].clone();

        let mut template = TemplateLibrary::get("blank").unwrap();
        let mut stray = ShapeRecord::rect(5.0, 5.0, 1.0, 1.0);
        stray.group_id = Some(group.clone());
        push(&mut template, "stray", stray);
        store.dispatch_all(template.insert(store.state()).unwrap());
        assert_eq!(store.state().group_members(&group).len(), 2);
        let stray = store.state().shape(&ShapeId::new("stray")).unwrap();
        assert_eq!(stray.group_id, None);
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(Template::from_json("{ nope"), Err(TemplateError::Parse(_))));
    }

    #[test]
    fn test_insert_empty_template_fails() {
        let state = EditorState::new();
        let blank = TemplateLibrary::get("blank").unwrap();
        assert!(matches!(blank.insert(&state), Err(TemplateError::Empty)));
    }
}
