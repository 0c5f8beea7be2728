//! Style guide generation from the document's shapes.

use crate::shapes::{FontWeight, SerializableColor, ShapeKind, ShapeRecord};
use crate::store::EditorState;
use kurbo::Rect;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StyleGuideError {
    #[error("Invalid style guide JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type StyleGuideResult<T> = Result<T, StyleGuideError>;

/// A palette entry and where it is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorUsage {
    pub color: SerializableColor,
    pub fills: usize,
    pub strokes: usize,
    pub gradient_stops: usize,
}

impl ColorUsage {
    /// Total uses across fills, strokes and gradients.
    pub fn count(&self) -> usize {
        self.fills + self.strokes + self.gradient_stops
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypographyStyle {
    pub font_family: String,
    pub font_size: f64,
    pub font_weight: FontWeight,
    pub count: usize,
}

/// A measured value and how often it occurs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGuide {
    pub name: String,
    pub colors: Vec<ColorUsage>,
    pub typography: Vec<TypographyStyle>,
    pub stroke_widths: Vec<ValueCount>,
    pub corner_radii: Vec<ValueCount>,
    /// Gaps between neighbouring shapes, rounded to whole pixels.
    pub spacing: Vec<ValueCount>,
}

impl StyleGuide {
    /// Collect colors, type, strokes, radii and spacing from visible shapes.
    pub fn generate(state: &EditorState, name: impl Into<String>) -> Self {
        let shapes: Vec<&ShapeRecord> = state
            .iter()
            .filter(|s| s.visible && s.kind != ShapeKind::Group)
            .collect();

        Self {
            name: name.into(),
            colors: collect_colors(&shapes),
            typography: collect_typography(&shapes),
            stroke_widths: count_values(
                shapes
                    .iter()
                    .filter(|s| s.style.stroke.is_some() && s.style.stroke_width > 0.0)
                    .map(|s| s.style.stroke_width),
            ),
            corner_radii: count_values(
                shapes
                    .iter()
                    .filter(|s| s.kind == ShapeKind::Rect && s.corner_radius > 0.0)
                    .map(|s| s.corner_radius),
            ),
            spacing: count_values(
                neighbour_gaps(&shapes.iter().map(|s| s.bounds()).collect::<Vec<_>>())
                    .into_iter()
                    .map(f64::round),
            ),
        }
    }

    /// True without colors or typography.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty() && self.typography.is_empty()
    }

    /// Most used color, if any.
    pub fn primary_color(&self) -> Option<SerializableColor> {
        self.colors.first().map(|c| c.color)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> StyleGuideResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse an exported guide.
    pub fn from_json(json: &str) -> StyleGuideResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// CSS custom properties on `:root`.
    pub fn to_css(&self) -> String {
        let mut css = String::from(":root {\n");
        for (i, usage) in self.colors.iter().enumerate() {
            let _ = writeln!(css, "  --color-{}: {};", i + 1, usage.color.to_hex());
        }
        for (i, style) in self.typography.iter().enumerate() {
            let n = i + 1;
            let _ = writeln!(css, "  --font-{}-family: \"{}\";", n, style.font_family);
            let _ = writeln!(css, "  --font-{}-size: {}px;", n, style.font_size);
            let _ = writeln!(css, "  --font-{}-weight: {};", n, style.font_weight.css_weight());
        }
        for (i, width) in self.stroke_widths.iter().enumerate() {
            let _ = writeln!(css, "  --stroke-{}: {}px;", i + 1, width.value);
        }
        for (i, radius) in self.corner_radii.iter().enumerate() {
            let _ = writeln!(css, "  --radius-{}: {}px;", i + 1, radius.value);
        }
        for (i, gap) in self.spacing.iter().enumerate() {
            let _ = writeln!(css, "  --space-{}: {}px;", i + 1, gap.value);
        }
        css.push_str("}\n");
        css
    }
}

fn collect_colors(shapes: &[&ShapeRecord]) -> Vec<ColorUsage> {
    fn entry(
        usage: &mut HashMap<SerializableColor, ColorUsage>,
        color: SerializableColor,
    ) -> &mut ColorUsage {
        usage.entry(color).or_insert(ColorUsage {
            color,
            fills: 0,
            strokes: 0,
            gradient_stops: 0,
        })
    }

    let mut usage = HashMap::new();
    for shape in shapes {
        let style = &shape.style;
        if let Some(fill) = style.fill {
            entry(&mut usage, fill).fills += 1;
        }
        if let Some(stroke) = style.stroke {
            entry(&mut usage, stroke).strokes += 1;
        }
        if let Some(gradient) = &style.gradient {
            for stop in &gradient.stops {
                entry(&mut usage, stop.color).gradient_stops += 1;
            }
        }
    }
    let mut colors: Vec<ColorUsage> = usage.into_values().collect();
    colors.sort_by(|a, b| {
        b.count()
            .cmp(&a.count())
            .then_with(|| a.color.to_hex().cmp(&b.color.to_hex()))
    });
    colors
}

fn collect_typography(shapes: &[&ShapeRecord]) -> Vec<TypographyStyle> {
    let mut styles: Vec<TypographyStyle> = Vec::new();
    for text in shapes.iter().filter_map(|s| s.text.as_ref()) {
        let existing = styles.iter_mut().find(|s| {
            s.font_family == text.font_family
                && s.font_size == text.font_size
                && s.font_weight == text.font_weight
        });
        match existing {
            Some(style) => style.count += 1,
            None => styles.push(TypographyStyle {
                font_family: text.font_family.clone(),
                font_size: text.font_size,
                font_weight: text.font_weight,
                count: 1,
            }),
        }
    }
    // Largest first, like a type scale.
    styles.sort_by(|a, b| b.font_size.total_cmp(&a.font_size));
    styles
}

/// Count values, keyed to two decimals, most frequent first.
fn count_values(values: impl Iterator<Item = f64>) -> Vec<ValueCount> {
    let mut counts: BTreeMap<i64, ValueCount> = BTreeMap::new();
    for value in values {
        let key = (value * 100.0).round() as i64;
        counts
            .entry(key)
            .or_insert(ValueCount { value: key as f64 / 100.0, count: 0 })
            .count += 1;
    }
    let mut out: Vec<ValueCount> = counts.into_values().collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then(a.value.total_cmp(&b.value)));
    out
}

/// For every box, the gap to its nearest neighbour to the right (among boxes
/// overlapping it vertically) and below (among boxes overlapping it
/// horizontally).
fn neighbour_gaps(boxes: &[Rect]) -> Vec<f64> {
    let mut gaps = Vec::new();
    for (i, a) in boxes.iter().enumerate() {
        let mut right: Option<f64> = None;
        let mut below: Option<f64> = None;
        for (j, b) in boxes.iter().enumerate() {
            if i == j {
                continue;
            }
            let vertical_overlap = a.y0 < b.y1 && b.y0 < a.y1;
            let horizontal_overlap = a.x0 < b.x1 && b.x0 < a.x1;
            let dx = b.x0 - a.x1;
            if vertical_overlap && dx > 0.0 {
                right = Some(right.map_or(dx, |r| r.min(dx)));
            }
            let dy = b.y0 - a.y1;
            if horizontal_overlap && dy > 0.0 {
                below = Some(below.map_or(dy, |r| r.min(dy)));
            }
        }
        gaps.extend(right);
        gaps.extend(below);
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Gradient, SequentialIds};
    use crate::store::{Action, EditorStore};
    use kurbo::Point;

    fn store_with(shapes: Vec<ShapeRecord>) -> EditorStore {
        let mut store = EditorStore::new().with_ids(SequentialIds::new());
        store.dispatch(Action::LoadShapes(shapes));
        store
    }

    #[test]
    fn test_palette_counts() {
        let red = SerializableColor::rgb(255, 0, 0);
        let mut a = ShapeRecord::rect(0.0, 0.0, 10.0, 10.0);
        a.style.fill = Some(red);
        let mut b = ShapeRecord::rect(20.0, 0.0, 10.0, 10.0);
        b.style.fill = Some(red);
        b.style.stroke = Some(red);
        let mut c = ShapeRecord::rect(40.0, 0.0, 10.0, 10.0);
        c.style.gradient = Some(Gradient::linear(0.0, red, SerializableColor::white()));

        let guide = StyleGuide::generate(store_with(vec![a, b, c]).state(), "g");
        let first = &guide.colors[0];
        assert_eq!(first.color, red);
        assert_eq!(first.fills, 2);
        assert_eq!(first.strokes, 1);
        assert_eq!(first.gradient_stops, 1);
        assert_eq!(guide.primary_color(), Some(red));
    }

    #[test]
    fn test_spacing_between_neighbours() {
        let shapes = vec![
            ShapeRecord::rect(0.0, 0.0, 10.0, 10.0),
            ShapeRecord::rect(26.0, 0.0, 10.0, 10.0),
            ShapeRecord::rect(52.0, 0.0, 10.0, 10.0),
        ];
        let guide = StyleGuide::generate(store_with(shapes).state(), "g");
        assert_eq!(guide.spacing, vec![ValueCount { value: 16.0, count: 2 }]);
    }

    #[test]
    fn test_typography_sorted_by_size() {
        let mut small = ShapeRecord::text(Point::new(0.0, 0.0), "body");
        small.text.as_mut().unwrap().font_size = 14.0;
        let mut big = ShapeRecord::text(Point::new(0.0, 100.0), "title");
        big.text.as_mut().unwrap().font_size = 48.0;
        let guide = StyleGuide::generate(store_with(vec![small.clone(), big, small]).state(), "g");
        assert_eq!(guide.typography.len(), 2);
        assert_eq!(guide.typography[0].font_size, 48.0);
        assert_eq!(guide.typography[1].count, 2);
    }

    #[test]
    fn test_json_roundtrip() {
        let mut rect = ShapeRecord::rect(0.0, 0.0, 10.0, 10.0);
        rect.corner_radius = 6.5;
        rect.style.stroke_width = 1.5;
        let text = ShapeRecord::text(Point::new(30.0, 0.0), "Hi");
        let guide = StyleGuide::generate(store_with(vec![rect, text]).state(), "Brand");
        let json = guide.to_json().unwrap();
        assert_eq!(StyleGuide::from_json(&json).unwrap(), guide);
        assert_eq!(guide.corner_radii[0].value, 6.5);
    }

    #[test]
    fn test_css_output() {
        let rect = ShapeRecord::rect(0.0, 0.0, 10.0, 10.0);
        let guide = StyleGuide::generate(store_with(vec![rect]).state(), "g");
        let css = guide.to_css();
        assert!(css.starts_with(":root {"));
        assert!(css.contains("--color-1: #"));
        assert!(css.contains("--stroke-1: 2px;"));
    }
}
