//! Text block properties.

use serde::{Deserialize, Serialize};

/// Font weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Light,
    #[default]
    Regular,
    Medium,
    Bold,
}

impl FontWeight {
    /// Numeric CSS weight.
    pub fn css_weight(&self) -> u16 {
        match self {
            FontWeight::Light => 300,
            FontWeight::Regular => 400,
            FontWeight::Medium => 500,
            FontWeight::Bold => 700,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Content and font settings of a text shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    pub content: String,
    pub font_family: String,
    pub font_size: f64,
    #[serde(default)]
    pub font_weight: FontWeight,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub align: TextAlign,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default)]
    pub letter_spacing: f64,
}

fn default_line_height() -> f64 {
    1.2
}

/// Default font family for new text.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Default font size for new text.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

impl TextBlock {
    /// Text in the default font.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            font_weight: FontWeight::default(),
            italic: false,
            align: TextAlign::default(),
            line_height: default_line_height(),
            letter_spacing: 0.0,
        }
    }

    /// Lines of the content.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content.lines()
    }

    /// Rough layout size: average glyph width of 0.6em, no wrapping.
    pub fn estimated_size(&self) -> (f64, f64) {
        let line_count = self.content.lines().count().max(1);
        let longest = self
            .content
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let width = longest as f64 * (self.font_size * 0.6 + self.letter_spacing);
        let height = line_count as f64 * self.font_size * self.line_height;
        (width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_size() {
        let mut text = TextBlock::new("abcd\nab");
        text.font_size = 10.0;
        let (w, h) = text.estimated_size();
        assert!((w - 24.0).abs() < 1e-9);
        assert!((h - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let text = TextBlock::new("");
        let (w, h) = text.estimated_size();
        assert_eq!(w, 0.0);
        assert!(h > 0.0);
    }
}
