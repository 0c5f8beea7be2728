//! Paint properties: colors, gradients, shadows.

use peniko::Color;
use serde::{Deserialize, Serialize};

/// Serializable color representation (RGBA8).
///
/// Serialized as a CSS hex string (`#rrggbb` or `#rrggbbaa`) so exported
/// templates and style guides stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn black() -> Self {
        Self::rgb(0, 0, 0)
    }

    pub const fn white() -> Self {
        Self::rgb(255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Parse a CSS color: `#rgb`, `#rrggbb`, `#rrggbbaa`, `transparent`,
    /// or one of the named colors in [`NAMED_COLORS`].
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.eq_ignore_ascii_case("transparent") {
            return Some(Self::transparent());
        }
        if let Some(hex) = input.strip_prefix('#') {
            let channel = |s: &str| u8::from_str_radix(s, 16).ok();
            return match hex.len() {
                3 => {
                    let r = channel(&hex[0..1])? * 17;
                    let g = channel(&hex[1..2])? * 17;
                    let b = channel(&hex[2..3])? * 17;
                    Some(Self::rgb(r, g, b))
                }
                6 => Some(Self::rgb(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                )),
                8 => Some(Self::new(
                    channel(&hex[0..2])?,
                    channel(&hex[2..4])?,
                    channel(&hex[4..6])?,
                    channel(&hex[6..8])?,
                )),
                _ => None,
            };
        }
        Self::named(input)
    }

    /// Look up a color by name (case-insensitive).
    pub fn named(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }

    /// Format as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Alpha as a 0.0..=1.0 fraction.
    pub fn alpha(&self) -> f64 {
        self.a as f64 / 255.0
    }

    /// Multiply alpha by `opacity`.
    pub fn with_opacity(&self, opacity: f64) -> Self {
        let a = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..*self }
    }

    /// Relative luminance (WCAG definition).
    pub fn luminance(&self) -> f64 {
        let lin = |c: u8| {
            let c = c as f64 / 255.0;
            if c <= 0.03928 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        };
        0.2126 * lin(self.r) + 0.7152 * lin(self.g) + 0.0722 * lin(self.b)
    }

    /// WCAG contrast ratio between two colors (1.0..=21.0).
    pub fn contrast_ratio(&self, other: &Self) -> f64 {
        let (a, b) = (self.luminance(), other.luminance());
        let (hi, lo) = if a > b { (a, b) } else { (b, a) };
        (hi + 0.05) / (lo + 0.05)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

impl Serialize for SerializableColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SerializableColor {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color: {s}")))
    }
}

/// Color names understood by [`SerializableColor::named`] (and by voice commands).
pub const NAMED_COLORS: &[(&str, SerializableColor)] = &[
    ("black", SerializableColor::rgb(0, 0, 0)),
    ("white", SerializableColor::rgb(255, 255, 255)),
    ("red", SerializableColor::rgb(239, 68, 68)),
    ("orange", SerializableColor::rgb(249, 115, 22)),
    ("yellow", SerializableColor::rgb(234, 179, 8)),
    ("green", SerializableColor::rgb(34, 197, 94)),
    ("teal", SerializableColor::rgb(20, 184, 166)),
    ("blue", SerializableColor::rgb(59, 130, 246)),
    ("indigo", SerializableColor::rgb(99, 102, 241)),
    ("purple", SerializableColor::rgb(168, 85, 247)),
    ("pink", SerializableColor::rgb(236, 72, 153)),
    ("gray", SerializableColor::rgb(107, 114, 128)),
    ("grey", SerializableColor::rgb(107, 114, 128)),
];

/// Gradient geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum GradientKind {
    /// Linear gradient at `angle` degrees (0 = left to right).
    Linear { angle: f64 },
    /// Radial gradient from the shape center.
    Radial,
}

/// One color stop; `offset` is in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f64,
    pub color: SerializableColor,
}

/// Gradient fill. Overrides the solid fill when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<GradientStop>,
}

impl Gradient {
    /// Two-stop linear gradient.
    pub fn linear(angle: f64, from: SerializableColor, to: SerializableColor) -> Self {
        Self {
            kind: GradientKind::Linear { angle },
            stops: vec![
                GradientStop { offset: 0.0, color: from },
                GradientStop { offset: 1.0, color: to },
            ],
        }
    }

    /// Two-stop radial gradient.
    pub fn radial(inner: SerializableColor, outer: SerializableColor) -> Self {
        Self {
            kind: GradientKind::Radial,
            stops: vec![
                GradientStop { offset: 0.0, color: inner },
                GradientStop { offset: 1.0, color: outer },
            ],
        }
    }
}

/// Drop shadow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    pub color: SerializableColor,
    pub blur: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Shadow {
    fn default() -> Self {
        Self {
            color: SerializableColor::new(0, 0, 0, 64),
            blur: 8.0,
            offset_x: 0.0,
            offset_y: 4.0,
        }
    }
}

/// Paint properties for shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeStyle {
    /// Fill color (None = no fill).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<SerializableColor>,
    /// Stroke color (None = no stroke).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<SerializableColor>,
    pub stroke_width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradient: Option<Gradient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<Shadow>,
}

fn default_opacity() -> f64 {
    1.0
}

impl Default for ShapeStyle {
    fn default() -> Self {
        Self {
            fill: Some(SerializableColor::rgb(59, 130, 246)),
            stroke: Some(SerializableColor::black()),
            stroke_width: 2.0,
            opacity: 1.0,
            gradient: None,
            shadow: None,
        }
    }
}

impl ShapeStyle {
    /// Fill color with opacity applied.
    pub fn fill_with_opacity(&self) -> Option<SerializableColor> {
        self.fill.map(|c| c.with_opacity(self.opacity))
    }

    /// Stroke color with opacity applied.
    pub fn stroke_with_opacity(&self) -> Option<SerializableColor> {
        self.stroke.map(|c| c.with_opacity(self.opacity))
    }

    /// Every color this style paints with.
    pub fn colors(&self) -> Vec<SerializableColor> {
        let mut colors: Vec<_> = self.fill.into_iter().chain(self.stroke).collect();
        if let Some(gradient) = &self.gradient {
            colors.extend(gradient.stops.iter().map(|s| s.color));
        }
        colors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!(SerializableColor::parse("#fff"), Some(SerializableColor::white()));
        assert_eq!(
            SerializableColor::parse("#3b82f6"),
            Some(SerializableColor::rgb(59, 130, 246))
        );
        assert_eq!(
            SerializableColor::parse("#00000080"),
            Some(SerializableColor::new(0, 0, 0, 128))
        );
        assert_eq!(SerializableColor::parse("#12345"), None);
        assert_eq!(SerializableColor::parse("#zzzzzz"), None);
    }

    #[test]
    fn test_parse_named() {
        assert_eq!(SerializableColor::parse("Red"), SerializableColor::named("red"));
        assert!(SerializableColor::parse("chartreuse-ish").is_none());
    }

    #[test]
    fn test_hex_serde() {
        let color = SerializableColor::new(1, 2, 3, 4);
        let json = serde_json::to_string(&color).unwrap();
        assert_eq!(json, "\"#01020304\"");
        let back: SerializableColor = serde_json::from_str(&json).unwrap();
        assert_eq!(back, color);
    }

    #[test]
    fn test_contrast_ratio() {
        let ratio = SerializableColor::black().contrast_ratio(&SerializableColor::white());
        assert!((ratio - 21.0).abs() < 0.01);
    }

    #[test]
    fn test_opacity() {
        let style = ShapeStyle {
            fill: Some(SerializableColor::white()),
            opacity: 0.5,
            ..ShapeStyle::default()
        };
        assert_eq!(style.fill_with_opacity().unwrap().a, 128);
    }

    #[test]
    fn test_peniko_roundtrip() {
        let color = SerializableColor::new(10, 20, 30, 40);
        let peniko: Color = color.into();
        assert_eq!(SerializableColor::from(peniko), color);
    }
}
