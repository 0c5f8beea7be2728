//! UI color themes.

use crate::shapes::SerializableColor;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Built-in themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeKind {
    #[default]
    Light,
    Dark,
    HighContrast,
    Sepia,
}

impl ThemeKind {
    pub const ALL: [ThemeKind; 4] = [
        ThemeKind::Light,
        ThemeKind::Dark,
        ThemeKind::HighContrast,
        ThemeKind::Sepia,
    ];

    /// Name as shown and saved.
    pub fn name(&self) -> &'static str {
        match self {
            ThemeKind::Light => "light",
            ThemeKind::Dark => "dark",
            ThemeKind::HighContrast => "high-contrast",
            ThemeKind::Sepia => "sepia",
        }
    }

    /// Accepts `"high contrast"` and `"high-contrast"`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_lowercase().replace(' ', "-");
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// True for dark backgrounds.
    pub fn is_dark(&self) -> bool {
        matches!(self, ThemeKind::Dark | ThemeKind::HighContrast)
    }

    /// Full palette for this kind.
    pub fn theme(&self) -> Theme {
        match self {
            ThemeKind::Light => Theme {
                kind: *self,
                background: SerializableColor::rgb(250, 250, 252),
                surface: SerializableColor::white(),
                text: SerializableColor::rgb(60, 60, 60),
                text_muted: SerializableColor::rgb(120, 120, 120),
                accent: SerializableColor::rgb(59, 130, 246),
                border: SerializableColor::rgb(220, 220, 220),
                canvas: SerializableColor::rgb(243, 244, 246),
                selection: SerializableColor::rgb(59, 130, 246),
                hover: SerializableColor::rgb(245, 245, 245),
            },
            ThemeKind::Dark => Theme {
                kind: *self,
                background: SerializableColor::rgb(17, 24, 39),
                surface: SerializableColor::rgb(31, 41, 55),
                text: SerializableColor::rgb(243, 244, 246),
                text_muted: SerializableColor::rgb(156, 163, 175),
                accent: SerializableColor::rgb(96, 165, 250),
                border: SerializableColor::rgb(55, 65, 81),
                canvas: SerializableColor::rgb(3, 7, 18),
                selection: SerializableColor::rgb(96, 165, 250),
                hover: SerializableColor::rgb(55, 65, 81),
            },
            ThemeKind::HighContrast => Theme {
                kind: *self,
                background: SerializableColor::black(),
                surface: SerializableColor::black(),
                text: SerializableColor::white(),
                text_muted: SerializableColor::rgb(229, 231, 235),
                accent: SerializableColor::rgb(250, 204, 21),
                border: SerializableColor::white(),
                canvas: SerializableColor::black(),
                selection: SerializableColor::rgb(250, 204, 21),
                hover: SerializableColor::rgb(64, 64, 64),
            },
            ThemeKind::Sepia => Theme {
                kind: *self,
                background: SerializableColor::rgb(250, 245, 235),
                surface: SerializableColor::rgb(255, 251, 235),
                text: SerializableColor::rgb(68, 64, 60),
                text_muted: SerializableColor::rgb(120, 113, 108),
                accent: SerializableColor::rgb(180, 83, 9),
                border: SerializableColor::rgb(231, 229, 228),
                canvas: SerializableColor::rgb(245, 238, 220),
                selection: SerializableColor::rgb(217, 119, 6),
                hover: SerializableColor::rgb(245, 245, 244),
            },
        }
    }
}

/// Colors for each UI role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub kind: ThemeKind,
    pub background: SerializableColor,
    pub surface: SerializableColor,
    pub text: SerializableColor,
    pub text_muted: SerializableColor,
    pub accent: SerializableColor,
    pub border: SerializableColor,
    /// Area around the artboard.
    pub canvas: SerializableColor,
    /// Selection outlines and handles.
    pub selection: SerializableColor,
    pub hover: SerializableColor,
}

impl Default for Theme {
    fn default() -> Self {
        ThemeKind::default().theme()
    }
}

impl Theme {
    fn roles(&self) -> [(&'static str, SerializableColor); 9] {
        [
            ("background", self.background),
            ("surface", self.surface),
            ("text", self.text),
            ("text-muted", self.text_muted),
            ("accent", self.accent),
            ("border", self.border),
            ("canvas", self.canvas),
            ("selection", self.selection),
            ("hover", self.hover),
        ]
    }

    /// `--theme-*` custom properties on `:root`.
    pub fn css_variables(&self) -> String {
        let mut css = String::from(":root {\n");
        for (role, color) in self.roles() {
            let _ = writeln!(css, "  --theme-{}: {};", role, color.to_hex());
        }
        css.push_str("}\n");
        css
    }
}

/// Current theme selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeManager {
    chosen: ThemeKind,
    follow_system: bool,
    system_dark: bool,
}

impl Default for ThemeManager {
    fn default() -> Self {
        Self::new(ThemeKind::default())
    }
}

impl ThemeManager {
    /// Manager starting on `kind`, ignoring the system setting.
    pub fn new(kind: ThemeKind) -> Self {
        Self {
            chosen: kind,
            follow_system: false,
            system_dark: false,
        }
    }

    /// Effective theme kind: the system preference when following it,
    /// the chosen theme otherwise.
    pub fn current(&self) -> ThemeKind {
        if self.follow_system {
            if self.system_dark {
                ThemeKind::Dark
            } else {
                ThemeKind::Light
            }
        } else {
            self.chosen
        }
    }

    /// Palette of the effective theme.
    pub fn theme(&self) -> Theme {
        self.current().theme()
    }

    /// Choose a theme explicitly. Stops following the system.
    pub fn set(&mut self, kind: ThemeKind) {
        log::info!("Theme set to {}", kind.name());
        self.chosen = kind;
        self.follow_system = false;
    }

    /// Switch between light and dark. High contrast toggles to light,
    /// sepia to dark.
    pub fn toggle(&mut self) -> ThemeKind {
        let next = if self.current().is_dark() {
            ThemeKind::Light
        } else {
            ThemeKind::Dark
        };
        self.set(next);
        next
    }

    /// Follow the system light/dark setting.
    pub fn follow_system(&mut self, follow: bool) {
        self.follow_system = follow;
    }

    /// True while following the system setting.
    pub fn is_following_system(&self) -> bool {
        self.follow_system
    }

    /// Record a change of the system color scheme.
    pub fn system_changed(&mut self, prefers_dark: bool) {
        self.system_dark = prefers_dark;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(ThemeKind::from_name("High Contrast"), Some(ThemeKind::HighContrast));
        assert_eq!(ThemeKind::from_name("sepia"), Some(ThemeKind::Sepia));
        assert_eq!(ThemeKind::from_name("neon"), None);
    }

    #[test]
    fn test_text_is_readable() {
        for kind in ThemeKind::ALL {
            let theme = kind.theme();
            assert!(
                theme.text.contrast_ratio(&theme.background) >= 4.5,
                "{} text contrast too low",
                kind.name()
            );
        }
        let hc = ThemeKind::HighContrast.theme();
        assert!(hc.text.contrast_ratio(&hc.background) >= 20.0);
    }

    #[test]
    fn test_toggle() {
        let mut manager = ThemeManager::default();
        assert_eq!(manager.toggle(), ThemeKind::Dark);
        assert_eq!(manager.toggle(), ThemeKind::Light);
        manager.set(ThemeKind::Sepia);
        assert_eq!(manager.toggle(), ThemeKind::Dark);
    }

    #[test]
    fn test_follow_system() {
        let mut manager = ThemeManager::new(ThemeKind::Sepia);
        manager.follow_system(true);
        assert_eq!(manager.current(), ThemeKind::Light);
        manager.system_changed(true);
        assert_eq!(manager.current(), ThemeKind::Dark);
        manager.set(ThemeKind::Sepia);
        assert!(!manager.is_following_system());
        assert_eq!(manager.current(), ThemeKind::Sepia);
    }

    #[test]
    fn test_css_variables() {
        let css = ThemeKind::Dark.theme().css_variables();
        assert!(css.contains("--theme-background: #111827;"));
        assert!(css.contains("--theme-text-muted:"));
    }
}
