//! User preferences persisted between sessions.

use crate::measure::Unit;
use crate::shapes::SerializableColor;
use crate::theme::ThemeKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Most recent colors kept.
pub const MAX_RECENT_COLORS: usize = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub theme: ThemeKind,
    pub follow_system_theme: bool,
    /// Newest first, no duplicates.
    pub recent_colors: Vec<SerializableColor>,
    pub voice_enabled: bool,
    pub measurement_unit: Unit,
    pub last_document: Option<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: ThemeKind::Light,
            follow_system_theme: false,
            recent_colors: Vec::new(),
            voice_enabled: false,
            measurement_unit: Unit::Px,
            last_document: None,
        }
    }
}

impl Preferences {
    /// Put `color` at the front of the recent list, without duplicates.
    pub fn push_recent_color(&mut self, color: SerializableColor) {
        self.recent_colors.retain(|c| *c != color);
        self.recent_colors.insert(0, color);
        self.recent_colors.truncate(MAX_RECENT_COLORS);
    }

    /// `<config dir>/artboard/preferences.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("artboard").join("preferences.json"))
    }

    /// Read preferences, falling back to defaults when the file is missing,
    /// unreadable or corrupt.
    pub fn load_or_default(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Could not read preferences {}: {}", path.display(), e);
                return Self::default();
            }
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt preferences {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Best-effort write; failures are logged.
    pub fn save(&self, path: &Path) -> bool {
        let result = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| {
                let json = serde_json::to_string_pretty(self)
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                fs::write(path, json)
            });
        if let Err(e) = &result {
            log::warn!("Could not save preferences {}: {}", path.display(), e);
        }
        result.is_ok()
    }
}
