//! Editor configuration file.

use crate::canvas::{DEFAULT_ARTBOARD_HEIGHT, DEFAULT_ARTBOARD_WIDTH};
use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::monitor::{DEFAULT_FRAME_BUDGET_MS, DEFAULT_MEMORY_BUDGET_BYTES};
use crate::storage::DEFAULT_AUTOSAVE_INTERVAL_SECS;
use crate::theme::ThemeKind;
use crate::voice::DEFAULT_MIN_CONFIDENCE;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read {path}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("Invalid config {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("Could not determine the config directory")]
    NoConfigDir,
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Editor settings, read from `config.json`. Every field has a default, so
/// a partial file is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub history_limit: usize,
    pub autosave_interval_secs: u64,
    /// Document directory; the platform data directory when unset.
    pub storage_dir: Option<PathBuf>,
    pub theme: ThemeKind,
    pub artboard_width: f64,
    pub artboard_height: f64,
    pub frame_budget_ms: f64,
    pub memory_budget_bytes: usize,
    pub min_voice_confidence: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            autosave_interval_secs: DEFAULT_AUTOSAVE_INTERVAL_SECS,
            storage_dir: None,
            theme: ThemeKind::default(),
            artboard_width: DEFAULT_ARTBOARD_WIDTH,
            artboard_height: DEFAULT_ARTBOARD_HEIGHT,
            frame_budget_ms: DEFAULT_FRAME_BUDGET_MS,
            memory_budget_bytes: DEFAULT_MEMORY_BUDGET_BYTES,
            min_voice_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }
}

impl EditorConfig {
    /// `<config dir>/artboard/config.json`.
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("artboard").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Read `path`. A missing file yields the defaults; an unreadable or
    /// invalid one is an error.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let io_error = |e: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, json).map_err(io_error)
    }

    /// Autosave interval as a [`Duration`].
    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_secs)
    }

    /// Configured storage directory, or the platform default.
    pub fn storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| crate::storage::FileStorage::default_path().ok())
    }
}
