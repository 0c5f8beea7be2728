//! Shell errors.

use artboard_core::config::ConfigError;
use artboard_core::deploy::DeployError;
use artboard_core::storage::StorageError;
use artboard_core::style_guide::StyleGuideError;
use artboard_core::template::TemplateError;
use artboard_render::RendererError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    StyleGuide(#[from] StyleGuideError),
    #[error(transparent)]
    Render(#[from] RendererError),
    #[error(transparent)]
    Deploy(#[from] DeployError),
    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not access {path}: {message}")]
    File { path: PathBuf, message: String },
    #[error("No shortcut bound to {0}")]
    UnknownShortcut(String),
    #[error("Invalid key {0}")]
    InvalidKey(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn file(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
