//! Artboard Core Library
//!
//! Document model, reducer-driven editor store and the editor services
//! built on it (templates, style guides, measurements, themes, voice
//! commands, storage, offline sync, instrumentation and deployment).

pub mod canvas;
pub mod command;
pub mod config;
pub mod deploy;
pub mod history;
pub mod measure;
pub mod monitor;
pub mod offline;
pub mod preferences;
pub mod shapes;
pub mod storage;
pub mod store;
pub mod style_guide;
pub mod template;
pub mod theme;
pub mod tools;
pub mod voice;

pub use canvas::{CanvasPatch, CanvasView};
pub use command::{Command, CommandEffect};
pub use config::EditorConfig;
pub use history::History;
pub use shapes::{ShapeId, ShapeKind, ShapePatch, ShapeRecord};
pub use store::{Action, EditorState, EditorStore, reduce};
pub use theme::{Theme, ThemeKind, ThemeManager};
pub use tools::{PanelKind, ToolKind};
