//! Artboard Application
//!
//! Command-line shell over the editor: sessions bound to stored
//! documents, keyboard shortcuts, voice phrases, export and deployment.

mod cli;
mod error;
mod session;
mod shortcuts;

pub use cli::{Cli, CliCommand, ExportFormat, execute, run};
pub use error::{AppError, AppResult};
pub use session::Session;
pub use shortcuts::{KeyPress, Shortcut, ShortcutAction, ShortcutRegistry};
