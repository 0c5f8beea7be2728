//! Keyboard shortcut registry and documentation.

use artboard_core::{Command, ToolKind};
use std::fmt;
use std::str::FromStr;

/// What a shortcut does.
#[derive(Debug, Clone, PartialEq)]
pub enum ShortcutAction {
    Command(Command),
    Save,
}

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
    pub action: ShortcutAction,
}

impl Shortcut {
    pub const fn new(
        key: &'static str,
        ctrl: bool,
        shift: bool,
        description: &'static str,
        action: ShortcutAction,
    ) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
            action,
        }
    }

    /// Format the shortcut for display (e.g., "Ctrl+S").
    pub fn format(&self) -> String {
        format_keys(self.key, self.ctrl, self.shift)
    }

    /// Same key and modifiers.
    pub fn matches(&self, press: &KeyPress) -> bool {
        self.key == press.key && self.ctrl == press.ctrl && self.shift == press.shift
    }
}

fn format_keys(key: &str, ctrl: bool, shift: bool) -> String {
    let mut parts = Vec::new();
    if ctrl {
        parts.push("Ctrl");
    }
    if shift {
        parts.push("Shift");
    }
    parts.push(key);
    parts.join("+")
}

/// A key with modifiers, parsed from text such as `"ctrl+shift+z"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPress {
    pub key: String,
    pub ctrl: bool,
    pub shift: bool,
}

impl FromStr for KeyPress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut press = KeyPress {
            key: String::new(),
            ctrl: false,
            shift: false,
        };
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, modifiers)) = parts.split_last() else {
            return Err(format!("empty key: {s:?}"));
        };
        for modifier in modifiers {
            match modifier.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" => press.ctrl = true,
                "shift" => press.shift = true,
                other => return Err(format!("unknown modifier {other:?} in {s:?}")),
            }
        }
        press.key = normalize_key(key).ok_or_else(|| format!("empty key: {s:?}"))?;
        Ok(press)
    }
}

impl fmt::Display for KeyPress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_keys(&self.key, self.ctrl, self.shift))
    }
}

/// Single characters are upper-cased; names are capitalized ("delete" ->
/// "Delete", "esc" -> "Escape").
fn normalize_key(key: &str) -> Option<String> {
    let mut chars = key.chars();
    let first = chars.next()?;
    if chars.as_str().is_empty() {
        return Some(first.to_ascii_uppercase().to_string());
    }
    let lower = key.to_ascii_lowercase();
    let name = match lower.as_str() {
        "esc" => "Escape".to_string(),
        "del" => "Delete".to_string(),
        _ => first.to_ascii_uppercase().to_string() + &lower[first.len_utf8()..],
    };
    Some(name)
}

/// Registry of all keyboard shortcuts.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Get all registered shortcuts.
    pub fn all() -> Vec<Shortcut> {
        use ShortcutAction::{Command as Run, Save};
        vec![
            Shortcut::new("A", true, false, "Select all shapes", Run(Command::SelectAll)),
            Shortcut::new("S", true, false, "Save", Save),
            Shortcut::new("Z", true, false, "Undo", Run(Command::Undo)),
            Shortcut::new("Z", true, true, "Redo", Run(Command::Redo)),
            Shortcut::new("Y", true, false, "Redo", Run(Command::Redo)),
            Shortcut::new("G", true, false, "Group selected shapes", Run(Command::Group)),
            Shortcut::new("G", true, true, "Ungroup selected shapes", Run(Command::Ungroup)),
            Shortcut::new("D", true, false, "Duplicate selection", Run(Command::Duplicate)),
            Shortcut::new("]", true, true, "Bring to front", Run(Command::BringToFront)),
            Shortcut::new("[", true, true, "Send to back", Run(Command::SendToBack)),
            Shortcut::new("=", true, false, "Zoom in", Run(Command::ZoomIn)),
            Shortcut::new("-", true, false, "Zoom out", Run(Command::ZoomOut)),
            Shortcut::new("0", true, false, "Reset zoom", Run(Command::ResetZoom)),
            Shortcut::new("Delete", false, false, "Delete selected shapes", Run(Command::DeleteSelected)),
            Shortcut::new("Backspace", false, false, "Delete selected shapes", Run(Command::DeleteSelected)),
            Shortcut::new("Escape", false, false, "Clear selection", Run(Command::Deselect)),
            Shortcut::new("V", false, false, "Select tool", Run(Command::SetTool(ToolKind::Select))),
            Shortcut::new("H", false, false, "Pan tool", Run(Command::SetTool(ToolKind::Pan))),
            Shortcut::new("R", false, false, "Rectangle tool", Run(Command::SetTool(ToolKind::Rect))),
            Shortcut::new("O", false, false, "Circle tool", Run(Command::SetTool(ToolKind::Circle))),
            Shortcut::new("L", false, false, "Line tool", Run(Command::SetTool(ToolKind::Line))),
            Shortcut::new("T", false, false, "Text tool", Run(Command::SetTool(ToolKind::Text))),
            Shortcut::new("I", false, false, "Image tool", Run(Command::SetTool(ToolKind::Image))),
            Shortcut::new("K", false, false, "Icon tool", Run(Command::SetTool(ToolKind::Icon))),
            Shortcut::new("E", false, false, "Eraser tool", Run(Command::SetTool(ToolKind::Eraser))),
            Shortcut::new("M", false, false, "Measure tool", Run(Command::SetTool(ToolKind::Measure))),
        ]
    }

    /// Find the shortcut bound to `press`.
    pub fn lookup(press: &KeyPress) -> Option<Shortcut> {
        Self::all().into_iter().find(|s| s.matches(press))
    }

    /// Shortcut list as aligned text.
    pub fn describe_all() -> String {
        let mut out = String::from("=== Keyboard Shortcuts ===\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}
