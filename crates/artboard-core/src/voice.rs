//! Voice command matching.
//!
//! Speech recognition happens elsewhere; this module takes the resulting
//! [`Transcript`]s, matches them against a phrase table and resolves the
//! matched [`Command`] against the editor state.

use crate::command::{Command, CommandEffect, resolve};
use crate::shapes::{SerializableColor, ShapeKind};
use crate::store::EditorState;
use crate::theme::ThemeKind;
use crate::tools::{PanelKind, ToolKind};
use std::collections::HashSet;

/// Transcripts below this recognizer confidence are ignored.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.6;
/// Minimum keyword-overlap score for a fuzzy match.
pub const MATCH_THRESHOLD: f64 = 0.6;

const FILLER_WORDS: &[&str] = &[
    "um", "uh", "er", "please", "the", "a", "an", "can", "you", "could", "would", "like", "hey",
    "just", "now", "okay", "ok", "some", "me", "i", "want", "to", "it", "this", "that",
];

/// Output of the speech recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Recognizer confidence in 0.0..=1.0.
    pub confidence: f64,
    /// False for interim results that may still change.
    pub is_final: bool,
}

impl Transcript {
    /// Final transcript with the recognizer's confidence.
    pub fn final_result(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            text: text.into(),
            confidence,
            is_final: true,
        }
    }
}

/// Lowercase, strip punctuation and filler words.
pub fn normalize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Fixed phrases. Parameterized commands (colors, shapes, tools, themes,
/// panels) are parsed separately.
fn phrase_table() -> Vec<(&'static str, Command)> {
    vec![
        ("delete", Command::DeleteSelected),
        ("delete selected", Command::DeleteSelected),
        ("remove selection", Command::DeleteSelected),
        ("undo", Command::Undo),
        ("undo last change", Command::Undo),
        ("go back", Command::Undo),
        ("redo", Command::Redo),
        ("redo last change", Command::Redo),
        ("zoom in", Command::ZoomIn),
        ("zoom closer", Command::ZoomIn),
        ("zoom out", Command::ZoomOut),
        ("zoom farther", Command::ZoomOut),
        ("reset zoom", Command::ResetZoom),
        ("actual size", Command::ResetZoom),
        ("select all", Command::SelectAll),
        ("select everything", Command::SelectAll),
        ("deselect", Command::Deselect),
        ("deselect all", Command::Deselect),
        ("clear selection", Command::Deselect),
        ("bigger", Command::Bigger),
        ("make bigger", Command::Bigger),
        ("make larger", Command::Bigger),
        ("smaller", Command::Smaller),
        ("make smaller", Command::Smaller),
        ("bring front", Command::BringToFront),
        ("bring forward", Command::BringToFront),
        ("send back", Command::SendToBack),
        ("send backward", Command::SendToBack),
        ("group", Command::Group),
        ("group selected", Command::Group),
        ("ungroup", Command::Ungroup),
        ("duplicate", Command::Duplicate),
        ("copy selection", Command::Duplicate),
    ]
}

/// Match a transcript's text to a command.
pub fn parse_command(text: &str) -> Option<Command> {
    let words = normalize(text);
    if words.is_empty() {
        return None;
    }
    let joined = words.join(" ");
    let table = phrase_table();

    if let Some((_, command)) = table.iter().find(|(phrase, _)| normalize(phrase).join(" ") == joined) {
        return Some(command.clone());
    }
    if let Some(command) = parse_parameterized(&words) {
        return Some(command);
    }

    let spoken: HashSet<&str> = words.iter().map(String::as_str).collect();
    let mut best: Option<(f64, &Command)> = None;
    for (phrase, command) in &table {
        let phrase_words = normalize(phrase);
        if phrase_words.is_empty() {
            continue;
        }
        let hits = phrase_words.iter().filter(|w| spoken.contains(w.as_str())).count();
        // Penalize long utterances that merely contain a keyword.
        let score = hits as f64 / phrase_words.len().max(words.len()) as f64;
        if score >= MATCH_THRESHOLD && best.is_none_or(|(s, _)| score > s) {
            best = Some((score, command));
        }
    }
    best.map(|(_, command)| command.clone())
}

fn has_any(words: &[String], candidates: &[&str]) -> bool {
    words.iter().any(|w| candidates.contains(&w.as_str()))
}

fn shape_word(word: &str) -> Option<ShapeKind> {
    match word {
        "rectangle" | "rect" | "square" | "box" => Some(ShapeKind::Rect),
        "circle" | "ellipse" | "oval" => Some(ShapeKind::Circle),
        "line" | "arrow" => Some(ShapeKind::Line),
        "text" | "label" | "heading" => Some(ShapeKind::Text),
        "icon" | "star" => Some(ShapeKind::Icon),
        _ => None,
    }
}

fn tool_word(word: &str) -> Option<ToolKind> {
    match word {
        "select" | "selection" | "pointer" => Some(ToolKind::Select),
        "pan" | "hand" => Some(ToolKind::Pan),
        "eraser" | "erase" => Some(ToolKind::Eraser),
        "measure" | "ruler" => Some(ToolKind::Measure),
        "image" | "picture" => Some(ToolKind::Image),
        other => shape_word(other).and_then(|kind| {
            ToolKind::ALL
                .into_iter()
                .find(|tool| tool.shape_kind() == Some(kind))
        }),
    }
}

fn parse_parameterized(words: &[String]) -> Option<Command> {
    if has_any(words, &["fill", "color", "colour", "make", "paint", "turn"]) {
        if let Some(color) = words.iter().find_map(|w| SerializableColor::named(w)) {
            return Some(Command::SetFill(color));
        }
    }

    if has_any(words, &["theme", "mode"]) {
        let joined = words.join(" ");
        if let Some(kind) = ThemeKind::ALL
            .into_iter()
            .find(|k| joined.contains(&k.name().replace('-', " ")))
        {
            return Some(Command::SetTheme(kind));
        }
    }

    if has_any(words, &["open", "show"]) {
        let rest: Vec<&str> = words
            .iter()
            .map(String::as_str)
            .filter(|w| !["open", "show", "panel"].contains(w))
            .collect();
        if let Some(panel) = PanelKind::from_title(&rest.join(" ")) {
            return Some(Command::OpenPanel(panel));
        }
    }

    if has_any(words, &["tool", "switch", "use"]) {
        if let Some(tool) = words.iter().find_map(|w| tool_word(w)) {
            return Some(Command::SetTool(tool));
        }
    }

    if has_any(words, &["add", "draw", "create", "insert", "new"]) {
        if let Some(kind) = words.iter().find_map(|w| shape_word(w)) {
            return Some(Command::AddShape(kind));
        }
    }
    None
}

/// Filters transcripts and resolves commands.
#[derive(Debug, Clone)]
pub struct VoiceController {
    pub enabled: bool,
    pub min_confidence: f64,
    last_command: Option<Command>,
}

impl Default for VoiceController {
    fn default() -> Self {
        Self {
            enabled: true,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            last_command: None,
        }
    }
}

impl VoiceController {
    /// Enabled controller with the default confidence threshold.
    pub fn new() -> Self {
        Self::default()
    }

    /// Last command that was recognised.
    pub fn last_command(&self) -> Option<&Command> {
        self.last_command.as_ref()
    }

    /// Handle a transcript. Returns `None` when the controller is disabled,
    /// the transcript is interim or low-confidence, or nothing matched.
    pub fn handle(&mut self, transcript: &Transcript, state: &EditorState) -> Option<CommandEffect> {
        if !self.enabled || !transcript.is_final {
            return None;
        }
        if transcript.confidence < self.min_confidence {
            log::debug!(
                "Ignoring low-confidence transcript ({:.2}): {}",
                transcript.confidence,
                transcript.text
            );
            return None;
        }
        let Some(command) = parse_command(&transcript.text) else {
            log::info!("No voice command matched: {}", transcript.text);
            return None;
        };
        log::debug!("Voice command: {:?}", command);
        let effect = resolve(&command, state);
        self.last_command = Some(command);
        Some(effect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::SequentialIds;
    use crate::store::EditorStore;

    fn store() -> EditorStore {
        EditorStore::new()
            .with_ids(SequentialIds::new())
            .with_default_history()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Um, please ZOOM in!"), vec!["zoom", "in"]);
        assert!(normalize("uh...").is_empty());
    }

    #[test]
    fn test_exact_and_fuzzy_phrases() {
        assert_eq!(parse_command("Undo"), Some(Command::Undo));
        assert_eq!(parse_command("could you zoom in please"), Some(Command::ZoomIn));
        assert_eq!(parse_command("select all shapes"), Some(Command::SelectAll));
        assert_eq!(parse_command("what a lovely day outside"), None);
    }

    #[test]
    fn test_parameterized_commands() {
        assert_eq!(
            parse_command("make it red"),
            Some(Command::SetFill(SerializableColor::named("red").unwrap()))
        );
        assert_eq!(parse_command("add a circle"), Some(Command::AddShape(ShapeKind::Circle)));
        assert_eq!(parse_command("switch to the eraser tool"), Some(Command::SetTool(ToolKind::Eraser)));
        assert_eq!(parse_command("line tool"), Some(Command::SetTool(ToolKind::Line)));
        assert_eq!(parse_command("dark mode"), Some(Command::SetTheme(ThemeKind::Dark)));
        assert_eq!(
            parse_command("high contrast theme"),
            Some(Command::SetTheme(ThemeKind::HighContrast))
        );
        assert_eq!(
            parse_command("open the layers panel"),
            Some(Command::OpenPanel(PanelKind::Layers))
        );
    }

    #[test]
    fn test_controller_ignores_interim_and_low_confidence() {
        let state = EditorState::new();
        let mut voice = VoiceController::new();
        let interim = Transcript {
            text: "undo".to_string(),
            confidence: 0.99,
            is_final: false,
        };
        assert_eq!(voice.handle(&interim, &state), None);
        assert_eq!(voice.handle(&Transcript::final_result("undo", 0.3), &state), None);
        assert_eq!(
            voice.handle(&Transcript::final_result("undo", 0.9), &state),
            Some(CommandEffect::Undo)
        );
        voice.enabled = false;
        assert_eq!(voice.handle(&Transcript::final_result("undo", 0.9), &state), None);
    }

    #[test]
    fn test_add_then_fill_then_undo() {
        let mut store = store();
        let mut voice = VoiceController::new();

        let Some(CommandEffect::Dispatch(actions)) =
            voice.handle(&Transcript::final_result("draw a rectangle", 0.9), store.state())
        else {
            panic!("expected actions");
        };
        store.dispatch_all(actions);
        assert_eq!(store.state().len(), 1);
        let shape = store.state().iter().next().unwrap();
        assert_eq!(shape.center(), store.state().canvas.artboard().center());

        let Some(CommandEffect::Dispatch(actions)) =
            voice.handle(&Transcript::final_result("fill green", 0.9), store.state())
        else {
            panic!("expected actions");
        };
        store.dispatch_all(actions);
        let green = SerializableColor::named("green");
        assert_eq!(store.state().iter().next().unwrap().style.fill, green);

        assert_eq!(
            voice.handle(&Transcript::final_result("undo", 0.9), store.state()),
            Some(CommandEffect::Undo)
        );
        assert!(store.undo());
        assert_ne!(store.state().iter().next().unwrap().style.fill, green);
    }
}
