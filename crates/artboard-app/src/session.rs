//! One editing session: a store bound to a document in storage, with the
//! user's theme and preferences.

use crate::error::{AppError, AppResult};
use crate::shortcuts::{KeyPress, Shortcut, ShortcutAction, ShortcutRegistry};
use artboard_core::command::resolve;
use artboard_core::measure::{DEFAULT_DPI, MeasurementSet, Unit};
use artboard_core::monitor::{DEFAULT_FRAME_WINDOW, MemoryReport, PerformanceMonitor};
use artboard_core::preferences::Preferences;
use artboard_core::shapes::SerializableColor;
use artboard_core::storage::{
    AutoSaveManager, FallbackStorage, FileStorage, MemoryStorage, SavedDocument, Storage,
};
use artboard_core::template::Template;
use artboard_core::voice::{Transcript, VoiceController};
use artboard_core::{
    Action, CanvasPatch, CommandEffect, EditorConfig, EditorState, EditorStore, Theme, ThemeKind,
    ThemeManager,
};
use std::path::PathBuf;
use std::sync::Arc;

pub struct Session {
    config: EditorConfig,
    store: EditorStore,
    themes: ThemeManager,
    preferences: Preferences,
    preferences_path: Option<PathBuf>,
    autosave: AutoSaveManager<dyn Storage>,
    voice: VoiceController,
    monitor: PerformanceMonitor,
}

impl Session {
    /// Open a session on the configured storage directory. Documents fall
    /// back to memory when the directory cannot be used.
    pub fn open(config: EditorConfig, preferences_path: Option<PathBuf>) -> Self {
        let memory: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let storage: Arc<dyn Storage> = match config.storage_dir().map(FileStorage::new) {
            Some(Ok(files)) => {
                log::debug!("Documents in {}", files.base_path().display());
                Arc::new(FallbackStorage::new(Arc::new(files), memory))
            }
            Some(Err(e)) => {
                log::warn!("File storage unavailable ({}); documents will not persist", e);
                memory
            }
            None => {
                log::warn!("No storage directory; documents will not persist");
                memory
            }
        };
        Self::with_storage(config, storage, preferences_path)
    }

    /// Session over an explicit storage backend.
    pub fn with_storage(
        config: EditorConfig,
        storage: Arc<dyn Storage>,
        preferences_path: Option<PathBuf>,
    ) -> Self {
        let preferences = match &preferences_path {
            Some(path) => Preferences::load_or_default(path),
            None => Preferences::default(),
        };
        let mut themes = ThemeManager::new(config.theme);
        if preferences_path.as_ref().is_some_and(|p| p.exists()) {
            themes.set(preferences.theme);
        }
        themes.follow_system(preferences.follow_system_theme);

        let mut voice = VoiceController::new();
        voice.min_confidence = config.min_voice_confidence;

        Self {
            store: EditorStore::new().with_history(config.history_limit),
            autosave: AutoSaveManager::new(storage).with_interval(config.autosave_interval()),
            monitor: PerformanceMonitor::new(config.frame_budget_ms, DEFAULT_FRAME_WINDOW),
            config,
            themes,
            preferences,
            preferences_path,
            voice,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &EditorStore {
        &self.store
    }

    /// Current editor state.
    pub fn state(&self) -> &EditorState {
        self.store.state()
    }

    /// Settings the session was opened with.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The resolved active theme.
    pub fn theme(&self) -> Theme {
        self.themes.theme()
    }

    /// User preferences, saved beside the config.
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Timing spans recorded so far.
    pub fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// True when the document has changes not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.autosave.is_dirty()
    }

    /// Id the document is saved under.
    pub fn document_id(&self) -> &str {
        self.autosave.document_id()
    }

    /// Start document `id` from `template`. A template without shapes gets
    /// the configured artboard size.
    pub fn new_document(&mut self, id: &str, name: &str, template: &Template) {
        let mut actions = template.apply();
        if template.shapes.is_empty() {
            actions.push(Action::UpdateCanvas(CanvasPatch::artboard(
                self.config.artboard_width,
                self.config.artboard_height,
                template.background,
            )));
        }
        let mut store = EditorStore::new();
        store.dispatch_all(actions);
        // Creation is not an undo step.
        self.store = EditorStore::with_state(store.state().clone())
            .with_history(self.config.history_limit);
        self.autosave.set_document(id, name);
        self.autosave.mark_dirty();
        log::info!("New document {} from template {}", id, template.name);
    }

    /// Load document `id`, replacing the current one and its history.
    pub async fn load(&mut self, id: &str) -> AppResult<()> {
        let document = self.autosave.load(id).await?;
        self.store.replace_state(document.to_state());
        self.remember_document(id);
        Ok(())
    }

    /// Save the current document and remember it as the last one opened.
    pub async fn save(&mut self) -> AppResult<SavedDocument> {
        let document = self.autosave.save(self.store.state()).await?;
        self.remember_document(&document.id);
        Ok(document)
    }

    /// Save when there are unsaved changes. Returns true if a save happened.
    pub async fn save_if_dirty(&mut self) -> AppResult<bool> {
        if !self.autosave.is_dirty() {
            return Ok(false);
        }
        self.save().await?;
        Ok(true)
    }

    /// Ids of all saved documents.
    pub async fn list(&self) -> AppResult<Vec<String>> {
        Ok(self.autosave.list_documents().await?)
    }

    /// Remove saved document `id`.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Ok(self.autosave.delete(id).await?)
    }

    /// Apply a resolved command. A command's actions form one undo step.
    /// Returns false when nothing happened.
    pub fn apply(&mut self, effect: CommandEffect) -> bool {
        match effect {
            CommandEffect::Dispatch(actions) => {
                let edits = actions.iter().any(Action::is_undoable);
                for action in &actions {
                    if let Some(color) = chosen_fill(action) {
                        self.preferences.push_recent_color(color);
                    }
                }
                let label = actions.first().map_or("batch", Action::name);
                let store = &mut self.store;
                self.monitor.time("dispatch", || {
                    store.dispatch_batch(label, actions);
                });
                if edits {
                    self.autosave.mark_dirty();
                }
                true
            }
            CommandEffect::Undo => self.step_history(EditorStore::undo),
            CommandEffect::Redo => self.step_history(EditorStore::redo),
            CommandEffect::SetTheme(kind) => {
                self.set_theme(kind);
                true
            }
            CommandEffect::Nothing => false,
        }
    }

    fn step_history(&mut self, step: fn(&mut EditorStore) -> bool) -> bool {
        let moved = step(&mut self.store);
        if moved {
            self.autosave.mark_dirty();
        }
        moved
    }

    /// Switch theme and stop following the system setting.
    pub fn set_theme(&mut self, kind: ThemeKind) {
        self.themes.set(kind);
        self.preferences.theme = kind;
        self.preferences.follow_system_theme = false;
        self.save_preferences();
    }

    /// Handle a spoken phrase. Returns false when it was ignored or
    /// changed nothing.
    pub fn say(&mut self, phrase: &str, confidence: f64) -> bool {
        let transcript = Transcript::final_result(phrase, confidence);
        match self.voice.handle(&transcript, self.store.state()) {
            Some(effect) => self.apply(effect),
            None => false,
        }
    }

    /// Handle a key press. Save shortcuts write the document immediately.
    pub async fn press(&mut self, press: &KeyPress) -> AppResult<Shortcut> {
        let shortcut = ShortcutRegistry::lookup(press)
            .ok_or_else(|| AppError::UnknownShortcut(press.to_string()))?;
        match &shortcut.action {
            ShortcutAction::Command(command) => {
                let effect = resolve(command, self.store.state());
                if !self.apply(effect) {
                    log::debug!("{} had no effect", shortcut.format());
                }
            }
            ShortcutAction::Save => {
                self.save().await?;
            }
        }
        Ok(shortcut)
    }

    /// Memory used by the document and its undo history.
    pub fn memory_report(&self) -> MemoryReport {
        MemoryReport::measure(
            self.store.state(),
            self.store.history(),
            self.config.memory_budget_bytes,
        )
    }

    /// Measurements between each pair of neighbouring top-level shapes.
    pub fn measurements(&self, unit: Unit) -> MeasurementSet {
        let mut set = MeasurementSet::new(unit, DEFAULT_DPI);
        let state = self.store.state();
        let ids: Vec<_> = state
            .iter()
            .filter(|s| s.group_id.is_none())
            .map(|s| s.id.clone())
            .collect();
        for pair in ids.windows(2) {
            set.measure_shapes(state, &pair[0], &pair[1]);
        }
        set
    }

    /// Run `f` as a timed span.
    pub fn timed<T>(&mut self, name: &str, f: impl FnOnce(&EditorState, &Theme) -> T) -> T {
        let theme = self.themes.theme();
        let state = self.store.state();
        self.monitor.time(name, || f(state, &theme))
    }

    fn remember_document(&mut self, id: &str) {
        if self.preferences.last_document.as_deref() != Some(id) {
            self.preferences.last_document = Some(id.to_string());
            self.save_preferences();
        }
    }

    fn save_preferences(&self) {
        if let Some(path) = &self.preferences_path {
            self.preferences.save(path);
        }
    }
}

/// Colors the user picked explicitly, for the recent-colors list.
fn chosen_fill(action: &Action) -> Option<SerializableColor> {
    match action {
        Action::UpdateShape { patch, .. } => patch.fill.flatten(),
        Action::UpdateToolSettings(patch) => patch.fill.flatten(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use artboard_core::Command;
    use artboard_core::template::TemplateLibrary;

    fn session() -> Session {
        Session::with_storage(EditorConfig::default(), Arc::new(MemoryStorage::new()), None)
    }

    #[test]
    fn test_new_document_is_not_undoable() {
        let mut session = session();
        let template = TemplateLibrary::get("business-card").unwrap();
        session.new_document("card", "Card", &template);
        assert_eq!(session.state().len(), template.shapes.len());
        assert!(!session.store().can_undo());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_commands_mark_dirty_only_for_edits() {
        let mut session = session();
        assert!(session.apply(resolve(&Command::ZoomIn, session.state())));
        assert!(!session.is_dirty());
        assert!(session.say("add a rectangle", 0.9));
        assert!(session.is_dirty());
        assert!(!session.apply(CommandEffect::Nothing));
    }

    #[test]
    fn test_fill_colors_are_remembered() {
        let mut session = session();
        assert!(session.say("add a circle", 0.9));
        assert!(session.say("make it red", 0.9));
        assert_eq!(session.preferences().recent_colors.len(), 1);
    }

    #[test]
    fn test_keys_and_save() {
        let mut session = session();
        session.new_document("doc", "Doc", &TemplateLibrary::get("blank").unwrap());
        pollster::block_on(async {
            session.press(&"r".parse().unwrap()).await.unwrap();
            assert!(session.press(&"ctrl+q".parse().unwrap()).await.is_err());
            session.press(&"ctrl+s".parse().unwrap()).await.unwrap();
            assert!(!session.is_dirty());
            assert_eq!(session.list().await.unwrap(), vec!["doc".to_string()]);
        });
    }

    #[test]
    fn test_recolouring_a_selection_undoes_in_one_step() {
        let mut session = session();
        session.say("add a rectangle", 0.9);
        session.say("add a circle", 0.9);
        session.say("select all", 0.9);
        let fills = |session: &Session| -> Vec<_> {
            session.state().iter().map(|s| s.style.fill).collect()
        };
        let before = fills(&session);

        assert!(session.say("make it red", 0.9));
        let red = fills(&session);
        assert_ne!(red, before);
        assert_eq!(red[0], red[1]);
        assert!(session.apply(CommandEffect::Undo));
        assert_eq!(fills(&session), before);

        // One more undo removes the circle, not half of the recolour.
        assert!(session.apply(CommandEffect::Undo));
        assert_eq!(session.state().len(), 1);
    }

    #[test]
    fn test_measurements_pair_neighbours() {
        let mut session = session();
        session.say("add a rectangle", 0.9);
        session.say("add a circle", 0.9);
        session.say("add a line", 0.9);
        assert_eq!(session.measurements(Unit::Px).shapes.len(), 2);
    }
}
