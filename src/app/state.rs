use std::collections::VecDeque;

use time::OffsetDateTime;

use crate::app::session::{EditSession, FocusTarget};
use crate::app::store::{decode_notes, NoteStore};
use crate::app::theme::{DocumentRoot, ThemeState};
use crate::config::ThemeMode;
use crate::note::{Note, NoteId};
use crate::storage::{PersistenceAdapter, NOTES_KEY};

pub trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Wall clock in the local offset, UTC when the offset cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }
}

/// Work that must wait until the renderer has drawn the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Highlight the freshly added note, blank the fields, focus the title.
    /// A note hidden by the active query is left unselected.
    SelectNewNote(NoteId),
}

/// Single owner of the note collection, the edit session and the theme.
/// Every UI event lands on one of the `on_*` handlers.
pub struct NoteController {
    store: NoteStore,
    session: EditSession,
    theme: ThemeState,
    adapter: PersistenceAdapter,
    clock: Box<dyn Clock>,
    deferred: VecDeque<Deferred>,
}

impl NoteController {
    /// Restores the persisted collection and applies the persisted theme.
    /// Missing or unreadable data starts an empty session.
    pub fn load(
        adapter: PersistenceAdapter,
        root: DocumentRoot,
        clock: impl Clock + 'static,
    ) -> Self {
        let notes = adapter
            .get(NOTES_KEY)
            .map(|raw| decode_notes(&raw))
            .unwrap_or_default();
        tracing::info!(count = notes.len(), backend = %adapter.describe(), "loaded notes");

        let mut theme = ThemeState::new(root);
        if let Some(mode) = theme.apply_on_load(&adapter) {
            tracing::debug!(theme = %mode, "applied persisted theme");
        }

        Self {
            store: NoteStore::from_notes(notes),
            session: EditSession::new(),
            theme,
            adapter,
            clock: Box::new(clock),
            deferred: VecDeque::new(),
        }
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn theme_mode(&self) -> Option<ThemeMode> {
        self.theme.mode()
    }

    pub fn document_root(&self) -> &DocumentRoot {
        self.theme.root()
    }

    pub fn input_enabled(&self) -> bool {
        self.session.input_enabled()
    }

    pub fn save_enabled(&self) -> bool {
        self.session.save_enabled()
    }

    pub fn take_focus_request(&mut self) -> Option<FocusTarget> {
        self.session.take_focus_request()
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.session
            .selected()
            .and_then(|index| self.store.displayed(index))
    }

    pub fn on_add(&mut self) -> NoteId {
        self.session.enable_input();
        let id = self.store.add_note(self.clock.now(), &self.adapter);
        self.deferred.push_back(Deferred::SelectNewNote(id));
        id
    }

    /// Deletes the note shown at `displayed_index`. The session always ends
    /// idle; the fields are blanked only when the deleted note was open.
    pub fn on_delete(&mut self, displayed_index: usize) {
        let Some(target) = self.store.displayed(displayed_index).map(Note::id) else {
            tracing::debug!(displayed_index, "delete ignored, no note at index");
            return;
        };
        let selected_id = self.selected_note().map(Note::id);
        if selected_id == Some(target) {
            self.session.clear_fields();
        }
        self.store.delete_note(target, &self.adapter);
        self.session.release();
    }

    pub fn on_selection_change(&mut self, displayed_index: usize) {
        let Some(note) = self.store.displayed(displayed_index) else {
            return;
        };
        let (title, text) = (note.title.clone(), note.text.clone());
        self.session.open(displayed_index, &title, &text);
    }

    /// Title keystrokes are written through immediately.
    pub fn on_title_input(&mut self, value: &str) {
        if !self.session.input_enabled() {
            return;
        }
        self.session.set_title_field(value);
        if let Some(index) = self.session.selected() {
            self.store.update_title(index, value, &self.adapter);
        }
    }

    pub fn on_title_commit(&mut self) {
        self.save_no_clear();
    }

    pub fn on_text_input(&mut self, value: &str) {
        if !self.session.input_enabled() {
            return;
        }
        self.session.set_text_field(value);
    }

    /// Saves the open note and closes the session. Without a selection this
    /// does nothing.
    pub fn on_save(&mut self) {
        if self.session.selected().is_none() {
            return;
        }
        self.save_no_clear();
        self.session.close();
    }

    pub fn on_search_input(&mut self, query: &str) {
        self.store.search(query);
        self.session.close();
    }

    pub fn on_theme_click(&mut self) -> Option<ThemeMode> {
        self.theme.toggle(&self.adapter)
    }

    /// Runs continuations queued before the last render. Returns how many ran.
    pub fn run_deferred(&mut self) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::SelectNewNote(id) => {
                    match self.store.displayed_position(id) {
                        Some(position) => self.session.point_at(position),
                        None => {
                            tracing::debug!("new note hidden by the active query");
                            self.session.release();
                            self.session.enable_input();
                        }
                    }
                    self.session.clear_fields();
                    self.session.request_focus(FocusTarget::Title);
                }
            }
            ran += 1;
        }
        ran
    }

    fn save_no_clear(&mut self) {
        let Some(index) = self.session.selected() else {
            return;
        };
        self.store.update_text(
            index,
            self.session.title_field(),
            self.session.text_field(),
            &self.adapter,
        );
        self.session.mark_saved();
    }
}
