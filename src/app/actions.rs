use crate::app::state::NoteController;

/// Inputs the widgets feed into the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    AddNote,
    DeleteNote(usize),
    Select(usize),
    SearchInput(String),
    TitleInput(String),
    TitleCommit,
    TextInput(String),
    Save,
    ToggleTheme,
}

pub struct ActionDispatcher<'a> {
    controller: &'a mut NoteController,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(controller: &'a mut NoteController) -> Self {
        Self { controller }
    }

    pub fn dispatch(&mut self, event: AppEvent) {
        tracing::trace!(?event, "dispatching ui event");
        match event {
            AppEvent::AddNote => {
                self.controller.on_add();
            }
            AppEvent::DeleteNote(index) => self.controller.on_delete(index),
            AppEvent::Select(index) => self.controller.on_selection_change(index),
            AppEvent::SearchInput(query) => self.controller.on_search_input(&query),
            AppEvent::TitleInput(value) => self.controller.on_title_input(&value),
            AppEvent::TitleCommit => self.controller.on_title_commit(),
            AppEvent::TextInput(value) => self.controller.on_text_input(&value),
            AppEvent::Save => self.controller.on_save(),
            AppEvent::ToggleTheme => {
                self.controller.on_theme_click();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::SystemClock;
    use crate::app::theme::DocumentRoot;
    use crate::config::ThemeMode;
    use crate::storage::{MemoryStore, PersistenceAdapter};

    #[test]
    fn event_stream_drives_controller() {
        let memory = MemoryStore::new();
        let mut controller = NoteController::load(
            PersistenceAdapter::new(memory.clone()),
            DocumentRoot::new(ThemeMode::Light),
            SystemClock,
        );

        let mut dispatcher = ActionDispatcher::new(&mut controller);
        dispatcher.dispatch(AppEvent::AddNote);
        dispatcher.dispatch(AppEvent::Select(0));
        dispatcher.dispatch(AppEvent::TitleInput("Plan".into()));
        dispatcher.dispatch(AppEvent::TextInput("step one".into()));
        dispatcher.dispatch(AppEvent::Save);
        dispatcher.dispatch(AppEvent::ToggleTheme);

        assert_eq!(controller.store().notes()[0].title, "Plan");
        assert_eq!(controller.store().notes()[0].text, "step one");
        assert_eq!(controller.theme_mode(), Some(ThemeMode::Dark));
        assert!(!controller.save_enabled());
    }
}
