use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    struct Controls: u8 {
        const INPUT = 0b01;
        const SAVE = 0b10;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Editing,
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Title,
    Text,
}

/// Which displayed note is open, what the edit fields hold and which
/// controls are enabled. The control flags only change through the
/// transitions below.
#[derive(Debug, Default)]
pub struct EditSession {
    selected: Option<usize>,
    title_field: String,
    text_field: String,
    controls: Controls,
    focus: Option<FocusTarget>,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn title_field(&self) -> &str {
        &self.title_field
    }

    pub fn text_field(&self) -> &str {
        &self.text_field
    }

    pub fn input_enabled(&self) -> bool {
        self.controls.contains(Controls::INPUT)
    }

    pub fn save_enabled(&self) -> bool {
        self.controls.contains(Controls::SAVE)
    }

    pub fn state(&self) -> SessionState {
        match self.selected {
            None => SessionState::Idle,
            Some(_) if self.save_enabled() => SessionState::Dirty,
            Some(_) => SessionState::Editing,
        }
    }

    /// Pending focus request, if the renderer has not consumed it yet.
    pub fn focus(&self) -> Option<FocusTarget> {
        self.focus
    }

    pub fn take_focus_request(&mut self) -> Option<FocusTarget> {
        self.focus.take()
    }

    /// Opens a note freshly loaded from the list: clean, editable, with the
    /// text area focused.
    pub(crate) fn open(&mut self, index: usize, title: &str, text: &str) {
        self.selected = Some(index);
        self.title_field = title.to_string();
        self.text_field = text.to_string();
        self.controls.insert(Controls::INPUT);
        self.controls.remove(Controls::SAVE);
        self.focus = Some(FocusTarget::Text);
    }

    /// Moves the list highlight without loading the note into the fields.
    pub(crate) fn point_at(&mut self, index: usize) {
        self.selected = Some(index);
    }

    pub(crate) fn set_title_field(&mut self, value: &str) {
        self.title_field = value.to_string();
    }

    /// Records a body keystroke. Save only lights up while a note is open.
    pub(crate) fn set_text_field(&mut self, value: &str) {
        self.text_field = value.to_string();
        self.controls.set(Controls::SAVE, self.selected.is_some());
    }

    pub(crate) fn mark_saved(&mut self) {
        self.controls.remove(Controls::SAVE);
    }

    pub(crate) fn clear_fields(&mut self) {
        self.title_field.clear();
        self.text_field.clear();
        self.controls.remove(Controls::SAVE);
    }

    pub(crate) fn enable_input(&mut self) {
        self.controls.insert(Controls::INPUT);
    }

    pub(crate) fn request_focus(&mut self, target: FocusTarget) {
        self.focus = Some(target);
    }

    /// Drops the selection and disables every edit control. Field contents
    /// are left alone.
    pub(crate) fn release(&mut self) {
        self.selected = None;
        self.controls = Controls::empty();
    }

    /// Back to idle with empty fields.
    pub(crate) fn close(&mut self) {
        self.clear_fields();
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn starts_idle_with_everything_disabled() {
        let session = EditSession::new();
        assert_matches!(session.state(), SessionState::Idle);
        assert!(!session.input_enabled());
        assert!(!session.save_enabled());
        assert_eq!(session.focus(), None);
    }

    #[test]
    fn open_then_type_goes_dirty() {
        let mut session = EditSession::new();
        session.open(2, "Title", "body");
        assert_matches!(session.state(), SessionState::Editing);
        assert_eq!(session.focus(), Some(FocusTarget::Text));

        session.set_text_field("body!");
        assert_matches!(session.state(), SessionState::Dirty);
        assert!(session.input_enabled());

        session.mark_saved();
        assert_matches!(session.state(), SessionState::Editing);
    }

    #[test]
    fn typing_without_selection_never_enables_save() {
        let mut session = EditSession::new();
        session.enable_input();
        session.set_text_field("orphan");
        assert!(!session.save_enabled());
        assert_matches!(session.state(), SessionState::Idle);
    }

    #[test]
    fn reopening_a_dirty_session_comes_back_clean() {
        let mut session = EditSession::new();
        session.open(0, "a", "");
        session.set_text_field("edit");
        session.open(1, "b", "other");
        assert_matches!(session.state(), SessionState::Editing);
        assert_eq!(session.text_field(), "other");
    }

    #[test]
    fn close_clears_fields_and_controls() {
        let mut session = EditSession::new();
        session.open(0, "a", "b");
        session.set_text_field("c");
        session.close();
        assert_matches!(session.state(), SessionState::Idle);
        assert!(!session.input_enabled());
        assert!(!session.save_enabled());
        assert_eq!(session.title_field(), "");
        assert_eq!(session.text_field(), "");
    }

    #[test]
    fn focus_request_is_consumed_once() {
        let mut session = EditSession::new();
        session.request_focus(FocusTarget::Title);
        assert_eq!(session.take_focus_request(), Some(FocusTarget::Title));
        assert_eq!(session.take_focus_request(), None);
    }
}
