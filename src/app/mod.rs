use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;
use unicode_segmentation::UnicodeSegmentation;

use crate::config::AppConfig;
use crate::ui;

pub mod actions;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;

pub use actions::{ActionDispatcher, AppEvent};
pub use session::{EditSession, FocusTarget, SessionState};
pub use state::{Clock, NoteController, SystemClock};
pub use store::NoteStore;
pub use theme::{DocumentRoot, ThemeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Search,
    List,
    Title,
    Body,
}

/// Widget-side state the controller does not own: which pane has the
/// keyboard, the search box contents and the list cursor.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub focus: FocusPane,
    pub search: String,
    pub list_cursor: Option<usize>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            focus: FocusPane::List,
            search: String::new(),
            list_cursor: None,
        }
    }
}

pub struct App {
    pub config: Arc<AppConfig>,
    controller: NoteController,
    view: ViewState,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, controller: NoteController) -> Self {
        let tick_rate = Duration::from_millis(config.ui.tick_rate_ms);
        Self {
            config,
            controller,
            view: ViewState::default(),
            list_state: ListState::default(),
            should_quit: false,
            tick_rate,
        }
    }

    pub fn controller(&self) -> &NoteController {
        &self.controller
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            let cursor = self.cursor();
            terminal
                .draw(|frame| {
                    self.list_state.select(cursor);
                    ui::draw_app(frame, &self.controller, &self.view, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.after_render() {
                continue;
            }

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    /// Runs post-render continuations and honours focus requests. Returns
    /// true when state changed and another frame is needed.
    fn after_render(&mut self) -> bool {
        let ran = self.controller.run_deferred();
        if let Some(target) = self.controller.take_focus_request() {
            self.view.focus = match target {
                FocusTarget::Title => FocusPane::Title,
                FocusTarget::Text => FocusPane::Body,
            };
        }
        if let Some(selected) = self.controller.session().selected() {
            self.view.list_cursor = Some(selected);
        }
        ran > 0
    }

    fn cursor(&self) -> Option<usize> {
        let len = self.controller.store().displayed_len();
        if len == 0 {
            return None;
        }
        self.controller
            .session()
            .selected()
            .or(self.view.list_cursor)
            .map(|idx| idx.min(len - 1))
    }

    fn dispatch(&mut self, event: AppEvent) {
        ActionDispatcher::new(&mut self.controller).dispatch(event);
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => {
                    self.leave_pane();
                    self.should_quit = true;
                    return;
                }
                KeyCode::Char('n') => {
                    self.leave_pane();
                    self.dispatch(AppEvent::AddNote);
                    return;
                }
                KeyCode::Char('s') => {
                    self.dispatch(AppEvent::Save);
                    self.view.focus = FocusPane::List;
                    return;
                }
                KeyCode::Char('t') => {
                    self.dispatch(AppEvent::ToggleTheme);
                    return;
                }
                KeyCode::Char('d') => {
                    self.delete_at_cursor();
                    return;
                }
                _ => {}
            }
        }

        if key.code == KeyCode::Tab {
            self.cycle_focus();
            return;
        }

        match self.view.focus {
            FocusPane::Search => self.handle_search_key(key),
            FocusPane::List => self.handle_list_key(key),
            FocusPane::Title => self.handle_title_key(key),
            FocusPane::Body => self.handle_body_key(key),
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Down => {
                self.view.focus = FocusPane::List;
            }
            KeyCode::Backspace => {
                pop_grapheme(&mut self.view.search);
                self.dispatch(AppEvent::SearchInput(self.view.search.clone()));
                self.view.list_cursor = None;
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                self.view.search.push(ch);
                self.dispatch(AppEvent::SearchInput(self.view.search.clone()));
                self.view.list_cursor = None;
            }
            _ => {}
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('j') | KeyCode::Down => self.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_selection(-1),
            KeyCode::Char('a') => self.dispatch(AppEvent::AddNote),
            KeyCode::Char('d') | KeyCode::Delete => self.delete_at_cursor(),
            KeyCode::Char('t') => self.dispatch(AppEvent::ToggleTheme),
            KeyCode::Char('/') => self.view.focus = FocusPane::Search,
            KeyCode::Enter => {
                if self.controller.session().selected().is_none() {
                    if let Some(index) = self.cursor() {
                        self.dispatch(AppEvent::Select(index));
                    }
                }
                if self.controller.input_enabled() {
                    self.view.focus = FocusPane::Body;
                }
            }
            _ => {}
        }
    }

    fn handle_title_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.leave_pane(),
            KeyCode::Enter => {
                self.dispatch(AppEvent::TitleCommit);
                self.view.focus = FocusPane::Body;
            }
            KeyCode::Backspace => {
                let mut value = self.controller.session().title_field().to_string();
                if pop_grapheme(&mut value) {
                    self.dispatch(AppEvent::TitleInput(value));
                }
            }
            KeyCode::Char(ch) if is_plain(&key) => {
                let mut value = self.controller.session().title_field().to_string();
                value.push(ch);
                self.dispatch(AppEvent::TitleInput(value));
            }
            _ => {}
        }
    }

    fn handle_body_key(&mut self, key: KeyEvent) {
        let mut value = self.controller.session().text_field().to_string();
        let changed = match key.code {
            KeyCode::Esc => {
                self.view.focus = FocusPane::List;
                false
            }
            KeyCode::Enter => {
                value.push('\n');
                true
            }
            KeyCode::Backspace => pop_grapheme(&mut value),
            KeyCode::Char(ch) if is_plain(&key) => {
                value.push(ch);
                true
            }
            _ => false,
        };
        if changed {
            self.dispatch(AppEvent::TextInput(value));
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let len = self.controller.store().displayed_len();
        if len == 0 {
            return;
        }
        let next = match self.cursor() {
            Some(current) => (current as isize + delta).clamp(0, len as isize - 1) as usize,
            None => 0,
        };
        self.view.list_cursor = Some(next);
        self.dispatch(AppEvent::Select(next));
    }

    fn delete_at_cursor(&mut self) {
        let Some(index) = self.cursor() else {
            return;
        };
        self.dispatch(AppEvent::DeleteNote(index));
        self.view.focus = FocusPane::List;
        let len = self.controller.store().displayed_len();
        self.view.list_cursor = if len == 0 {
            None
        } else {
            Some(index.min(len - 1))
        };
    }

    /// Leaving the title field counts as a commit, like a blur.
    fn leave_pane(&mut self) {
        if self.view.focus == FocusPane::Title && self.controller.input_enabled() {
            self.dispatch(AppEvent::TitleCommit);
        }
        self.view.focus = FocusPane::List;
    }

    fn cycle_focus(&mut self) {
        let editable = self.controller.input_enabled();
        let next = match self.view.focus {
            FocusPane::Search => FocusPane::List,
            FocusPane::List if editable => FocusPane::Title,
            FocusPane::List => FocusPane::Search,
            FocusPane::Title => FocusPane::Body,
            FocusPane::Body => FocusPane::Search,
        };
        if self.view.focus == FocusPane::Title {
            self.dispatch(AppEvent::TitleCommit);
        }
        self.view.focus = next;
    }
}

fn is_plain(key: &KeyEvent) -> bool {
    !key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
}

fn pop_grapheme(value: &mut String) -> bool {
    let Some((idx, _)) = value.grapheme_indices(true).next_back() else {
        return false;
    };
    value.truncate(idx);
    true
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("restoring screen state")?;
    Ok(())
}
