use std::fmt::Write as _;
use std::io::{self, Read};

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use crate::app::{App, NoteController};
use crate::note::{Note, DEFAULT_TITLE};

#[derive(Args, Debug, Clone)]
pub struct NewArgs {
    /// Title for the note (defaults to "New Note")
    #[arg()]
    pub title: Option<String>,
    /// Provide the note body inline. If omitted, reads from stdin when piped.
    #[arg(long)]
    pub body: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Case-insensitive title search
    #[arg()]
    pub query: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeAction {
    /// Print the active theme
    Show,
    /// Switch between light and dark and remember the choice
    Toggle,
}

#[derive(Args, Debug, Clone)]
pub struct ThemeArgs {
    #[command(subcommand)]
    pub action: Option<ThemeAction>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn new_note(mut controller: NoteController, args: NewArgs) -> Result<()> {
    let title = args
        .title
        .map(|t| t.trim().to_owned())
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned());
    let body = match args.body {
        Some(body) => body,
        None => read_stdin()?.unwrap_or_default(),
    };
    let output = create_note(&mut controller, &title, &body)?;
    print!("{output}");
    Ok(())
}

pub fn list_notes(mut controller: NoteController, args: ListArgs) -> Result<()> {
    let query = args.query.join(" ");
    print!("{}", render_list(&mut controller, query.trim()));
    Ok(())
}

pub fn theme(mut controller: NoteController, args: ThemeArgs) -> Result<()> {
    let action = args.action.unwrap_or(ThemeAction::Show);
    println!("{}", theme_report(&mut controller, action));
    Ok(())
}

/// Replays the same event sequence the TUI produces for add, type, save.
fn create_note(controller: &mut NoteController, title: &str, body: &str) -> Result<String> {
    if title.is_empty() {
        bail!("note title cannot be empty");
    }
    controller.on_add();
    controller.run_deferred();
    if controller.session().selected().is_none() {
        bail!("new note is not visible; clear the search and retry");
    }
    controller.on_title_input(title);
    if !body.is_empty() {
        controller.on_text_input(body);
    }
    controller.on_save();

    let note = &controller.store().notes()[0];
    Ok(format!("Created \"{}\" at {}\n", note.title, note.display_date()))
}

fn render_list(controller: &mut NoteController, query: &str) -> String {
    if !query.is_empty() {
        controller.on_search_input(query);
    }
    let notes: Vec<&Note> = controller.store().filtered_notes().collect();
    if notes.is_empty() {
        return "No notes found.\n".to_string();
    }
    let mut out = String::new();
    for (idx, note) in notes.iter().enumerate() {
        let _ = writeln!(
            &mut out,
            "{}. {} ({})",
            idx + 1,
            note.title,
            note.display_date()
        );
        if let Some(first_line) = note.text.lines().find(|line| !line.trim().is_empty()) {
            let _ = writeln!(&mut out, "   {}", first_line.trim());
        }
    }
    out
}

fn theme_report(controller: &mut NoteController, action: ThemeAction) -> String {
    let mode = match action {
        ThemeAction::Show => controller.theme_mode(),
        ThemeAction::Toggle => controller.on_theme_click(),
    };
    match mode {
        Some(mode) => mode.marker().to_string(),
        None => "no theme applied".to_string(),
    }
}

fn read_stdin() -> Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Clock, DocumentRoot};
    use crate::config::{AppConfig, ConfigPaths, ThemeMode};
    use crate::storage::{self, MemoryStore, PersistenceAdapter};
    use tempfile::TempDir;
    use time::macros::datetime;
    use time::OffsetDateTime;

    type TestResult<T = ()> = Result<T>;

    struct FixedClock;

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            datetime!(2024-01-01 10:00:00 UTC)
        }
    }

    fn controller_on(memory: &MemoryStore) -> NoteController {
        NoteController::load(
            PersistenceAdapter::new(memory.clone()),
            DocumentRoot::new(ThemeMode::Light),
            FixedClock,
        )
    }

    #[test]
    fn cli_new_persists_title_and_body() -> TestResult {
        let memory = MemoryStore::new();
        let output = create_note(&mut controller_on(&memory), "Groceries", "eggs\nmilk")?;
        assert_eq!(output, "Created \"Groceries\" at 1/1/2024 10:00:00 AM\n");

        let reloaded = controller_on(&memory);
        let note = &reloaded.store().notes()[0];
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.text, "eggs\nmilk");
        Ok(())
    }

    #[test]
    fn cli_new_rejects_blank_title() {
        let memory = MemoryStore::new();
        assert!(create_note(&mut controller_on(&memory), "", "body").is_err());
        assert_eq!(memory.writes(), 0);
    }

    #[test]
    fn cli_list_prints_newest_first_with_preview() -> TestResult {
        let memory = MemoryStore::new();
        create_note(&mut controller_on(&memory), "Groceries", "")?;
        create_note(&mut controller_on(&memory), "Work plan", "\ndraft agenda\nmore")?;

        let output = render_list(&mut controller_on(&memory), "");
        insta::assert_snapshot!(output.trim_end(), @r###"
        1. Work plan (1/1/2024 10:00:00 AM)
           draft agenda
        2. Groceries (1/1/2024 10:00:00 AM)
        "###);
        Ok(())
    }

    #[test]
    fn cli_list_filters_by_title() -> TestResult {
        let memory = MemoryStore::new();
        create_note(&mut controller_on(&memory), "Groceries", "")?;
        create_note(&mut controller_on(&memory), "Work plan", "")?;

        let output = render_list(&mut controller_on(&memory), "GROC");
        assert!(output.contains("Groceries"));
        assert!(!output.contains("Work plan"));
        assert_eq!(
            render_list(&mut controller_on(&memory), "zzz"),
            "No notes found.\n"
        );
        Ok(())
    }

    #[test]
    fn cli_theme_toggle_survives_restart() {
        let memory = MemoryStore::new();
        assert_eq!(
            theme_report(&mut controller_on(&memory), ThemeAction::Show),
            "light-theme"
        );
        assert_eq!(
            theme_report(&mut controller_on(&memory), ThemeAction::Toggle),
            "dark-theme"
        );
        assert_eq!(
            theme_report(&mut controller_on(&memory), ThemeAction::Show),
            "dark-theme"
        );
    }

    #[test]
    fn cli_round_trip_through_sqlite() -> TestResult {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        let mut config = AppConfig::default();
        config.storage.database_path = paths.database_path.clone();

        let open = || {
            NoteController::load(
                storage::open_adapter(&config.storage),
                DocumentRoot::new(config.ui.initial_theme),
                FixedClock,
            )
        };
        create_note(&mut open(), "Durable", "on disk")?;
        theme_report(&mut open(), ThemeAction::Toggle);

        let reopened = open();
        assert!(paths.database_path.exists());
        assert_eq!(reopened.store().notes()[0].text, "on disk");
        assert_eq!(reopened.theme_mode(), Some(ThemeMode::Dark));
        Ok(())
    }
}
