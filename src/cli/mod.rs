use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, EnvFilter};

use crate::app::{App, DocumentRoot, NoteController, SystemClock};
use crate::config::{AppConfig, ConfigLoader};
use crate::storage;

pub mod commands;

use self::commands::{ListArgs, NewArgs, ThemeArgs};

#[derive(Parser, Debug)]
#[command(
    name = "quicknotes",
    version,
    about = "Terminal notes with instant search and light/dark themes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Override the config file location (takes precedence over QUICKNOTES_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override the data directory (takes precedence over QUICKNOTES_DATA)
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Minimum log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Keep notes in memory only; nothing is written to disk
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive TUI (default)
    Tui,
    /// Add a note from the command line
    New(NewArgs),
    /// Print notes, optionally filtered by a title search
    List(ListArgs),
    /// Show or toggle the display theme
    Theme(ThemeArgs),
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.config {
        env::set_var("QUICKNOTES_CONFIG", path);
    }
    if let Some(path) = &cli.data_dir {
        env::set_var("QUICKNOTES_DATA", path);
    }

    let loader = ConfigLoader::discover()?;
    loader.paths().ensure_directories()?;
    let paths = loader.paths().clone();
    let mut config = loader.load_or_init()?;
    if cli.ephemeral {
        config.storage.ephemeral = true;
    }

    let command = cli.command.unwrap_or(Commands::Tui);
    let log_target = match command {
        Commands::Tui => LogTarget::File(paths.log_dir.join(&config.log.file_name)),
        _ => LogTarget::Stderr,
    };
    init_tracing(&cli.log_level, log_target)
        .with_context(|| format!("initialising logging at level {}", cli.log_level))?;

    let config = Arc::new(config);
    let controller = open_controller(&config);
    match command {
        Commands::Tui => {
            let mut app = App::new(config.clone(), controller);
            commands::run_tui(&mut app)
        }
        Commands::New(args) => commands::new_note(controller, args),
        Commands::List(args) => commands::list_notes(controller, args),
        Commands::Theme(args) => commands::theme(controller, args),
    }
}

/// Opens storage and restores the previous session into a controller.
pub fn open_controller(config: &AppConfig) -> NoteController {
    let adapter = storage::open_adapter(&config.storage);
    NoteController::load(
        adapter,
        DocumentRoot::new(config.ui.initial_theme),
        SystemClock,
    )
}

enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn init_tracing(level: &str, target: LogTarget) -> Result<()> {
    static INIT: OnceCell<()> = OnceCell::new();
    INIT.get_or_try_init(|| {
        let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
        match target {
            LogTarget::Stderr => fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init(),
            LogTarget::File(path) => {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
                    .with_context(|| format!("opening log file {}", path.display()))?;
                fmt()
                    .with_env_filter(env_filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .init();
            }
        }
        Ok::<(), anyhow::Error>(())
    })
    .map(|_| ())
}
