pub mod app;
pub mod cli;
pub mod config;
pub mod note;
pub mod search;
pub mod storage;
pub mod ui;

pub use app::NoteController;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use note::{Note, NoteId};
