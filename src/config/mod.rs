use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

pub mod themes;

pub use themes::{Palette, ThemeMode};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "QuickNotes";
const APP_NAME: &str = "quicknotes";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths);
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths);
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("QUICKNOTES_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("QUICKNOTES_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_dir = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let database_path = data_dir.join("notes.db");
        let log_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_dir.join("state"))
            .join("logs");

        Ok(Self {
            config_dir,
            config_file,
            data_dir,
            database_path,
            log_dir,
        })
    }

    /// Lays every directory out under one root. Used by tests and by
    /// `--data-dir` style overrides that want a self-contained tree.
    pub fn rooted_at(root: &Path) -> Self {
        let config_dir = root.join("config");
        let data_dir = root.join("data");
        Self {
            config_file: config_dir.join("config.toml"),
            config_dir,
            database_path: data_dir.join("notes.db"),
            data_dir,
            log_dir: root.join("logs"),
        }
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.config_dir, &self.data_dir, &self.log_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ui: UiOptions,
    pub storage: StorageOptions,
    pub log: LogOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) {
        self.storage.resolve(paths);
        if self.ui.tick_rate_ms == 0 {
            tracing::warn!("ui.tick_rate_ms must be positive, falling back to default");
            self.ui.tick_rate_ms = UiOptions::default().tick_rate_ms;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiOptions {
    /// Marker the document root carries before any persisted theme applies.
    pub initial_theme: ThemeMode,
    pub tick_rate_ms: u64,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            initial_theme: ThemeMode::Light,
            tick_rate_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub database_path: PathBuf,
    /// Keep notes in memory only for this process.
    pub ephemeral: bool,
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) {
        if self.database_path.as_os_str().is_empty() {
            self.database_path = paths.database_path.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogOptions {
    pub file_name: String,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            file_name: "quicknotes.log".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_or_init_writes_defaults_once() -> Result<()> {
        let temp = TempDir::new()?;
        let loader = ConfigLoader::from_paths(ConfigPaths::rooted_at(temp.path()));

        let cfg = loader.load_or_init()?;
        assert!(loader.paths().config_file.exists());
        assert_eq!(cfg.ui.initial_theme, ThemeMode::Light);
        assert_eq!(cfg.storage.database_path, loader.paths().database_path);

        let reloaded = loader.load_or_init()?;
        assert_eq!(reloaded.ui.tick_rate_ms, 250);
        Ok(())
    }

    #[test]
    fn partial_config_keeps_defaults() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = ConfigPaths::rooted_at(temp.path());
        paths.ensure_directories()?;
        fs::write(
            &paths.config_file,
            "[ui]\ninitial_theme = \"dark\"\ntick_rate_ms = 0\n",
        )?;

        let cfg = ConfigLoader::from_paths(paths).load()?;
        assert_eq!(cfg.ui.initial_theme, ThemeMode::Dark);
        assert_eq!(cfg.ui.tick_rate_ms, 250);
        assert!(!cfg.storage.ephemeral);
        assert_eq!(cfg.log.file_name, "quicknotes.log");
        Ok(())
    }
}
