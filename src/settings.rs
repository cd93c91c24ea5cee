use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DOT_CONFIG: &str = ".config";
const APP_DIR: &str = "dstatus";
const SETTINGS_FILE: &str = "editor-settings.json";
const CONFIG_FILE: &str = "configuration.toml";
const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to get home directory")]
    NoHomeDir,

    #[error("Failed to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write settings file: {0}")]
    Write(std::io::Error),
}

impl From<SettingsError> for String {
    fn from(e: SettingsError) -> Self {
        e.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorSettings {
    /// Binary that understands `on` / `off`.
    #[serde(default = "default_daemon_binary")]
    pub daemon_binary: String,
    #[serde(default = "default_status_poll_secs")]
    pub status_poll_secs: u64,
    /// Overrides `~/.config/dstatus/configuration.toml`.
    #[serde(default)]
    pub config_path: Option<PathBuf>,
    #[serde(default)]
    pub templates_path: Option<PathBuf>,
}

fn default_daemon_binary() -> String {
    "dstatus".to_string()
}

fn default_status_poll_secs() -> u64 {
    5
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            daemon_binary: default_daemon_binary(),
            status_poll_secs: default_status_poll_secs(),
            config_path: None,
            templates_path: None,
        }
    }
}

impl EditorSettings {
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_secs(self.status_poll_secs.max(1))
    }

    pub fn config_path(&self, app_dir: &Path) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| app_dir.join(CONFIG_FILE))
    }

    pub fn templates_path(&self, app_dir: &Path) -> PathBuf {
        self.templates_path
            .clone()
            .unwrap_or_else(|| app_dir.join(TEMPLATES_FILE))
    }
}

/// `~/.config/dstatus`, created if missing. The daemon reads from here on
/// every platform.
pub fn app_dir() -> Result<PathBuf, SettingsError> {
    let dir = app_dir_in(&dirs::home_dir().ok_or(SettingsError::NoHomeDir)?);

    fs::create_dir_all(&dir).map_err(|source| SettingsError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    Ok(dir)
}

fn app_dir_in(home: &Path) -> PathBuf {
    home.join(DOT_CONFIG).join(APP_DIR)
}

fn get_settings_path(app_dir: &Path) -> PathBuf {
    app_dir.join(SETTINGS_FILE)
}

/// Read settings, falling back to defaults when the file is missing, empty
/// or unreadable.
pub fn load_settings(app_dir: &Path) -> EditorSettings {
    let path = get_settings_path(app_dir);
    tracing::debug!("Loading editor settings from {}", path.display());

    let contents = match fs::read_to_string(&path) {
        Ok(c) if !c.trim().is_empty() => c,
        Ok(_) => {
            tracing::warn!("{} is empty, using default editor settings", path.display());
            return EditorSettings::default();
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return EditorSettings::default(),
        Err(e) => {
            tracing::warn!(
                "Cannot read {}, using default editor settings: {}",
                path.display(),
                e
            );
            return EditorSettings::default();
        }
    };

    serde_json::from_str(&contents).unwrap_or_else(|e| {
        tracing::warn!("Ignoring malformed {}: {}", path.display(), e);
        EditorSettings::default()
    })
}

pub fn save_settings(app_dir: &Path, settings: &EditorSettings) -> Result<(), SettingsError> {
    let path = get_settings_path(app_dir);
    tracing::debug!("Saving editor settings to {}", path.display());

    let contents = serde_json::to_string_pretty(settings)?;

    fs::write(&path, contents).map_err(SettingsError::Write)
}
