use clipjar_core::{ClipKind, SortOrder, ViewState};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub storage: Storage,
    pub view: Option<View>,
    pub downloads: Option<Downloads>,
    pub tui: Option<Tui>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum Storage {
    Sqlite { db_path: Option<PathBuf> },
    /// Nothing is persisted; useful for trying things out.
    Mem,
}

impl Default for Storage {
    fn default() -> Self {
        Storage::Sqlite { db_path: None }
    }
}

/// Initial view inputs for `list` and `browse`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct View {
    pub sort: Option<SortOrder>,
    pub kind: Option<ClipKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Downloads {
    /// Target directory for `download`; `~` is expanded
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Tui {
    pub highlight_fg: Option<String>,
    pub highlight_bg: Option<String>,
    pub border_fg: Option<String>,
    pub help_fg: Option<String>,
    /// How long notifications stay visible (default: 2000)
    pub toast_ms: Option<u64>,
}

impl Settings {
    pub fn initial_view(&self) -> ViewState {
        let view = self.view.clone().unwrap_or_default();
        ViewState {
            search: String::new(),
            category: view.kind,
            sort: view.sort.unwrap_or_default(),
        }
    }

    pub fn tui(&self) -> Tui {
        self.tui.clone().unwrap_or_default()
    }
}

pub fn config_dir() -> PathBuf {
    if let Some(bd) = directories::BaseDirs::new() {
        bd.config_dir().join("clipjar")
    } else {
        PathBuf::from("./.config/clipjar")
    }
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.toml")
}

pub fn default_db_path() -> PathBuf {
    config_dir().join("db").join("clipjar.db")
}

pub fn db_path(settings: &Settings) -> PathBuf {
    match &settings.storage {
        Storage::Sqlite { db_path: Some(p) } => {
            PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).to_string())
        }
        _ => default_db_path(),
    }
}

pub fn downloads_dir(settings: &Settings) -> PathBuf {
    if let Some(dir) = settings.downloads.as_ref().and_then(|d| d.dir.as_ref()) {
        if !dir.trim().is_empty() {
            return PathBuf::from(shellexpand::tilde(dir).to_string());
        }
    }
    directories::UserDirs::new()
        .and_then(|u| u.download_dir().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Reads `settings.toml`; a missing file means defaults, a broken one is
/// reported and ignored.
pub fn load_settings() -> Settings {
    let path = settings_path();
    match std::fs::read_to_string(&path) {
        Ok(s) => match toml::from_str(&s) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "invalid settings, using defaults");
                Settings::default()
            }
        },
        Err(_) => Settings::default(),
    }
}
