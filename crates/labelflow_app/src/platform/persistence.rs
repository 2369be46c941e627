use std::fs;
use std::path::{Path, PathBuf};

use flow_logging::{flow_error, flow_info, flow_warn};
use labelflow_core::Theme;
use labelflow_engine::{AtomicFileWriter, Collision, PersistError};
use serde::{Deserialize, Serialize};

/// On-disk shape: a single `darkMode` entry holding `"enabled"` or `"disabled"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedPreferences {
    #[serde(rename = "darkMode")]
    dark_mode: String,
}

/// Durable storage for the light/dark preference.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored theme; anything missing or unreadable means light.
    pub fn load(&self) -> Theme {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Theme::default();
            }
            Err(err) => {
                flow_warn!("Failed to read preferences from {:?}: {}", self.path, err);
                return Theme::default();
            }
        };

        match ron::from_str::<PersistedPreferences>(&content) {
            Ok(prefs) => {
                let theme = Theme::from_storage_value(&prefs.dark_mode);
                flow_info!("Loaded theme {:?} from {:?}", theme, self.path);
                theme
            }
            Err(err) => {
                flow_warn!("Failed to parse preferences from {:?}: {}", self.path, err);
                Theme::default()
            }
        }
    }

    pub fn save(&self, theme: Theme) -> Result<PathBuf, PersistError> {
        let prefs = PersistedPreferences {
            dark_mode: theme.storage_value().to_string(),
        };
        let content = ron::ser::to_string(&prefs)
            .map_err(|err| PersistError::Io(std::io::Error::other(err.to_string())))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let filename = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("preferences.ron");
        AtomicFileWriter::new(dir).write(filename, content, Collision::Replace)
    }

    /// Saves and logs instead of failing; the in-memory theme stays applied either way.
    pub fn save_logged(&self, theme: Theme) {
        if let Err(err) = self.save(theme) {
            flow_error!("Failed to write preferences to {:?}: {}", self.path, err);
        }
    }
}
