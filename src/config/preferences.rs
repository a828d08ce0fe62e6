// Preferences - user-tunable core settings, stored as RON

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum PreferencesError {
    #[error("No configuration directory available on this platform")]
    NoConfigDir,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::Error),
}

/// Core preferences. Unknown or missing fields fall back to defaults, so
/// old preference files keep loading across releases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Master switch for the undo history; disabling clears it
    pub enable_undo: bool,
    /// Byte budget for the undo history, in megabytes
    pub undo_memory_mb: usize,
    /// Optional hard ceiling on the number of undo items
    pub max_undo_items: Option<usize>,
    /// Number of executed actions the provenance feed retains
    pub max_history_entries: usize,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enable_undo: true,
            undo_memory_mb: 512,
            max_undo_items: Some(100),
            max_history_entries: 500,
        }
    }
}

impl Preferences {
    /// Platform preference file location, when the platform has one.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|directory| directory.join("voxseg").join("preferences.ron"))
    }

    /// Load from the platform location; any failure falls back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from a specific path. A missing file is normal (first run); a
    /// malformed file logs a warning and falls back to defaults rather than
    /// aborting startup.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match ron::from_str(&text) {
            Ok(preferences) => preferences,
            Err(error) => {
                log::warn!(
                    "malformed preferences file {}: {error}; using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), PreferencesError> {
        let path = Self::config_path().ok_or(PreferencesError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), PreferencesError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, text)?;
        Ok(())
    }
}
