use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::types::Category;

/// Item count at which the library is shown as full.
pub const DEFAULT_PROGRESS_CAPACITY: usize = 50;

const LIBRARY_DIR_NAME: &str = "StudyMaterials";
const APP_DIR_NAME: &str = "study-organizer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub library_path: PathBuf,
    #[serde(default = "default_progress_capacity")]
    pub progress_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_library_path())
    }
}

impl Config {
    pub fn new(library_path: impl Into<PathBuf>) -> Self {
        Self {
            library_path: library_path.into(),
            progress_capacity: DEFAULT_PROGRESS_CAPACITY,
        }
    }

    pub fn category_path(&self, category: Category) -> PathBuf {
        self.library_path.join(category.label())
    }

    /// `<config dir>/study-organizer/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(Into::into)
    }

    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(Into::into)
    }
}

fn default_library_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(LIBRARY_DIR_NAME)
}

fn default_progress_capacity() -> usize {
    DEFAULT_PROGRESS_CAPACITY
}
