//! Pipeline configuration, loadable from a JSON file.

use crate::core::scanner::DEFAULT_EXTENSIONS;
use crate::error::IntakeError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Upper bound on concurrent staging tasks
pub const MAX_STAGING_WINDOW: usize = 4;

/// Settings for one intake pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Root of the library (database, `library/`, `attachments/`)
    pub library_root: PathBuf,
    /// Override for the staging window; `None` uses [`default_parallelism`]
    pub max_parallelism: Option<usize>,
    /// Recorded on attachments
    pub added_by: String,
    /// Extensions accepted when expanding folders
    pub allowed_extensions: Vec<String>,
    pub include_hidden: bool,
    /// Record commits in the change log database
    pub changelog: bool,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            library_root: default_library_root(),
            max_parallelism: None,
            added_by: default_added_by(),
            allowed_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            include_hidden: false,
            changelog: true,
        }
    }
}

impl IntakeConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self, IntakeError> {
        let raw = std::fs::read_to_string(path).map_err(|source| IntakeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| IntakeError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Staging window: the override clamped to at least 1, or the default
    pub fn staging_window(&self) -> usize {
        self.max_parallelism
            .map(|n| n.max(1))
            .unwrap_or_else(default_parallelism)
    }

    /// Location of the entry database
    pub fn database_path(&self) -> PathBuf {
        self.library_root.join("library.db")
    }

    /// Location of the change log database
    pub fn changelog_path(&self) -> PathBuf {
        self.library_root.join("changelog.db")
    }
}

/// `max(1, min(available cores, 4))`
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_STAGING_WINDOW)
}

/// `<data dir>/document-intake`, or a relative folder when no data dir exists
pub fn default_library_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("document-intake")
}

fn default_added_by() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "doc-intake".to_string())
}
