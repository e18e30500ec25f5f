//! Blob storage trait definition.

use crate::error::StorageError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where inside the library a file is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageArea {
    /// Main files of entries
    Library,
    /// Files attached to existing entries
    Attachments,
}

impl StorageArea {
    /// Directory name under the storage root
    pub fn dir_name(&self) -> &'static str {
        match self {
            StorageArea::Library => "library",
            StorageArea::Attachments => "attachments",
        }
    }
}

/// Content-addressed file storage.
pub trait BlobStorage: Send + Sync {
    /// Copy `source` into `area` under `preferred_name`.
    ///
    /// Returns the stored path relative to the storage root. The file must
    /// be completely written before this returns `Ok`.
    fn copy_into_storage(
        &self,
        source: &Path,
        area: StorageArea,
        preferred_name: &str,
    ) -> Result<PathBuf, StorageError>;

    /// Absolute location of a stored relative path
    fn absolute_path(&self, relative: &Path) -> PathBuf;
}
