//! Local filesystem blob storage.

use super::{BlobStorage, StorageArea};
use crate::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores files under `<root>/library` and `<root>/attachments`.
///
/// Files are written to a `.partial` sibling, size-verified, then renamed
/// into place, so a stored path never names a half-written file. Because
/// names are content digests, an existing target of the same size is
/// reused instead of copied again.
#[derive(Debug, Clone)]
pub struct LocalBlobStorage {
    root: PathBuf,
}

impl LocalBlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn copy_failed(source: &Path, target: &Path) -> impl Fn(std::io::Error) -> StorageError {
        let source = source.to_path_buf();
        let target = target.to_path_buf();
        move |e| StorageError::CopyFailed {
            source_path: source.clone(),
            target: target.clone(),
            source: e,
        }
    }
}

impl BlobStorage for LocalBlobStorage {
    fn copy_into_storage(
        &self,
        source: &Path,
        area: StorageArea,
        preferred_name: &str,
    ) -> Result<PathBuf, StorageError> {
        if !source.is_file() {
            return Err(StorageError::MissingSource {
                path: source.to_path_buf(),
            });
        }

        let relative = Path::new(area.dir_name()).join(preferred_name);
        let target = self.root.join(&relative);
        let failed = Self::copy_failed(source, &target);

        let expected = fs::metadata(source).map_err(&failed)?.len();

        if let Ok(existing) = fs::metadata(&target) {
            if existing.len() == expected {
                tracing::debug!(target = %target.display(), "Stored file already present");
                return Ok(relative);
            }
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(&failed)?;
        }

        let partial = target.with_extension(match target.extension() {
            Some(ext) => format!("{}.partial", ext.to_string_lossy()),
            None => "partial".to_string(),
        });

        fs::copy(source, &partial).map_err(&failed)?;

        let actual = fs::metadata(&partial).map_err(&failed)?.len();
        if actual != expected {
            let _ = fs::remove_file(&partial);
            return Err(StorageError::VerificationFailed {
                target,
                expected,
                actual,
            });
        }

        fs::rename(&partial, &target).map_err(&failed)?;
        tracing::debug!(
            source = %source.display(),
            target = %target.display(),
            "Copied file into storage"
        );
        Ok(relative)
    }

    fn absolute_path(&self, relative: &Path) -> PathBuf {
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }
}
