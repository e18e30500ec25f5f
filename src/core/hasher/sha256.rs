//! SHA-256 content hasher.

use super::ContentHasher;
use crate::error::HashError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const CHUNK_SIZE: usize = 1024 * 1024;

/// Streams the file through SHA-256 in 1 MiB chunks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Sha256Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl ContentHasher for Sha256Hasher {
    fn compute_hash(&self, path: &Path) -> Result<String, HashError> {
        let io_error = |source| HashError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(io_error)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; CHUNK_SIZE];

        loop {
            let read = file.read(&mut buffer).map_err(io_error)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        let digest = format!("{:x}", hasher.finalize());
        tracing::debug!(path = %path.display(), hash = %digest, "Computed content hash");
        Ok(digest)
    }

    fn algorithm(&self) -> &'static str {
        "sha256"
    }
}
