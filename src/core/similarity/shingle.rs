//! Byte-shingle Jaccard similarity.

use super::SimilarityScorer;
use crate::error::ScoreError;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use xxhash_rust::xxh3::xxh3_64;

/// Jaccard similarity over hashed fixed-width byte windows.
///
/// Cheap and format-agnostic: identical files score 1.0, re-saved or
/// lightly edited files score high, unrelated files score near 0.
#[derive(Debug, Clone)]
pub struct ShingleScorer {
    width: usize,
    max_bytes: u64,
}

impl ShingleScorer {
    /// 8-byte shingles over the first 4 MiB of each file
    pub fn new() -> Self {
        Self {
            width: 8,
            max_bytes: 4 * 1024 * 1024,
        }
    }

    /// Shingle width in bytes (minimum 1)
    pub fn width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    /// How much of each file is considered
    pub fn max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn shingles(&self, path: &Path) -> Result<HashSet<u64>, ScoreError> {
        let io_error = |source| ScoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut bytes = Vec::new();
        File::open(path)
            .map_err(io_error)?
            .take(self.max_bytes)
            .read_to_end(&mut bytes)
            .map_err(io_error)?;

        if bytes.len() < self.width {
            return Ok(std::iter::once(xxh3_64(&bytes)).collect());
        }
        Ok(bytes.windows(self.width).map(xxh3_64).collect())
    }
}

impl Default for ShingleScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityScorer for ShingleScorer {
    fn score(&self, source: &Path, candidate: &Path) -> Result<f64, ScoreError> {
        let a = self.shingles(source)?;
        let b = self.shingles(candidate)?;

        let union = a.union(&b).count();
        if union == 0 {
            return Ok(0.0);
        }
        let intersection = a.intersection(&b).count();
        Ok(intersection as f64 / union as f64)
    }
}
