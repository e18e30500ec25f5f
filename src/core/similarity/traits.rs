//! Trait definition for pairwise content similarity.

use crate::error::ScoreError;
use std::path::Path;

/// Scores how alike two files are.
///
/// Implementations must be symmetric, return values in `0.0..=1.0`, and
/// tolerate concurrent calls from staging workers.
pub trait SimilarityScorer: Send + Sync {
    fn score(&self, source: &Path, candidate: &Path) -> Result<f64, ScoreError>;
}
