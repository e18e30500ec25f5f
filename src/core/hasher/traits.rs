//! Trait definition for content digests.

use crate::error::HashError;
use std::path::Path;

/// Computes a stable digest of a file's bytes.
///
/// Implementations must tolerate concurrent calls from staging workers.
pub trait ContentHasher: Send + Sync {
    /// Digest of the file at `path`, as a lowercase hex string
    fn compute_hash(&self, path: &Path) -> Result<String, HashError>;

    /// Short algorithm name, e.g. "sha256"
    fn algorithm(&self) -> &'static str;
}
