//! # Hasher Module
//!
//! Content digests used for exact-duplicate detection and for
//! content-addressed storage names (`<hash><ext>`).

mod sha256;
mod traits;

pub use sha256::Sha256Hasher;
pub use traits::ContentHasher;
